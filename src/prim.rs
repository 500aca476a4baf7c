//! Fixed-width little-endian encoding of the wire primitives.
//!
//! Every fixed-width value is little-endian on the wire regardless of host
//! endianness; big-endian hosts byte-swap on both paths. All of it goes
//! through `to_le_bytes`/`from_le_bytes` over byte slices, so there is no
//! unsafe reinterpretation anywhere in the codec.

use crate::decimal::Decimal;
use uuid::Uuid;


/// A fixed-width wire primitive, usable as the element type of a
/// primitive-array entry.
///
/// `get` is only called with exactly [`WIRE_SIZE`](Self::WIRE_SIZE) bytes.
pub trait Primitive: Copy {
    const WIRE_SIZE: usize;

    /// Append this value's little-endian wire bytes.
    fn put(self, buf: &mut Vec<u8>);

    /// Decode from little-endian wire bytes.
    fn get(bytes: &[u8]) -> Self;

    /// Append a whole slice's wire bytes. Byte arrays override this to a
    /// straight copy with no per-element framing.
    fn put_slice(values: &[Self], buf: &mut Vec<u8>) {
        for &v in values {
            v.put(buf);
        }
    }

    /// Decode a whole blob of `len / WIRE_SIZE` elements.
    fn get_slice(bytes: &[u8]) -> Vec<Self> {
        bytes.chunks_exact(Self::WIRE_SIZE).map(Self::get).collect()
    }
}

macro_rules! le_bytes_primitive {
    ($($t:ident($size:expr),)*)=>{$(
        impl Primitive for $t {
            const WIRE_SIZE: usize = $size;

            fn put(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            fn get(bytes: &[u8]) -> Self {
                $t::from_le_bytes(bytes.try_into().unwrap())
            }
        }
    )*};
}

le_bytes_primitive!(
    i8(1),
    i16(2),
    u16(2),
    i32(4),
    u32(4),
    i64(8),
    u64(8),
    f32(4),
    f64(8),
);

/// Byte arrays are the blob itself: no transformation in either direction.
impl Primitive for u8 {
    const WIRE_SIZE: usize = 1;

    fn put(self, buf: &mut Vec<u8>) {
        buf.push(self);
    }

    fn get(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn put_slice(values: &[Self], buf: &mut Vec<u8>) {
        buf.extend_from_slice(values);
    }

    fn get_slice(bytes: &[u8]) -> Vec<Self> {
        bytes.to_vec()
    }
}

impl Primitive for bool {
    const WIRE_SIZE: usize = 1;

    fn put(self, buf: &mut Vec<u8>) {
        buf.push(self as u8);
    }

    fn get(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Chars are stored as one UTF-16 code unit. Code points beyond the basic
/// multilingual plane don't fit and are replaced with U+FFFD on encode;
/// code units that decode to a surrogate half likewise decode to U+FFFD.
impl Primitive for char {
    const WIRE_SIZE: usize = 2;

    fn put(self, buf: &mut Vec<u8>) {
        let unit = u16::try_from(self as u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER as u16);
        buf.extend_from_slice(&unit.to_le_bytes());
    }

    fn get(bytes: &[u8]) -> Self {
        char::from_u32(u16::get(bytes) as u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl Primitive for Decimal {
    const WIRE_SIZE: usize = 16;

    fn put(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn get(bytes: &[u8]) -> Self {
        // malformed scale bytes degrade to zero; the scalar read path
        // reports them as malformed data instead
        Decimal::from_le_bytes(bytes.try_into().unwrap()).unwrap_or_default()
    }
}

/// Guids are stored as the canonical 16 RFC bytes, identically on both
/// ends of the wire.
impl Primitive for Uuid {
    const WIRE_SIZE: usize = 16;

    fn put(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    fn get(bytes: &[u8]) -> Self {
        Uuid::from_bytes(bytes.try_into().unwrap())
    }
}


#[test]
fn test_primitive_wire_sizes() {
    assert_eq!(<i8 as Primitive>::WIRE_SIZE, 1);
    assert_eq!(<bool as Primitive>::WIRE_SIZE, 1);
    assert_eq!(<char as Primitive>::WIRE_SIZE, 2);
    assert_eq!(<u32 as Primitive>::WIRE_SIZE, 4);
    assert_eq!(<f64 as Primitive>::WIRE_SIZE, 8);
    assert_eq!(<Decimal as Primitive>::WIRE_SIZE, 16);
    assert_eq!(<Uuid as Primitive>::WIRE_SIZE, 16);
}

#[test]
fn test_wire_bytes_are_little_endian() {
    let mut buf = Vec::new();
    0x01020304u32.put(&mut buf);
    assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    assert_eq!(u32::get(&buf), 0x01020304);

    buf.clear();
    (-2i16).put(&mut buf);
    assert_eq!(buf, [0xFE, 0xFF]);
    assert_eq!(i16::get(&buf), -2);
}

#[test]
fn test_char_bmp_round_trip() {
    let mut buf = Vec::new();
    'é'.put(&mut buf);
    assert_eq!(buf.len(), 2);
    assert_eq!(char::get(&buf), 'é');

    // astral chars don't fit one UTF-16 unit
    buf.clear();
    '🦀'.put(&mut buf);
    assert_eq!(char::get(&buf), char::REPLACEMENT_CHARACTER);
}
