//! A minimal 128-bit decimal value.
//!
//! The wire format reserves a 16-byte, base-10 primitive alongside the
//! binary floats. This type carries exactly what the codec needs of it: the
//! byte layout, and the checked conversions the widening reads perform. It
//! is not a general arithmetic type.

use std::fmt::{self, Formatter, Display};


const MAX_SCALE: u8 = 28;
const MAX_MAGNITUDE: u128 = (1 << 96) - 1;

/// A base-10 number: a 96-bit integer magnitude scaled down by a power of
/// ten in `0..=28`, with a sign.
///
/// Wire layout (16 bytes, little-endian): bytes 0..12 are the magnitude,
/// byte 12 is the scale, bit 0 of byte 13 is the sign, bytes 14 and 15 are
/// zero.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Decimal {
    magnitude: u128,
    scale: u8,
    negative: bool,
}

impl Decimal {
    /// Construct from an integer magnitude, a power-of-ten scale, and a
    /// sign. Returns `None` if the magnitude exceeds 96 bits or the scale
    /// exceeds 28.
    pub fn new(magnitude: u128, scale: u8, negative: bool) -> Option<Self> {
        if magnitude > MAX_MAGNITUDE || scale > MAX_SCALE {
            return None;
        }
        Some(Decimal { magnitude, scale, negative }.normalize())
    }

    /// Strip trailing zero digits so that equal values compare equal.
    fn normalize(mut self) -> Self {
        while self.scale > 0 && self.magnitude % 10 == 0 {
            self.magnitude /= 10;
            self.scale -= 1;
        }
        if self.magnitude == 0 {
            self.negative = false;
        }
        self
    }

    pub fn from_i64(n: i64) -> Self {
        Decimal {
            magnitude: n.unsigned_abs() as u128,
            scale: 0,
            negative: n < 0,
        }
    }

    pub fn from_u64(n: u64) -> Self {
        Decimal {
            magnitude: n as u128,
            scale: 0,
            negative: false,
        }
    }

    /// Convert from a binary float, scaling up to at most 28 fractional
    /// digits. Returns `None` if the value is not finite or its integer
    /// part exceeds 96 bits.
    pub fn try_from_f64(x: f64) -> Option<Self> {
        if !x.is_finite() {
            return None;
        }
        let negative = x.is_sign_negative();
        let mut v = x.abs();
        if v >= MAX_MAGNITUDE as f64 {
            return None;
        }
        let mut scale = 0;
        while scale < MAX_SCALE
            && v.fract() != 0.0
            && v < (MAX_MAGNITUDE / 10) as f64
        {
            v *= 10.0;
            scale += 1;
        }
        let magnitude = v.round() as u128;
        if magnitude > MAX_MAGNITUDE {
            return None;
        }
        Some(Decimal { magnitude, scale, negative }.normalize())
    }

    /// Approximate conversion to a binary float.
    pub fn to_f64(self) -> f64 {
        let x = self.magnitude as f64 / 10f64.powi(self.scale as i32);
        if self.negative { -x } else { x }
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        let mut bytes = [0; 16];
        bytes[..12].copy_from_slice(&self.magnitude.to_le_bytes()[..12]);
        bytes[12] = self.scale;
        bytes[13] = self.negative as u8;
        bytes
    }

    /// Decode the wire layout. Returns `None` if the scale or flag bytes
    /// are out of range, which a reader treats as a malformed payload.
    pub fn from_le_bytes(bytes: [u8; 16]) -> Option<Self> {
        if bytes[12] > MAX_SCALE || bytes[13] > 1 || bytes[14] != 0 || bytes[15] != 0 {
            return None;
        }
        let mut mag = [0; 16];
        mag[..12].copy_from_slice(&bytes[..12]);
        Some(Decimal {
            magnitude: u128::from_le_bytes(mag),
            scale: bytes[12],
            negative: bytes[13] == 1,
        }.normalize())
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Decimal::from_i64(n)
    }
}

impl From<u64> for Decimal {
    fn from(n: u64) -> Self {
        Decimal::from_u64(n)
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.scale == 0 {
            return write!(f, "{}", self.magnitude);
        }
        let digits = format!(
            "{:0>width$}",
            self.magnitude,
            width = self.scale as usize + 1,
        );
        let split = digits.len() - self.scale as usize;
        write!(f, "{}.{}", &digits[..split], &digits[split..])
    }
}


#[test]
fn test_decimal_bytes_round_trip() {
    for d in [
        Decimal::from_i64(0),
        Decimal::from_i64(-7),
        Decimal::from_u64(u64::MAX),
        Decimal::new(314159, 5, false).unwrap(),
        Decimal::new(1, 28, true).unwrap(),
        Decimal::new(MAX_MAGNITUDE, 0, false).unwrap(),
    ] {
        assert_eq!(Decimal::from_le_bytes(d.to_le_bytes()), Some(d));
    }
}

#[test]
fn test_decimal_f64_conversions() {
    assert_eq!(Decimal::try_from_f64(2.5), Decimal::new(25, 1, false));
    assert_eq!(Decimal::try_from_f64(-0.125), Decimal::new(125, 3, true));
    assert_eq!(Decimal::try_from_f64(3.0), Some(Decimal::from_i64(3)));
    assert!(Decimal::try_from_f64(f64::NAN).is_none());
    assert!(Decimal::try_from_f64(f64::INFINITY).is_none());
    assert!(Decimal::try_from_f64(1e40).is_none());
    assert_eq!(Decimal::new(25, 1, false).unwrap().to_f64(), 2.5);
}

#[test]
fn test_decimal_normalized_eq() {
    assert_eq!(Decimal::new(2500, 3, false), Decimal::new(25, 1, false));
    assert_eq!(Decimal::new(0, 5, true), Some(Decimal::from_i64(0)));
}

#[test]
fn test_decimal_display() {
    assert_eq!(Decimal::new(25, 1, true).unwrap().to_string(), "-2.5");
    assert_eq!(Decimal::new(7, 0, false).unwrap().to_string(), "7");
    assert_eq!(Decimal::new(5, 3, false).unwrap().to_string(), "0.005");
}

#[test]
fn test_decimal_rejects_bad_wire_bytes() {
    let mut bytes = Decimal::from_i64(1).to_le_bytes();
    bytes[12] = 29;
    assert!(Decimal::from_le_bytes(bytes).is_none());
    let mut bytes = Decimal::from_i64(1).to_le_bytes();
    bytes[15] = 1;
    assert!(Decimal::from_le_bytes(bytes).is_none());
}
