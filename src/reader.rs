//! Peeks and consumes entries from a fully buffered stream, with true
//! random skip over any unread entry, including corrupted ones.

use crate::{
    decimal::Decimal,
    entry::{
        EntryType,
        BinaryEntryType,
    },
    error::{
        Result,
        error,
        bail,
        ensure,
    },
    frame::{
        Frame,
        STRUCT_NODE_ID,
    },
    policy::ErrorPolicy,
    prim::Primitive,
    types::{
        TypeRef,
        TypeBinder,
        DefaultTypeBinder,
    },
};
use std::{
    borrow::Cow,
    collections::HashMap,
    io::Read,
    sync::Arc,
};
use uuid::Uuid;


/// The cached result of a peek: the wire tag, its semantic entry type, and
/// the entry's name if the tag was a named variant. The name bytes are
/// consumed eagerly at peek time; the payload stays unconsumed until the
/// entry is read or skipped.
#[derive(Debug)]
struct Peeked {
    tag: BinaryEntryType,
    entry: EntryType,
    name: Option<String>,
}

/// Reads a flat stream of typed entries out of one fully materialized
/// buffer.
///
/// This codec is one-shot: [`from_reader`](Self::from_reader) bulk-loads
/// the whole source up front, [`from_slice`](Self::from_slice) borrows an
/// in-memory buffer directly with no copy. Running out of buffered bytes
/// mid-stream reads as [`EntryType::EndOfStream`]; nothing is ever
/// re-filled.
///
/// Every read operation returns `Result`; an `Err` whose
/// [`kind`](crate::Error::kind) is not fatal means "that value was lost,
/// the stream is already positioned at the next entry, keep going". Fatal
/// errors must propagate to the top of the deserialization.
pub struct BinaryReader<'de> {
    data: Cow<'de, [u8]>,
    index: usize,
    peeked: Option<Peeked>,
    type_table: HashMap<i32, Option<TypeRef>>,
    stack: Vec<Frame>,
    binder: Arc<dyn TypeBinder>,
    policy: ErrorPolicy,
}

impl<'de> BinaryReader<'de> {
    /// Borrow an in-memory buffer directly, avoiding a copy.
    pub fn from_slice(data: &'de [u8]) -> Self {
        Self::with_data(Cow::Borrowed(data))
    }

    fn with_data(data: Cow<'de, [u8]>) -> Self {
        BinaryReader {
            data,
            index: 0,
            peeked: None,
            type_table: HashMap::new(),
            stack: Vec::new(),
            binder: Arc::new(DefaultTypeBinder),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_binder(mut self, binder: Arc<dyn TypeBinder>) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name of the entry currently under the cursor, if it was peeked and
    /// had one.
    pub fn current_entry_name(&self) -> Option<&str> {
        self.peeked.as_ref().and_then(|p| p.name.as_deref())
    }

    /// Name of the innermost open node.
    pub fn current_node_name(&self) -> Option<&str> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Node { name, .. } => name.as_deref(),
            Frame::Array { .. } => None,
        })
    }

    /// Reference id of the innermost open node;
    /// [`STRUCT_NODE_ID`] for struct nodes, `None` outside any node.
    pub fn current_node_id(&self) -> Option<i32> {
        self.stack.iter().rev().find_map(|frame| match frame {
            &Frame::Node { id, .. } => Some(id),
            Frame::Array { .. } => None,
        })
    }

    /// Declared type of the innermost open node, if it carried one.
    pub fn current_node_type(&self) -> Option<&TypeRef> {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Node { ty, .. } => Some(ty.as_ref()),
                Frame::Array { .. } => None,
            })
            .flatten()
    }

    /// Number of open node and array frames.
    pub fn current_node_depth(&self) -> usize {
        self.stack.len()
    }

    /// Reset the type table, frame stack, and peek cache so this instance
    /// can deserialize an unrelated top-level value. The cursor stays
    /// where it is.
    pub fn prepare_new_session(&mut self) {
        self.type_table.clear();
        self.stack.clear();
        self.peeked = None;
    }
}

impl BinaryReader<'static> {
    /// Bulk-load the whole source into an owned buffer. One shot: the
    /// source is never read again after construction.
    pub fn from_reader<R: Read>(mut source: R) -> Result<Self> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Ok(Self::with_data(Cow::Owned(data)))
    }
}

// raw buffer access
impl<'de> BinaryReader<'de> {
    fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Advance past `n` bytes and return them. On exhaustion the cursor is
    /// forced to the end of the buffer, so no partial value is ever
    /// exposed and further peeks see end of stream.
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        if self.remaining() >= n {
            let bytes = &self.data[self.index..self.index + n];
            self.index += n;
            Some(bytes)
        } else {
            self.index = self.data.len();
            None
        }
    }

    fn take_prim<T: Primitive>(&mut self) -> Result<T> {
        let bytes = self
            .take(T::WIRE_SIZE)
            .ok_or_else(|| error!(
                MalformedData,
                "buffered data exhausted in the middle of a value",
            ))?;
        Ok(T::get(bytes))
    }

    /// Inverse of the writer's string layout: char-size flag, signed char
    /// count, payload. Both flags are always supported. Unpaired UTF-16
    /// surrogates decode as U+FFFD.
    fn take_string_payload(&mut self) -> Result<String> {
        let flag: u8 = self.take_prim()?;
        let count: i32 = self.take_prim()?;
        ensure!(count >= 0, MalformedData, "negative string length {}", count);
        let count = count as usize;
        match flag {
            0 => {
                let bytes = self
                    .take(count)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "buffered data exhausted inside a string payload",
                    ))?;
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            1 => {
                let byte_len = count
                    .checked_mul(2)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "string length {} overflows",
                        count,
                    ))?;
                let bytes = self
                    .take(byte_len)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "buffered data exhausted inside a string payload",
                    ))?;
                let units = bytes
                    .chunks_exact(2)
                    .map(u16::get)
                    .collect::<Vec<_>>();
                Ok(String::from_utf16_lossy(&units))
            }
            _ => bail!(MalformedData, "invalid string char-size flag {}", flag),
        }
    }
}

// the peek/consume state machine
impl<'de> BinaryReader<'de> {
    /// Peek the entry under the cursor without consuming its payload.
    ///
    /// Idempotent: repeated calls without an intervening consume return
    /// the cached result, and peeking past the last entry yields
    /// [`EntryType::EndOfStream`] forever without advancing.
    ///
    /// An unrecognized tag byte is reported through the error policy and
    /// surfaces as [`EntryType::Invalid`]; a type entry tag at a peekable
    /// position is unrecoverable stream corruption.
    pub fn peek_entry(&mut self) -> Result<EntryType> {
        if let Some(ref peeked) = self.peeked {
            return Ok(peeked.entry);
        }
        if self.remaining() == 0 {
            self.peeked = Some(Peeked {
                tag: BinaryEntryType::EndOfStream,
                entry: EntryType::EndOfStream,
                name: None,
            });
            return Ok(EntryType::EndOfStream);
        }
        let byte = self.data[self.index];
        self.index += 1;
        let (tag, entry) = match BinaryEntryType::from_byte(byte) {
            // the explicit invalid tag is as much a protocol violation as
            // a byte outside the tag set
            None | Some(BinaryEntryType::Invalid) => {
                self.policy.error(format_args!(
                    "invalid entry byte 0x{:02X} at offset {}",
                    byte,
                    self.index - 1,
                ))?;
                (BinaryEntryType::Invalid, EntryType::Invalid)
            }
            Some(tag) => match tag.entry_type() {
                Some(entry) => (tag, entry),
                // type entries are consumed while resolving a node's type
                // and must never surface here
                None => bail!(
                    StreamCorruption,
                    "type entry tag {:?} at a peekable position",
                    tag,
                ),
            },
        };
        let name =
            if tag.is_named() {
                match self.take_string_payload() {
                    Ok(name) => Some(name),
                    Err(e) => bail!(
                        StreamCorruption,
                        "unreadable entry name: {}",
                        e,
                    ),
                }
            } else {
                None
            };
        self.peeked = Some(Peeked { tag, entry, name });
        Ok(entry)
    }

    /// Wire tag of the cached peek. Only valid right after a successful
    /// `peek_entry`.
    fn peeked_tag(&self) -> BinaryEntryType {
        self.peeked.as_ref().expect("no peeked entry").tag
    }

    /// Clear the peek cache, so the next peek pulls a fresh tag.
    fn mark_entry_consumed(&mut self) {
        self.peeked = None;
    }

    /// Discard the current entry without exposing its payload, including
    /// an entire unopened node or array. End tags and end of stream are
    /// left unconsumed; the exit loops own those.
    pub fn skip_entry(&mut self) -> Result<()> {
        match self.peek_entry()? {
            EntryType::StartOfNode => {
                if let Err(e) = self.enter_node() {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    return Ok(());
                }
                self.exit_lost(false)
            }
            EntryType::StartOfArray => {
                if let Err(e) = self.enter_array() {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    // a corrupt header is already consumed; fall through
                    // to the exit loop for forward recovery
                }
                self.exit_lost(true)
            }
            EntryType::EndOfNode
            | EntryType::EndOfArray
            | EntryType::EndOfStream => Ok(()),
            _ => {
                // consume even when the payload is unskippable, so resync
                // loops can't re-peek the same cached entry forever
                let res = self.skip_peeked_payload();
                self.mark_entry_consumed();
                res
            }
        }
    }

    /// Exit a node or array whose contents are being discarded, swallowing
    /// the recoverable "ran out of stream" failure.
    fn exit_lost(&mut self, array: bool) -> Result<()> {
        let res = if array { self.exit_array() } else { self.exit_node() };
        match res {
            Err(e) if e.is_fatal() => Err(e),
            _ => Ok(()),
        }
    }

    /// Advance past the payload of the peeked entry. Only called for
    /// entries whose payload is flat (not node/array starts or end tags).
    fn skip_peeked_payload(&mut self) -> Result<()> {
        use BinaryEntryType::*;
        let fixed = match self.peeked_tag() {
            NamedSByte | UnnamedSByte
            | NamedByte | UnnamedByte
            | NamedBoolean | UnnamedBoolean => 1,
            NamedShort | UnnamedShort
            | NamedUShort | UnnamedUShort
            | NamedChar | UnnamedChar => 2,
            NamedInt | UnnamedInt
            | NamedUInt | UnnamedUInt
            | NamedFloat | UnnamedFloat
            | NamedInternalReference | UnnamedInternalReference
            | NamedExternalReferenceByIndex
            | UnnamedExternalReferenceByIndex => 4,
            NamedLong | UnnamedLong
            | NamedULong | UnnamedULong
            | NamedDouble | UnnamedDouble => 8,
            NamedDecimal | UnnamedDecimal
            | NamedGuid | UnnamedGuid
            | NamedExternalReferenceByGuid
            | UnnamedExternalReferenceByGuid => 16,
            NamedString | UnnamedString
            | NamedExternalReferenceByString
            | UnnamedExternalReferenceByString => {
                self.take_string_payload()?;
                return Ok(());
            }
            PrimitiveArray => {
                let count: i32 = self.take_prim()?;
                let per_element: i32 = self.take_prim()?;
                ensure!(
                    count >= 0 && per_element >= 0,
                    MalformedData,
                    "corrupt primitive array header ({} x {})",
                    count,
                    per_element,
                );
                let byte_len = (count as usize)
                    .checked_mul(per_element as usize)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "primitive array size overflows",
                    ))?;
                self.take(byte_len)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "buffered data exhausted inside a primitive array",
                    ))?;
                return Ok(());
            }
            // null and invalid entries have no payload
            _ => 0,
        };
        if fixed > 0 {
            self.take(fixed)
                .ok_or_else(|| error!(
                    MalformedData,
                    "buffered data exhausted while skipping an entry",
                ))?;
        }
        Ok(())
    }

    /// Skip the current entry because a read operation can't consume it,
    /// swallowing everything recoverable.
    fn skip_lost(&mut self) -> Result<()> {
        match self.skip_entry() {
            Err(e) if e.is_fatal() => Err(e),
            _ => Ok(()),
        }
    }
}

// nodes and arrays
impl<'de> BinaryReader<'de> {
    /// Consume exactly one `TypeName` | `TypeID` | no-type entry.
    ///
    /// A `TypeName` binds through the binder and caches the result for the
    /// session even when binding failed, so repeated ids don't retry a
    /// failing binder. An unknown `TypeID` is reported and resolves to no
    /// type rather than failing the read.
    fn read_type_entry(&mut self) -> Result<Option<TypeRef>> {
        use BinaryEntryType::*;
        ensure!(
            self.remaining() > 0,
            MalformedData,
            "buffered data exhausted where a type entry was expected",
        );
        let byte = self.data[self.index];
        self.index += 1;
        match BinaryEntryType::from_byte(byte) {
            Some(TypeName) => {
                let id: i32 = self.take_prim()?;
                let name = self.take_string_payload()?;
                let ty = self.binder.bind_to_type(&name);
                if ty.is_none() {
                    self.policy.warning(format_args!(
                        "failed to bind type name {:?}",
                        name,
                    ))?;
                }
                self.type_table.insert(id, ty.clone());
                Ok(ty)
            }
            Some(TypeId) => {
                let id: i32 = self.take_prim()?;
                match self.type_table.get(&id) {
                    Some(ty) => Ok(ty.clone()),
                    None => {
                        self.policy.error(format_args!(
                            "unknown type id {}",
                            id,
                        ))?;
                        Ok(None)
                    }
                }
            }
            Some(UnnamedNull) => Ok(None),
            other => {
                // leave the byte for the resync machinery
                self.index -= 1;
                self.policy.error(format_args!(
                    "expected a type entry, got {:?}",
                    other,
                ))?;
                Ok(None)
            }
        }
    }

    /// Open the node under the cursor and return its declared type, if
    /// any. Anything else under the cursor is skipped and reported as
    /// [`ErrorKind::UnexpectedEntry`](crate::ErrorKind::UnexpectedEntry).
    pub fn enter_node(&mut self) -> Result<Option<TypeRef>> {
        match self.peek_entry()? {
            EntryType::StartOfNode => {
                use BinaryEntryType::*;
                let tag = self.peeked_tag();
                let name = self.peeked.as_mut().and_then(|p| p.name.take());
                self.mark_entry_consumed();
                let ty = self.read_type_entry()?;
                let id =
                    if matches!(
                        tag,
                        NamedStartOfReferenceNode | UnnamedStartOfReferenceNode,
                    ) {
                        self.take_prim::<i32>()?
                    } else {
                        STRUCT_NODE_ID
                    };
                self.stack.push(Frame::Node { name, id, ty: ty.clone() });
                Ok(ty)
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected start of node, got {:?}", other)
            }
        }
    }

    /// Consume forward to just past the matching end-of-node tag,
    /// skipping any child entries left unread, and pop the node frame.
    ///
    /// Having to cross an array boundary on the way is a data layout
    /// mismatch (a value codec read too few or too many children); it is
    /// reported and corrected, which is what keeps one reshaped value
    /// from corrupting the rest of the stream.
    pub fn exit_node(&mut self) -> Result<()> {
        loop {
            match self.peek_entry()? {
                EntryType::EndOfNode => {
                    self.mark_entry_consumed();
                    self.pop_frame(false, "exit_node")?;
                    return Ok(());
                }
                EntryType::EndOfArray => {
                    self.policy.warning(format_args!(
                        "data layout mismatch: skipping past an array \
                         boundary while exiting a node",
                    ))?;
                    self.mark_entry_consumed();
                }
                EntryType::EndOfStream => {
                    self.policy.error(format_args!(
                        "end of stream reached before end of node",
                    ))?;
                    self.pop_frame(false, "exit_node")?;
                    bail!(MalformedData, "end of stream reached before end of node");
                }
                _ => self.skip_lost()?,
            }
        }
    }

    /// Open the array under the cursor and return its length.
    ///
    /// A negative decoded length means the stream is corrupt: it is
    /// clamped to zero and reported, with the array frame still pushed so
    /// [`exit_array`](Self::exit_array) can recover forward.
    pub fn enter_array(&mut self) -> Result<i64> {
        match self.peek_entry()? {
            EntryType::StartOfArray => {
                self.mark_entry_consumed();
                let length: i64 = self.take_prim()?;
                if length < 0 {
                    self.stack.push(Frame::Array { length: 0 });
                    self.policy.error(format_args!(
                        "decoded negative array length {}",
                        length,
                    ))?;
                    bail!(MalformedData, "decoded negative array length {}", length);
                }
                self.stack.push(Frame::Array { length });
                Ok(length)
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected start of array, got {:?}", other)
            }
        }
    }

    /// Counterpart of [`exit_node`](Self::exit_node) for arrays.
    pub fn exit_array(&mut self) -> Result<()> {
        loop {
            match self.peek_entry()? {
                EntryType::EndOfArray => {
                    self.mark_entry_consumed();
                    self.pop_frame(true, "exit_array")?;
                    return Ok(());
                }
                EntryType::EndOfNode => {
                    self.policy.warning(format_args!(
                        "data layout mismatch: skipping past a node \
                         boundary while exiting an array",
                    ))?;
                    self.mark_entry_consumed();
                }
                EntryType::EndOfStream => {
                    self.policy.error(format_args!(
                        "end of stream reached before end of array",
                    ))?;
                    self.pop_frame(true, "exit_array")?;
                    bail!(MalformedData, "end of stream reached before end of array");
                }
                _ => self.skip_lost()?,
            }
        }
    }

    /// Pop the innermost frame of the wanted kind, discarding (and
    /// reporting) mismatched frames above it.
    fn pop_frame(&mut self, want_array: bool, op: &str) -> Result<()> {
        while let Some(frame) = self.stack.pop() {
            if frame.is_array() == want_array {
                return Ok(());
            }
            self.policy.warning(format_args!(
                "discarding unclosed {} during {}",
                frame.describe(),
                op,
            ))?;
        }
        self.policy.warning(format_args!("{} with no matching open frame", op))
    }
}

macro_rules! read_narrow_signed {
    ($($m:ident($t:ident),)*)=>{$(
        pub fn $m(&mut self) -> Result<$t> {
            let wide = self.read_i64()?;
            $t::try_from(wide)
                .map_err(|_| error!(
                    Overflow,
                    concat!("{} out of range for ", stringify!($t)),
                    wide,
                ))
        }
    )*};
}

macro_rules! read_narrow_unsigned {
    ($($m:ident($t:ident),)*)=>{$(
        pub fn $m(&mut self) -> Result<$t> {
            let wide = self.read_u64()?;
            $t::try_from(wide)
                .map_err(|_| error!(
                    Overflow,
                    concat!("{} out of range for ", stringify!($t)),
                    wide,
                ))
        }
    )*};
}

// primitive reads
impl<'de> BinaryReader<'de> {
    /// Read any integer entry as an `i64`, widening or narrowing with a
    /// range check: a stored `u64` beyond `i64::MAX` is an overflow
    /// failure with the entry consumed.
    ///
    /// Accepting every integer tag is what tolerates a field being widened
    /// (say `i32` to `i64`) between serialization and deserialization.
    pub fn read_i64(&mut self) -> Result<i64> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::Integer => {
                let tag = self.peeked_tag();
                self.mark_entry_consumed();
                match tag {
                    NamedSByte | UnnamedSByte => Ok(self.take_prim::<i8>()? as i64),
                    NamedByte | UnnamedByte => Ok(self.take_prim::<u8>()? as i64),
                    NamedShort | UnnamedShort => Ok(self.take_prim::<i16>()? as i64),
                    NamedUShort | UnnamedUShort => Ok(self.take_prim::<u16>()? as i64),
                    NamedInt | UnnamedInt => Ok(self.take_prim::<i32>()? as i64),
                    NamedUInt | UnnamedUInt => Ok(self.take_prim::<u32>()? as i64),
                    NamedLong | UnnamedLong => self.take_prim::<i64>(),
                    NamedULong | UnnamedULong => {
                        let wide = self.take_prim::<u64>()?;
                        i64::try_from(wide)
                            .map_err(|_| error!(
                                Overflow,
                                "{} out of range for i64",
                                wide,
                            ))
                    }
                    _ => unreachable!(),
                }
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected an integer entry, got {:?}", other)
            }
        }
    }

    /// Mirror of [`read_i64`](Self::read_i64): any integer entry, with a
    /// negative stored value failing symmetrically.
    pub fn read_u64(&mut self) -> Result<u64> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::Integer => {
                let tag = self.peeked_tag();
                self.mark_entry_consumed();
                let signed = match tag {
                    NamedSByte | UnnamedSByte => self.take_prim::<i8>()? as i64,
                    NamedByte | UnnamedByte => return Ok(self.take_prim::<u8>()? as u64),
                    NamedShort | UnnamedShort => self.take_prim::<i16>()? as i64,
                    NamedUShort | UnnamedUShort => return Ok(self.take_prim::<u16>()? as u64),
                    NamedInt | UnnamedInt => self.take_prim::<i32>()? as i64,
                    NamedUInt | UnnamedUInt => return Ok(self.take_prim::<u32>()? as u64),
                    NamedLong | UnnamedLong => self.take_prim::<i64>()?,
                    NamedULong | UnnamedULong => return self.take_prim::<u64>(),
                    _ => unreachable!(),
                };
                u64::try_from(signed)
                    .map_err(|_| error!(
                        Overflow,
                        "{} out of range for u64",
                        signed,
                    ))
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected an integer entry, got {:?}", other)
            }
        }
    }

    read_narrow_signed!(
        read_i8(i8),
        read_i16(i16),
        read_i32(i32),
    );

    read_narrow_unsigned!(
        read_u8(u8),
        read_u16(u16),
        read_u32(u32),
    );

    /// Read a floating-point entry of any width, or an integer entry, as
    /// an `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::FloatingPoint => {
                let tag = self.peeked_tag();
                self.mark_entry_consumed();
                match tag {
                    NamedFloat | UnnamedFloat => Ok(self.take_prim::<f32>()? as f64),
                    NamedDouble | UnnamedDouble => self.take_prim::<f64>(),
                    NamedDecimal | UnnamedDecimal => {
                        Ok(self.take_decimal_payload()?.to_f64())
                    }
                    _ => unreachable!(),
                }
            }
            EntryType::Integer => Ok(self.read_i64()? as f64),
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected a floating point or integer entry, got {:?}",
                    other,
                )
            }
        }
    }

    /// [`read_f64`](Self::read_f64) with a checked narrowing to `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        let wide = self.read_f64()?;
        ensure!(
            !wide.is_finite()
                || (wide >= f32::MIN as f64 && wide <= f32::MAX as f64),
            Overflow,
            "{} out of range for f32",
            wide,
        );
        Ok(wide as f32)
    }

    pub fn read_decimal(&mut self) -> Result<Decimal> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::FloatingPoint => {
                let tag = self.peeked_tag();
                self.mark_entry_consumed();
                match tag {
                    NamedDecimal | UnnamedDecimal => self.take_decimal_payload(),
                    NamedFloat | UnnamedFloat => {
                        let v = self.take_prim::<f32>()? as f64;
                        Decimal::try_from_f64(v)
                            .ok_or_else(|| error!(
                                Overflow,
                                "{} out of range for decimal",
                                v,
                            ))
                    }
                    NamedDouble | UnnamedDouble => {
                        let v = self.take_prim::<f64>()?;
                        Decimal::try_from_f64(v)
                            .ok_or_else(|| error!(
                                Overflow,
                                "{} out of range for decimal",
                                v,
                            ))
                    }
                    _ => unreachable!(),
                }
            }
            EntryType::Integer => Ok(Decimal::from_i64(self.read_i64()?)),
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected a floating point or integer entry, got {:?}",
                    other,
                )
            }
        }
    }

    fn take_decimal_payload(&mut self) -> Result<Decimal> {
        let bytes: [u8; 16] = self
            .take(16)
            .ok_or_else(|| error!(
                MalformedData,
                "buffered data exhausted in the middle of a value",
            ))?
            .try_into()
            .unwrap();
        Decimal::from_le_bytes(bytes)
            .ok_or_else(|| error!(MalformedData, "corrupt decimal payload"))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.peek_entry()? {
            EntryType::Boolean => {
                self.mark_entry_consumed();
                match self.take_prim::<u8>()? {
                    0 => Ok(false),
                    1 => Ok(true),
                    n => bail!(MalformedData, "{} is not a valid bool", n),
                }
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected a boolean entry, got {:?}", other)
            }
        }
    }

    /// Read a char entry, or the *first* char of a string entry. In the
    /// string case the cursor still advances past the whole string; the
    /// remaining chars are dropped, not resynced.
    pub fn read_char(&mut self) -> Result<char> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::String => {
                let tag = self.peeked_tag();
                self.mark_entry_consumed();
                match tag {
                    NamedChar | UnnamedChar => self.take_prim::<char>(),
                    NamedString | UnnamedString => {
                        let s = self.take_string_payload()?;
                        s.chars().next().ok_or_else(|| error!(
                            MalformedData,
                            "empty string entry where a char was expected",
                        ))
                    }
                    _ => unreachable!(),
                }
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected a char entry, got {:?}", other)
            }
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        use BinaryEntryType::*;
        match self.peek_entry()? {
            EntryType::String => {
                let tag = self.peeked_tag();
                match tag {
                    NamedString | UnnamedString => {
                        self.mark_entry_consumed();
                        self.take_string_payload()
                    }
                    // a char peeks as String, but is not a string
                    _ => {
                        self.skip_lost()?;
                        bail!(
                            UnexpectedEntry,
                            "expected a string entry, got a char entry",
                        )
                    }
                }
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected a string entry, got {:?}", other)
            }
        }
    }

    pub fn read_guid(&mut self) -> Result<Uuid> {
        match self.peek_entry()? {
            EntryType::Guid => {
                self.mark_entry_consumed();
                self.take_prim::<Uuid>()
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected a guid entry, got {:?}", other)
            }
        }
    }

    pub fn read_null(&mut self) -> Result<()> {
        match self.peek_entry()? {
            EntryType::Null => {
                self.mark_entry_consumed();
                Ok(())
            }
            other => {
                self.skip_lost()?;
                bail!(UnexpectedEntry, "expected a null entry, got {:?}", other)
            }
        }
    }

    pub fn read_internal_reference(&mut self) -> Result<i32> {
        match self.peek_entry()? {
            EntryType::InternalReference => {
                self.mark_entry_consumed();
                self.take_prim::<i32>()
            }
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected an internal reference entry, got {:?}",
                    other,
                )
            }
        }
    }

    pub fn read_external_reference_by_index(&mut self) -> Result<i32> {
        match self.peek_entry()? {
            EntryType::ExternalReferenceByIndex => {
                self.mark_entry_consumed();
                self.take_prim::<i32>()
            }
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected an external reference by index, got {:?}",
                    other,
                )
            }
        }
    }

    pub fn read_external_reference_by_guid(&mut self) -> Result<Uuid> {
        match self.peek_entry()? {
            EntryType::ExternalReferenceByGuid => {
                self.mark_entry_consumed();
                self.take_prim::<Uuid>()
            }
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected an external reference by guid, got {:?}",
                    other,
                )
            }
        }
    }

    pub fn read_external_reference_by_string(&mut self) -> Result<String> {
        match self.peek_entry()? {
            EntryType::ExternalReferenceByString => {
                self.mark_entry_consumed();
                self.take_string_payload()
            }
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected an external reference by string, got {:?}",
                    other,
                )
            }
        }
    }

    /// Inverse of the writer's fast path. The declared bytes-per-element
    /// must match `T`'s wire size; a mismatch skips the blob and fails the
    /// read.
    pub fn read_primitive_array<T: Primitive>(&mut self) -> Result<Vec<T>> {
        match self.peek_entry()? {
            EntryType::PrimitiveArray => {
                self.mark_entry_consumed();
                let count: i32 = self.take_prim()?;
                let per_element: i32 = self.take_prim()?;
                ensure!(
                    count >= 0 && per_element >= 0,
                    MalformedData,
                    "corrupt primitive array header ({} x {})",
                    count,
                    per_element,
                );
                let byte_len = (count as usize)
                    .checked_mul(per_element as usize)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "primitive array size overflows",
                    ))?;
                if per_element as usize != T::WIRE_SIZE {
                    self.policy.error(format_args!(
                        "primitive array of {}-byte elements where {}-byte \
                         elements were expected",
                        per_element,
                        T::WIRE_SIZE,
                    ))?;
                    self.take(byte_len);
                    bail!(
                        UnexpectedEntry,
                        "primitive array element size mismatch",
                    );
                }
                let bytes = self
                    .take(byte_len)
                    .ok_or_else(|| error!(
                        MalformedData,
                        "buffered data exhausted inside a primitive array",
                    ))?;
                Ok(T::get_slice(bytes))
            }
            other => {
                self.skip_lost()?;
                bail!(
                    UnexpectedEntry,
                    "expected a primitive array entry, got {:?}",
                    other,
                )
            }
        }
    }
}
