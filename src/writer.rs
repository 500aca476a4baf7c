//! Serializes entries into a staging buffer that flushes to an underlying
//! `std::io::Write` byte sink.

use crate::{
    decimal::Decimal,
    entry::BinaryEntryType,
    error::{
        Result,
        error,
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
    collections::HashMap,
    io::Write,
    sync::Arc,
};
use uuid::Uuid;


/// Staging buffer capacity. A tuning constant, not a protocol invariant;
/// it only has to exceed the largest fixed-width primitive (16 bytes).
pub(crate) const BUFFER_CAPACITY: usize = 100 * 1024;

/// Chunk size for payloads that bypass the staging buffer.
const DIRECT_CHUNK: usize = 16 * 1024;

/// Writes a flat stream of typed entries to a `std::io::Write` byte sink.
///
/// Every write appends to a fixed-capacity staging buffer that flushes to
/// the sink transparently when it lacks room; callers only need
/// [`flush_to_sink`](Self::flush_to_sink) at the end of a session. A single
/// fixed-width value is never split across a flush.
///
/// The writer trusts its caller regarding node/array nesting for
/// performance: mismatched nesting surfaces as wrong bytes on the wire, not
/// as failures, with the one exception of [`end_node`](Self::end_node),
/// which checks the closed node's name and reports a mismatch through the
/// error policy, since that always indicates a caller bug.
pub struct BinaryWriter<W> {
    sink: W,
    buf: Vec<u8>,
    type_table: HashMap<TypeRef, i32>,
    stack: Vec<Frame>,
    binder: Arc<dyn TypeBinder>,
    policy: ErrorPolicy,
    compress_strings: bool,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(sink: W) -> Self {
        BinaryWriter {
            sink,
            buf: Vec::with_capacity(BUFFER_CAPACITY),
            type_table: HashMap::new(),
            stack: Vec::new(),
            binder: Arc::new(DefaultTypeBinder),
            policy: ErrorPolicy::default(),
            compress_strings: false,
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

    /// Opt in to storing strings whose chars all fit 8 bits as one byte
    /// per char. Off by default; readers support both unconditionally.
    pub fn with_string_compression(mut self, compress: bool) -> Self {
        self.compress_strings = compress;
        self
    }

    /// Force the staging buffer out to the sink and flush the sink.
    /// Idempotent.
    pub fn flush_to_sink(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Reset the type table and all per-session state so this instance can
    /// serialize an unrelated top-level value. Discards any unflushed
    /// staged bytes.
    pub fn prepare_new_session(&mut self) {
        self.type_table.clear();
        self.stack.clear();
        self.buf.clear();
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush_to_sink()?;
        Ok(self.sink)
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Guarantee `n` contiguous bytes of staging space, flushing first if
    /// needed. Callers doing a fixed-width write go through this so the
    /// value never straddles a flush boundary.
    fn ensure_space(&mut self, n: usize) -> Result<()> {
        ensure!(
            n <= BUFFER_CAPACITY,
            ApiUsage,
            "single buffered write of {} bytes exceeds the staging capacity",
            n,
        );
        if self.buf.len() + n > BUFFER_CAPACITY {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn put_tag(
        &mut self,
        name: Option<&str>,
        named: BinaryEntryType,
        unnamed: BinaryEntryType,
    ) -> Result<()> {
        self.ensure_space(1)?;
        match name {
            Some(name) => {
                self.buf.push(named as u8);
                self.put_string_payload(name)
            }
            None => {
                self.buf.push(unnamed as u8);
                Ok(())
            }
        }
    }

    /// String wire layout: 1-byte char-size flag, 4-byte signed char
    /// count, then 1 or 2 bytes per char.
    fn put_string_payload(&mut self, s: &str) -> Result<()> {
        let eight_bit =
            self.compress_strings && s.chars().all(|c| (c as u32) <= 0xFF);
        let count =
            if eight_bit {
                s.chars().count()
            } else {
                s.encode_utf16().count()
            };
        let count_i32 = i32::try_from(count)
            .map_err(|_| error!(
                ApiUsage,
                "string of {} chars exceeds wire limits",
                count,
            ))?;
        self.ensure_space(5)?;
        // flag 0 = one byte per char, flag 1 = UTF-16 code units
        self.buf.push(!eight_bit as u8);
        count_i32.put(&mut self.buf);
        let byte_len = count * if eight_bit { 1 } else { 2 };
        if self.buf.len() + byte_len <= BUFFER_CAPACITY {
            if eight_bit {
                self.buf.extend(s.chars().map(|c| c as u32 as u8));
            } else {
                for unit in s.encode_utf16() {
                    unit.put(&mut self.buf);
                }
            }
            return Ok(());
        }
        // payload doesn't fit the staging buffer: stream it to the sink
        // directly, in chunks, after flushing what's staged
        self.flush_buffer()?;
        let mut chunk = Vec::with_capacity(DIRECT_CHUNK);
        if eight_bit {
            for c in s.chars() {
                chunk.push(c as u32 as u8);
                if chunk.len() >= DIRECT_CHUNK {
                    self.sink.write_all(&chunk)?;
                    chunk.clear();
                }
            }
        } else {
            for unit in s.encode_utf16() {
                unit.put(&mut chunk);
                if chunk.len() >= DIRECT_CHUNK {
                    self.sink.write_all(&chunk)?;
                    chunk.clear();
                }
            }
        }
        if !chunk.is_empty() {
            self.sink.write_all(&chunk)?;
        }
        Ok(())
    }

    /// One `TypeName`, `TypeID`, or no-type entry. The first time a type is
    /// seen in a session it gets a fresh sequential id and its bound name
    /// on the wire; every repeat is just the id.
    fn put_type_entry(&mut self, ty: Option<&TypeRef>) -> Result<()> {
        let Some(ty) = ty else {
            self.ensure_space(1)?;
            self.buf.push(BinaryEntryType::UnnamedNull as u8);
            return Ok(());
        };
        if let Some(&id) = self.type_table.get(ty) {
            self.ensure_space(5)?;
            self.buf.push(BinaryEntryType::TypeId as u8);
            id.put(&mut self.buf);
        } else {
            let id = self.type_table.len() as i32;
            self.type_table.insert(ty.clone(), id);
            let name = self.binder.bind_to_name(ty);
            self.ensure_space(5)?;
            self.buf.push(BinaryEntryType::TypeName as u8);
            id.put(&mut self.buf);
            self.put_string_payload(&name)?;
        }
        Ok(())
    }
}

macro_rules! write_fixed {
    ($($m:ident($t:ty) $named:ident / $unnamed:ident,)*)=>{$(
        pub fn $m(&mut self, name: Option<&str>, value: $t) -> Result<()> {
            self.put_tag(name, BinaryEntryType::$named, BinaryEntryType::$unnamed)?;
            self.ensure_space(<$t as Primitive>::WIRE_SIZE)?;
            value.put(&mut self.buf);
            Ok(())
        }
    )*};
}

impl<W: Write> BinaryWriter<W> {
    write_fixed!(
        write_i8(i8) NamedSByte / UnnamedSByte,
        write_u8(u8) NamedByte / UnnamedByte,
        write_i16(i16) NamedShort / UnnamedShort,
        write_u16(u16) NamedUShort / UnnamedUShort,
        write_i32(i32) NamedInt / UnnamedInt,
        write_u32(u32) NamedUInt / UnnamedUInt,
        write_i64(i64) NamedLong / UnnamedLong,
        write_u64(u64) NamedULong / UnnamedULong,
        write_f32(f32) NamedFloat / UnnamedFloat,
        write_f64(f64) NamedDouble / UnnamedDouble,
        write_decimal(Decimal) NamedDecimal / UnnamedDecimal,
        write_guid(Uuid) NamedGuid / UnnamedGuid,
        write_bool(bool) NamedBoolean / UnnamedBoolean,
    );

    pub fn write_char(&mut self, name: Option<&str>, value: char) -> Result<()> {
        if (value as u32) > 0xFFFF {
            self.policy.warning(format_args!(
                "char {:?} does not fit one UTF-16 unit, writing U+FFFD",
                value,
            ))?;
        }
        self.put_tag(
            name,
            BinaryEntryType::NamedChar,
            BinaryEntryType::UnnamedChar,
        )?;
        self.ensure_space(2)?;
        value.put(&mut self.buf);
        Ok(())
    }

    pub fn write_string(&mut self, name: Option<&str>, value: &str) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedString,
            BinaryEntryType::UnnamedString,
        )?;
        self.put_string_payload(value)
    }

    pub fn write_null(&mut self, name: Option<&str>) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedNull,
            BinaryEntryType::UnnamedNull,
        )
    }

    /// Back-reference to an object already written in this stream.
    pub fn write_internal_reference(
        &mut self,
        name: Option<&str>,
        id: i32,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedInternalReference,
            BinaryEntryType::UnnamedInternalReference,
        )?;
        self.ensure_space(4)?;
        id.put(&mut self.buf);
        Ok(())
    }

    pub fn write_external_reference_by_index(
        &mut self,
        name: Option<&str>,
        index: i32,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedExternalReferenceByIndex,
            BinaryEntryType::UnnamedExternalReferenceByIndex,
        )?;
        self.ensure_space(4)?;
        index.put(&mut self.buf);
        Ok(())
    }

    pub fn write_external_reference_by_guid(
        &mut self,
        name: Option<&str>,
        guid: Uuid,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedExternalReferenceByGuid,
            BinaryEntryType::UnnamedExternalReferenceByGuid,
        )?;
        self.ensure_space(16)?;
        guid.put(&mut self.buf);
        Ok(())
    }

    pub fn write_external_reference_by_string(
        &mut self,
        name: Option<&str>,
        id: &str,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedExternalReferenceByString,
            BinaryEntryType::UnnamedExternalReferenceByString,
        )?;
        self.put_string_payload(id)
    }

    /// Begin a node that carries a reference id, registering the object
    /// for cycle resolution on the read side. Close with
    /// [`end_node`](Self::end_node).
    pub fn begin_reference_node(
        &mut self,
        name: Option<&str>,
        ty: Option<&TypeRef>,
        id: i32,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedStartOfReferenceNode,
            BinaryEntryType::UnnamedStartOfReferenceNode,
        )?;
        self.put_type_entry(ty)?;
        self.ensure_space(4)?;
        id.put(&mut self.buf);
        self.stack.push(Frame::Node {
            name: name.map(str::to_owned),
            id,
            ty: ty.cloned(),
        });
        Ok(())
    }

    /// Begin a valueless struct node. Close with
    /// [`end_node`](Self::end_node).
    pub fn begin_struct_node(
        &mut self,
        name: Option<&str>,
        ty: Option<&TypeRef>,
    ) -> Result<()> {
        self.put_tag(
            name,
            BinaryEntryType::NamedStartOfStructNode,
            BinaryEntryType::UnnamedStartOfStructNode,
        )?;
        self.put_type_entry(ty)?;
        self.stack.push(Frame::Node {
            name: name.map(str::to_owned),
            id: STRUCT_NODE_ID,
            ty: ty.cloned(),
        });
        Ok(())
    }

    /// End the innermost open node. The name must match the one the node
    /// was begun with; a mismatch is a caller bug, reported through the
    /// error policy. The end tag is written either way.
    pub fn end_node(&mut self, name: Option<&str>) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Node { name: open_name, .. }) => {
                if open_name.as_deref() != name {
                    self.policy.error(format_args!(
                        "end_node with name {:?}, but the open node is named {:?}",
                        name,
                        open_name,
                    ))?;
                }
            }
            Some(frame) => {
                self.policy.error(format_args!(
                    "end_node, but the innermost open frame is an {}",
                    frame.describe(),
                ))?;
            }
            None => {
                self.policy.error(format_args!(
                    "end_node with no open frames",
                ))?;
            }
        }
        self.ensure_space(1)?;
        self.buf.push(BinaryEntryType::EndOfNode as u8);
        Ok(())
    }

    /// Begin an array of `length` elements. A negative length is clamped
    /// to zero and reported. Close with
    /// [`end_array_node`](Self::end_array_node).
    pub fn begin_array_node(&mut self, length: i64) -> Result<()> {
        let length =
            if length < 0 {
                self.policy.error(format_args!(
                    "cannot write an array of negative length {}, clamping to 0",
                    length,
                ))?;
                0
            } else {
                length
            };
        self.ensure_space(9)?;
        self.buf.push(BinaryEntryType::StartOfArray as u8);
        length.put(&mut self.buf);
        self.stack.push(Frame::Array { length });
        Ok(())
    }

    pub fn end_array_node(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Array { .. }) => {}
            Some(frame) => {
                self.policy.error(format_args!(
                    "end_array_node, but the innermost open frame is a {}",
                    frame.describe(),
                ))?;
            }
            None => {
                self.policy.error(format_args!(
                    "end_array_node with no open frames",
                ))?;
            }
        }
        self.ensure_space(1)?;
        self.buf.push(BinaryEntryType::EndOfArray as u8);
        Ok(())
    }

    /// Fast path for arrays of fixed-width primitives: one tag, a 4-byte
    /// element count, a 4-byte bytes-per-element, then the raw
    /// little-endian blob with no per-element framing. Byte slices go out
    /// byte-for-byte.
    pub fn write_primitive_array<T: Primitive>(&mut self, values: &[T]) -> Result<()> {
        let count = i32::try_from(values.len())
            .map_err(|_| error!(
                ApiUsage,
                "primitive array of {} elements exceeds wire limits",
                values.len(),
            ))?;
        self.ensure_space(9)?;
        self.buf.push(BinaryEntryType::PrimitiveArray as u8);
        count.put(&mut self.buf);
        (T::WIRE_SIZE as i32).put(&mut self.buf);
        let byte_len = values.len() * T::WIRE_SIZE;
        if self.buf.len() + byte_len <= BUFFER_CAPACITY {
            T::put_slice(values, &mut self.buf);
            return Ok(());
        }
        // blob too big to stage: bypass the buffer entirely
        self.flush_buffer()?;
        let mut chunk = Vec::with_capacity(DIRECT_CHUNK);
        for group in values.chunks(DIRECT_CHUNK / T::WIRE_SIZE) {
            chunk.clear();
            T::put_slice(group, &mut chunk);
            self.sink.write_all(&chunk)?;
        }
        Ok(())
    }
}
