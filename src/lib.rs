//! Binary serialization of typed entry streams.
//!
//! A value graph is flattened into a sequence of *entries*: primitives,
//! strings, references, and the start/end tags of nested nodes and arrays.
//! [`BinaryWriter`] emits that sequence as a compact little-endian binary
//! format; [`BinaryReader`] peeks and consumes it back, tolerating data
//! layout drift between the writer's schema and the reader's.
//!
//! To serialize, drive a writer:
//!
//! 1. A value with identity opens with
//!    [`begin_reference_node`](BinaryWriter::begin_reference_node), a plain
//!    value with [`begin_struct_node`](BinaryWriter::begin_struct_node);
//!    either takes an optional entry name and closes with
//!    [`end_node`](BinaryWriter::end_node).
//! 2. Inside a node, write each member with the `write_*` operation for
//!    its type, passing the member's name.
//! 3. Collections open with
//!    [`begin_array_node`](BinaryWriter::begin_array_node) and a length,
//!    write unnamed elements, and close with
//!    [`end_array_node`](BinaryWriter::end_array_node). Slices of
//!    fixed-width elements go through
//!    [`write_primitive_array`](BinaryWriter::write_primitive_array)
//!    instead, which is one blob on the wire.
//! 4. [`flush_to_sink`](BinaryWriter::flush_to_sink) when done.
//!
//! To deserialize, drive a reader:
//!
//! 1. [`peek_entry`](BinaryReader::peek_entry) to see what's under the
//!    cursor without consuming it.
//! 2. The matching `read_*` / `enter_*` / `exit_*` operation to consume
//!    it, or [`skip_entry`](BinaryReader::skip_entry) to discard it,
//!    however large.
//! 3. A non-fatal `Err` means that one value was lost and the stream is
//!    already positioned at the next entry; check
//!    [`Error::is_fatal`](Error::is_fatal) to decide whether to continue.
//!
//! Node exit is where the resilience lives:
//! [`exit_node`](BinaryReader::exit_node) skips anything the caller didn't
//! read and stops exactly past the matching end tag, so a value whose
//! shape changed is dropped without desynchronizing the entries after it.
//!
//! Type names are written once per session and back-referenced by id
//! thereafter; plug in a [`TypeBinder`] to map between in-memory type
//! identities and their serialized names.

mod decimal;
mod entry;
mod frame;
mod policy;
mod prim;
mod reader;
mod types;
mod writer;

pub mod error;

pub use crate::{
    decimal::Decimal,
    entry::{
        EntryType,
        BinaryEntryType,
    },
    error::{
        Error,
        ErrorKind,
    },
    frame::STRUCT_NODE_ID,
    policy::ErrorPolicy,
    prim::Primitive,
    reader::BinaryReader,
    types::{
        TypeRef,
        TypeBinder,
        DefaultTypeBinder,
    },
    writer::BinaryWriter,
};


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    fn write_into_vec(f: impl FnOnce(&mut BinaryWriter<Vec<u8>>)) -> Vec<u8> {
        let mut writer = BinaryWriter::new(Vec::new());
        f(&mut writer);
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_struct_node_round_trip() {
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(Some("outer"), Some(&TypeRef::from("Outer"))).unwrap();
            w.write_i32(Some("a"), -7).unwrap();
            w.write_string(Some("k"), "hi").unwrap();
            w.end_node(Some("outer")).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.peek_entry().unwrap(), EntryType::StartOfNode);
        assert_eq!(r.current_entry_name(), Some("outer"));
        let ty = r.enter_node().unwrap();
        assert_eq!(ty.as_deref(), Some("Outer"));
        assert_eq!(r.current_node_id(), Some(STRUCT_NODE_ID));

        assert_eq!(r.peek_entry().unwrap(), EntryType::Integer);
        assert_eq!(r.current_entry_name(), Some("a"));
        assert_eq!(r.read_i32().unwrap(), -7);

        assert_eq!(r.peek_entry().unwrap(), EntryType::String);
        assert_eq!(r.current_entry_name(), Some("k"));
        assert_eq!(r.read_string().unwrap(), "hi");

        r.exit_node().unwrap();
        assert_eq!(r.current_node_depth(), 0);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_array_round_trip() {
        let bytes = write_into_vec(|w| {
            w.begin_array_node(3).unwrap();
            for x in [1i32, 2, 3] {
                w.write_i32(None, x).unwrap();
            }
            w.end_array_node().unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        let len = r.enter_array().unwrap();
        assert_eq!(len, 3);
        for want in [1i32, 2, 3] {
            assert_eq!(r.read_i32().unwrap(), want);
        }
        r.exit_array().unwrap();
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_all_primitive_round_trips() {
        let guid = Uuid::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF);
        let dec = Decimal::try_from_f64(-12.75).unwrap();
        let bytes = write_into_vec(|w| {
            w.write_i8(Some("a"), -8).unwrap();
            w.write_u8(Some("b"), 200).unwrap();
            w.write_i16(Some("c"), -3000).unwrap();
            w.write_u16(Some("d"), 60000).unwrap();
            w.write_i32(Some("e"), -70_000).unwrap();
            w.write_u32(Some("f"), 4_000_000_000).unwrap();
            w.write_i64(Some("g"), i64::MIN).unwrap();
            w.write_u64(Some("h"), u64::MAX).unwrap();
            w.write_f32(Some("i"), 1.5).unwrap();
            w.write_f64(Some("j"), -2.25).unwrap();
            w.write_decimal(Some("k"), dec).unwrap();
            w.write_bool(Some("l"), true).unwrap();
            w.write_char(Some("m"), 'Ω').unwrap();
            w.write_guid(Some("n"), guid).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_i8().unwrap(), -8);
        assert_eq!(r.read_u8().unwrap(), 200);
        assert_eq!(r.read_i16().unwrap(), -3000);
        assert_eq!(r.read_u16().unwrap(), 60000);
        assert_eq!(r.read_i32().unwrap(), -70_000);
        assert_eq!(r.read_u32().unwrap(), 4_000_000_000);
        assert_eq!(r.read_i64().unwrap(), i64::MIN);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.read_f64().unwrap(), -2.25);
        assert_eq!(r.read_decimal().unwrap(), dec);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_char().unwrap(), 'Ω');
        assert_eq!(r.read_guid().unwrap(), guid);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_widening_integer_reads() {
        let bytes = write_into_vec(|w| {
            w.write_i8(Some("a"), -5).unwrap();
            w.write_u32(Some("b"), 123).unwrap();
            w.write_i32(Some("c"), 42).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_i64().unwrap(), -5);
        assert_eq!(r.read_u8().unwrap(), 123);
        assert_eq!(r.read_f64().unwrap(), 42.0);
    }

    #[test]
    fn test_narrowing_read_overflows_and_consumes() {
        let bytes = write_into_vec(|w| {
            w.write_i64(Some("big"), i64::from(i32::MAX) + 1).unwrap();
            w.write_i32(Some("next"), 9).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        let err = r.read_i32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert!(!err.is_fatal());
        // the oversized entry was consumed; the stream is still usable
        assert_eq!(r.read_i32().unwrap(), 9);
    }

    #[test]
    fn test_negative_to_unsigned_overflows() {
        let bytes = write_into_vec(|w| {
            w.write_i32(None, -1).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_u64().unwrap_err().kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_string_compression_modes() {
        let ascii = "plain ascii";
        let emoji = "cost: 🔥";

        // default: every string goes out as UTF-16 code units
        let wide = write_into_vec(|w| {
            w.write_string(None, ascii).unwrap();
        });
        assert_eq!(wide[1], 1);
        let mut r = BinaryReader::from_slice(&wide);
        assert_eq!(r.read_string().unwrap(), ascii);

        let mut writer = BinaryWriter::new(Vec::new())
            .with_string_compression(true);
        writer.write_string(None, ascii).unwrap();
        writer.write_string(None, emoji).unwrap();
        let compressed = writer.into_inner().unwrap();
        // the all-8-bit string got the one-byte-per-char flag
        assert_eq!(compressed[1], 0);
        let mut r = BinaryReader::from_slice(&compressed);
        assert_eq!(r.read_string().unwrap(), ascii);
        // a string with chars past 0xFF falls back to UTF-16
        assert_eq!(r.read_string().unwrap(), emoji);
    }

    #[test]
    fn test_primitive_array_round_trips() {
        fn round_trip<T: Primitive + PartialEq + std::fmt::Debug>(values: &[T]) {
            let bytes = write_into_vec(|w| {
                w.write_primitive_array(values).unwrap();
            });
            let mut r = BinaryReader::from_slice(&bytes);
            assert_eq!(r.peek_entry().unwrap(), EntryType::PrimitiveArray);
            assert_eq!(r.read_primitive_array::<T>().unwrap(), values);
        }

        round_trip::<i32>(&[]);
        round_trip::<i32>(&[-1]);
        round_trip::<i32>(&[i32::MIN, 0, i32::MAX]);
        round_trip::<u8>(&[0, 1, 255]);
        round_trip::<f64>(&[0.5, -0.25]);
        round_trip::<bool>(&[true, false, true]);
        round_trip::<char>(&['a', 'Ω']);
        round_trip::<Decimal>(&[
            Decimal::from_i64(3),
            Decimal::try_from_f64(-0.5).unwrap(),
        ]);
        round_trip::<Uuid>(&[Uuid::from_u128(7), Uuid::from_u128(u128::MAX)]);
    }

    #[test]
    fn test_primitive_array_element_size_mismatch() {
        let bytes = write_into_vec(|w| {
            w.write_primitive_array(&[1i32, 2, 3]).unwrap();
            w.write_bool(None, true).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        let err = r.read_primitive_array::<i64>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEntry);
        // the blob was skipped whole
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn test_type_table_dedup() {
        let ty = TypeRef::from("some.Type");
        let bytes = write_into_vec(|w| {
            for i in 0..3 {
                w.begin_reference_node(None, Some(&ty), i).unwrap();
                w.end_node(None).unwrap();
            }
        });
        // the full name appears exactly once on the wire
        let name_count = bytes
            .iter()
            .filter(|&&b| b == BinaryEntryType::TypeName as u8)
            .count();
        let id_count = bytes
            .iter()
            .filter(|&&b| b == BinaryEntryType::TypeId as u8)
            .count();
        assert_eq!(name_count, 1);
        assert_eq!(id_count, 2);

        let mut r = BinaryReader::from_slice(&bytes);
        for i in 0..3 {
            assert_eq!(r.enter_node().unwrap().as_deref(), Some("some.Type"));
            assert_eq!(r.current_node_id(), Some(i));
            r.exit_node().unwrap();
        }
    }

    #[test]
    fn test_new_session_re_emits_type_name() {
        let ty = TypeRef::from("T");
        let mut writer = BinaryWriter::new(Vec::new());
        writer.begin_reference_node(None, Some(&ty), 0).unwrap();
        writer.end_node(None).unwrap();
        writer.flush_to_sink().unwrap();
        writer.prepare_new_session();
        writer.begin_reference_node(None, Some(&ty), 0).unwrap();
        writer.end_node(None).unwrap();
        writer.flush_to_sink().unwrap();
        let bytes = writer.into_inner().unwrap();

        let name_count = bytes
            .iter()
            .filter(|&&b| b == BinaryEntryType::TypeName as u8)
            .count();
        assert_eq!(name_count, 2);

        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.enter_node().unwrap().as_deref(), Some("T"));
        r.exit_node().unwrap();
        r.prepare_new_session();
        assert_eq!(r.enter_node().unwrap().as_deref(), Some("T"));
        r.exit_node().unwrap();
    }

    #[test]
    fn test_exit_node_skips_unread_children() {
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(None, None).unwrap();
            w.write_i32(Some("a"), 1).unwrap();
            w.begin_struct_node(Some("inner"), None).unwrap();
            w.write_string(Some("s"), "deep").unwrap();
            w.end_node(Some("inner")).unwrap();
            w.write_primitive_array(&[1u8, 2, 3]).unwrap();
            w.end_node(None).unwrap();
            w.write_i32(Some("after"), 99).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        r.enter_node().unwrap();
        assert_eq!(r.read_i32().unwrap(), 1);
        // leave the inner node and the primitive array unread
        r.exit_node().unwrap();
        assert_eq!(r.read_i32().unwrap(), 99);
    }

    #[test]
    fn test_exit_node_crosses_open_array_boundary() {
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(None, None).unwrap();
            w.begin_array_node(1).unwrap();
            w.write_i32(None, 5).unwrap();
            w.end_array_node().unwrap();
            w.end_node(None).unwrap();
            w.write_i32(Some("after"), 9).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        r.enter_node().unwrap();
        r.enter_array().unwrap();
        assert_eq!(r.read_i32().unwrap(), 5);
        // exit the node while the array is still open: the array boundary
        // is crossed with a warning and both frames come off the stack
        r.exit_node().unwrap();
        assert_eq!(r.current_node_depth(), 0);
        assert_eq!(r.read_i32().unwrap(), 9);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_exit_array_crosses_open_node_boundary() {
        let bytes = write_into_vec(|w| {
            w.begin_array_node(1).unwrap();
            w.begin_struct_node(None, None).unwrap();
            w.write_i32(Some("x"), 5).unwrap();
            w.end_node(None).unwrap();
            w.end_array_node().unwrap();
            w.write_i32(Some("after"), 9).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        r.enter_array().unwrap();
        r.enter_node().unwrap();
        assert_eq!(r.read_i32().unwrap(), 5);
        r.exit_array().unwrap();
        assert_eq!(r.current_node_depth(), 0);
        assert_eq!(r.read_i32().unwrap(), 9);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_skip_entry_over_whole_subtrees() {
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(Some("victim"), None).unwrap();
            w.begin_array_node(2).unwrap();
            w.write_i64(None, 10).unwrap();
            w.write_i64(None, 20).unwrap();
            w.end_array_node().unwrap();
            w.end_node(Some("victim")).unwrap();
            w.write_bool(Some("tail"), false).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.peek_entry().unwrap(), EntryType::StartOfNode);
        r.skip_entry().unwrap();
        assert!(!r.read_bool().unwrap());
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_references_round_trip() {
        let guid = Uuid::from_u128(99);
        let bytes = write_into_vec(|w| {
            w.write_internal_reference(Some("r"), 4).unwrap();
            w.write_external_reference_by_index(Some("i"), 2).unwrap();
            w.write_external_reference_by_guid(Some("g"), guid).unwrap();
            w.write_external_reference_by_string(Some("s"), "asset/7").unwrap();
            w.write_null(Some("n")).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_internal_reference().unwrap(), 4);
        assert_eq!(r.read_external_reference_by_index().unwrap(), 2);
        assert_eq!(r.read_external_reference_by_guid().unwrap(), guid);
        assert_eq!(r.read_external_reference_by_string().unwrap(), "asset/7");
        assert_eq!(r.peek_entry().unwrap(), EntryType::Null);
        r.read_null().unwrap();
    }

    #[test]
    fn test_peek_is_idempotent() {
        let bytes = write_into_vec(|w| {
            w.write_i32(Some("only"), 5).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.peek_entry().unwrap(), EntryType::Integer);
        assert_eq!(r.peek_entry().unwrap(), EntryType::Integer);
        assert_eq!(r.read_i32().unwrap(), 5);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_invalid_byte_peeks_invalid() {
        let mut r = BinaryReader::from_slice(&[0xEE, 0xEE]);
        assert_eq!(r.peek_entry().unwrap(), EntryType::Invalid);
        r.skip_entry().unwrap();
        assert_eq!(r.peek_entry().unwrap(), EntryType::Invalid);
        r.skip_entry().unwrap();
        assert_eq!(r.peek_entry().unwrap(), EntryType::EndOfStream);
    }

    #[test]
    fn test_explicit_invalid_tag_reports_like_unknown_byte() {
        // the 0x00 tag is in the tag set but still a protocol violation
        let mut r = BinaryReader::from_slice(&[0x00]);
        assert_eq!(r.peek_entry().unwrap(), EntryType::Invalid);

        let mut r = BinaryReader::from_slice(&[0x00])
            .with_policy(ErrorPolicy::ThrowOnErrors);
        let err = r.peek_entry().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Escalated);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_current_node_type_tracks_innermost_node() {
        let ty = TypeRef::from("Outer");
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(None, Some(&ty)).unwrap();
            w.begin_struct_node(None, None).unwrap();
            w.end_node(None).unwrap();
            w.end_node(None).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.current_node_type(), None);
        r.enter_node().unwrap();
        assert_eq!(r.current_node_type().map(|t| t.name()), Some("Outer"));
        r.enter_node().unwrap();
        assert_eq!(r.current_node_type(), None);
        r.exit_node().unwrap();
        assert_eq!(r.current_node_type().map(|t| t.name()), Some("Outer"));
        r.exit_node().unwrap();
        assert_eq!(r.current_node_type(), None);
    }

    #[test]
    fn test_strict_policy_escalates_invalid_byte() {
        let mut r = BinaryReader::from_slice(&[0xEE])
            .with_policy(ErrorPolicy::ThrowOnErrors);
        let err = r.peek_entry().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Escalated);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_wrong_read_skips_and_fails() {
        let bytes = write_into_vec(|w| {
            w.write_string(Some("s"), "not a number").unwrap();
            w.write_i32(Some("n"), 3).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        let err = r.read_i64().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEntry);
        assert!(!err.is_fatal());
        // the mismatched entry was skipped, not left under the cursor
        assert_eq!(r.read_i32().unwrap(), 3);
    }

    #[test]
    fn test_read_char_from_string_entry() {
        let bytes = write_into_vec(|w| {
            w.write_string(None, "xyz").unwrap();
            w.write_bool(None, true).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_char().unwrap(), 'x');
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn test_truncated_stream_is_recoverable() {
        let bytes = write_into_vec(|w| {
            w.begin_struct_node(None, None).unwrap();
            w.write_i64(Some("a"), 1).unwrap();
        });
        // chop off the middle of the integer payload
        let truncated = &bytes[..bytes.len() - 4];
        let mut r = BinaryReader::from_slice(truncated);
        r.enter_node().unwrap();
        let err = r.read_i64().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        // the exit still fails (no end tag exists) but not fatally
        let err = r.exit_node().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        assert!(!err.is_fatal());
        assert_eq!(r.current_node_depth(), 0);
    }

    #[test]
    fn test_long_string_direct_path() {
        // large enough to overflow the staging buffer
        let long: String = std::iter::repeat('x').take(200 * 1024).collect();
        let bytes = write_into_vec(|w| {
            w.write_string(Some("big"), &long).unwrap();
            w.write_i32(Some("tail"), 1).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_string().unwrap(), long);
        assert_eq!(r.read_i32().unwrap(), 1);
    }

    #[test]
    fn test_large_primitive_array_direct_path() {
        let values: Vec<i64> = (0..50_000).collect();
        let bytes = write_into_vec(|w| {
            w.write_primitive_array(&values).unwrap();
        });
        let mut r = BinaryReader::from_slice(&bytes);
        assert_eq!(r.read_primitive_array::<i64>().unwrap(), values);
    }

    #[test]
    fn test_from_reader_owns_its_data() {
        let bytes = write_into_vec(|w| {
            w.write_i32(None, 11).unwrap();
        });
        let mut r = BinaryReader::from_reader(&bytes[..]).unwrap();
        assert_eq!(r.read_i32().unwrap(), 11);
    }

    #[test]
    fn test_custom_type_binder() {
        struct Shortener;
        impl TypeBinder for Shortener {
            fn bind_to_name(&self, ty: &TypeRef) -> String {
                format!("v2.{}", ty)
            }
            fn bind_to_type(&self, name: &str) -> Option<TypeRef> {
                name.strip_prefix("v2.").map(TypeRef::from)
            }
        }

        let binder = Arc::new(Shortener);
        let ty = TypeRef::from("Thing");
        let mut writer = BinaryWriter::new(Vec::new())
            .with_binder(binder.clone());
        writer.begin_reference_node(None, Some(&ty), 0).unwrap();
        writer.end_node(None).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut r = BinaryReader::from_slice(&bytes).with_binder(binder);
        assert_eq!(r.enter_node().unwrap().as_deref(), Some("Thing"));
        r.exit_node().unwrap();
    }

    #[test]
    fn test_unbindable_type_reads_as_untyped() {
        struct RejectAll;
        impl TypeBinder for RejectAll {
            fn bind_to_name(&self, ty: &TypeRef) -> String {
                ty.to_string()
            }
            fn bind_to_type(&self, _name: &str) -> Option<TypeRef> {
                None
            }
        }

        let ty = TypeRef::from("Gone");
        let bytes = write_into_vec(|w| {
            w.begin_reference_node(None, Some(&ty), 0).unwrap();
            w.write_i32(Some("x"), 1).unwrap();
            w.end_node(None).unwrap();
        });

        let mut r = BinaryReader::from_slice(&bytes)
            .with_binder(Arc::new(RejectAll));
        assert_eq!(r.enter_node().unwrap(), None);
        assert_eq!(r.read_i32().unwrap(), 1);
        r.exit_node().unwrap();
    }
}
