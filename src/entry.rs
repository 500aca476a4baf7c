//! The entry vocabulary: the format-agnostic semantic token kinds and the
//! binary wire tag set, with the fixed, total mapping between them.


/// Semantic kind of the entry currently under the read cursor, as yielded
/// by [`peek_entry`](crate::BinaryReader::peek_entry).
///
/// Several wire tags map onto one `EntryType`; for example every integer
/// width, named or unnamed, peeks as `Integer`. The distinction between tag
/// and entry type is what lets a reader accept a wider tag set than the
/// writer that produced a given field (see the widening reads on
/// [`BinaryReader`](crate::BinaryReader)).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EntryType {
    /// An unrecognized or forbidden tag was peeked. The stream is corrupt
    /// at this position.
    Invalid,
    /// The buffered data is exhausted. Peeking again yields this forever.
    EndOfStream,
    /// Start of a struct node or reference node.
    StartOfNode,
    EndOfNode,
    StartOfArray,
    EndOfArray,
    /// Contiguous blob of fixed-width elements (the fast path).
    PrimitiveArray,
    Null,
    /// Back-reference by integer id to an object earlier in this stream.
    InternalReference,
    ExternalReferenceByIndex,
    ExternalReferenceByGuid,
    ExternalReferenceByString,
    /// A string or a single char.
    String,
    Guid,
    /// Any integer width, signed or unsigned.
    Integer,
    /// A float, double, or decimal.
    FloatingPoint,
    Boolean,
}

/// A binary wire tag. One byte on the wire; the closed set of values below
/// is part of the wire format and must never be renumbered.
///
/// Every primitive, node, and reference kind comes as a named/unnamed pair:
/// the named variant is immediately followed on the wire by a
/// length-prefixed string (the entry's name) before its payload, the
/// unnamed variant goes straight to payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum BinaryEntryType {
    Invalid = 0x00,
    NamedStartOfReferenceNode = 0x01,
    UnnamedStartOfReferenceNode = 0x02,
    NamedStartOfStructNode = 0x03,
    UnnamedStartOfStructNode = 0x04,
    EndOfNode = 0x05,
    StartOfArray = 0x06,
    EndOfArray = 0x07,
    PrimitiveArray = 0x08,
    NamedInternalReference = 0x09,
    UnnamedInternalReference = 0x0A,
    NamedExternalReferenceByIndex = 0x0B,
    UnnamedExternalReferenceByIndex = 0x0C,
    NamedExternalReferenceByGuid = 0x0D,
    UnnamedExternalReferenceByGuid = 0x0E,
    NamedSByte = 0x0F,
    UnnamedSByte = 0x10,
    NamedByte = 0x11,
    UnnamedByte = 0x12,
    NamedShort = 0x13,
    UnnamedShort = 0x14,
    NamedUShort = 0x15,
    UnnamedUShort = 0x16,
    NamedInt = 0x17,
    UnnamedInt = 0x18,
    NamedUInt = 0x19,
    UnnamedUInt = 0x1A,
    NamedLong = 0x1B,
    UnnamedLong = 0x1C,
    NamedULong = 0x1D,
    UnnamedULong = 0x1E,
    NamedFloat = 0x1F,
    UnnamedFloat = 0x20,
    NamedDouble = 0x21,
    UnnamedDouble = 0x22,
    NamedDecimal = 0x23,
    UnnamedDecimal = 0x24,
    NamedChar = 0x25,
    UnnamedChar = 0x26,
    NamedString = 0x27,
    UnnamedString = 0x28,
    NamedGuid = 0x29,
    UnnamedGuid = 0x2A,
    NamedBoolean = 0x2B,
    UnnamedBoolean = 0x2C,
    NamedNull = 0x2D,
    UnnamedNull = 0x2E,
    TypeName = 0x2F,
    TypeId = 0x30,
    EndOfStream = 0x31,
    NamedExternalReferenceByString = 0x32,
    UnnamedExternalReferenceByString = 0x33,
}

impl BinaryEntryType {
    /// Decode a wire byte. Unknown bytes return `None`, which a reader
    /// surfaces as [`EntryType::Invalid`].
    pub fn from_byte(b: u8) -> Option<Self> {
        use BinaryEntryType::*;
        Some(match b {
            0x00 => Invalid,
            0x01 => NamedStartOfReferenceNode,
            0x02 => UnnamedStartOfReferenceNode,
            0x03 => NamedStartOfStructNode,
            0x04 => UnnamedStartOfStructNode,
            0x05 => EndOfNode,
            0x06 => StartOfArray,
            0x07 => EndOfArray,
            0x08 => PrimitiveArray,
            0x09 => NamedInternalReference,
            0x0A => UnnamedInternalReference,
            0x0B => NamedExternalReferenceByIndex,
            0x0C => UnnamedExternalReferenceByIndex,
            0x0D => NamedExternalReferenceByGuid,
            0x0E => UnnamedExternalReferenceByGuid,
            0x0F => NamedSByte,
            0x10 => UnnamedSByte,
            0x11 => NamedByte,
            0x12 => UnnamedByte,
            0x13 => NamedShort,
            0x14 => UnnamedShort,
            0x15 => NamedUShort,
            0x16 => UnnamedUShort,
            0x17 => NamedInt,
            0x18 => UnnamedInt,
            0x19 => NamedUInt,
            0x1A => UnnamedUInt,
            0x1B => NamedLong,
            0x1C => UnnamedLong,
            0x1D => NamedULong,
            0x1E => UnnamedULong,
            0x1F => NamedFloat,
            0x20 => UnnamedFloat,
            0x21 => NamedDouble,
            0x22 => UnnamedDouble,
            0x23 => NamedDecimal,
            0x24 => UnnamedDecimal,
            0x25 => NamedChar,
            0x26 => UnnamedChar,
            0x27 => NamedString,
            0x28 => UnnamedString,
            0x29 => NamedGuid,
            0x2A => UnnamedGuid,
            0x2B => NamedBoolean,
            0x2C => UnnamedBoolean,
            0x2D => NamedNull,
            0x2E => UnnamedNull,
            0x2F => TypeName,
            0x30 => TypeId,
            0x31 => EndOfStream,
            0x32 => NamedExternalReferenceByString,
            0x33 => UnnamedExternalReferenceByString,
            _ => return None,
        })
    }

    /// Whether this tag is followed on the wire by a length-prefixed name
    /// string before its payload.
    pub fn is_named(self) -> bool {
        use BinaryEntryType::*;
        matches!(
            self,
            NamedStartOfReferenceNode
            | NamedStartOfStructNode
            | NamedInternalReference
            | NamedExternalReferenceByIndex
            | NamedExternalReferenceByGuid
            | NamedExternalReferenceByString
            | NamedSByte | NamedByte
            | NamedShort | NamedUShort
            | NamedInt | NamedUInt
            | NamedLong | NamedULong
            | NamedFloat | NamedDouble | NamedDecimal
            | NamedChar | NamedString
            | NamedGuid
            | NamedBoolean
            | NamedNull,
        )
    }

    /// The semantic entry type this tag peeks as.
    ///
    /// `TypeName` and `TypeId` return `None`: type entries are consumed
    /// internally while resolving a node's type and never surface as a
    /// peekable entry. A reader that peeks one has hit stream corruption.
    pub fn entry_type(self) -> Option<EntryType> {
        use BinaryEntryType::*;
        Some(match self {
            Invalid => EntryType::Invalid,
            NamedStartOfReferenceNode
            | UnnamedStartOfReferenceNode
            | NamedStartOfStructNode
            | UnnamedStartOfStructNode => EntryType::StartOfNode,
            EndOfNode => EntryType::EndOfNode,
            StartOfArray => EntryType::StartOfArray,
            EndOfArray => EntryType::EndOfArray,
            PrimitiveArray => EntryType::PrimitiveArray,
            NamedInternalReference
            | UnnamedInternalReference => EntryType::InternalReference,
            NamedExternalReferenceByIndex
            | UnnamedExternalReferenceByIndex => EntryType::ExternalReferenceByIndex,
            NamedExternalReferenceByGuid
            | UnnamedExternalReferenceByGuid => EntryType::ExternalReferenceByGuid,
            NamedExternalReferenceByString
            | UnnamedExternalReferenceByString => EntryType::ExternalReferenceByString,
            NamedSByte | UnnamedSByte
            | NamedByte | UnnamedByte
            | NamedShort | UnnamedShort
            | NamedUShort | UnnamedUShort
            | NamedInt | UnnamedInt
            | NamedUInt | UnnamedUInt
            | NamedLong | UnnamedLong
            | NamedULong | UnnamedULong => EntryType::Integer,
            NamedFloat | UnnamedFloat
            | NamedDouble | UnnamedDouble
            | NamedDecimal | UnnamedDecimal => EntryType::FloatingPoint,
            NamedChar | UnnamedChar
            | NamedString | UnnamedString => EntryType::String,
            NamedGuid | UnnamedGuid => EntryType::Guid,
            NamedBoolean | UnnamedBoolean => EntryType::Boolean,
            NamedNull | UnnamedNull => EntryType::Null,
            EndOfStream => EntryType::EndOfStream,
            TypeName | TypeId => return None,
        })
    }
}


#[test]
fn test_tag_bytes_round_trip() {
    for b in 0..=0x33u8 {
        let tag = BinaryEntryType::from_byte(b).unwrap();
        assert_eq!(tag as u8, b);
    }
    assert!(BinaryEntryType::from_byte(0x34).is_none());
    assert!(BinaryEntryType::from_byte(0xFF).is_none());
}

#[test]
fn test_named_unnamed_pairing() {
    use BinaryEntryType::*;
    // each named/unnamed pair maps to the same entry type
    for (named, unnamed) in [
        (NamedStartOfReferenceNode, UnnamedStartOfReferenceNode),
        (NamedStartOfStructNode, UnnamedStartOfStructNode),
        (NamedInternalReference, UnnamedInternalReference),
        (NamedExternalReferenceByIndex, UnnamedExternalReferenceByIndex),
        (NamedExternalReferenceByGuid, UnnamedExternalReferenceByGuid),
        (NamedExternalReferenceByString, UnnamedExternalReferenceByString),
        (NamedSByte, UnnamedSByte),
        (NamedByte, UnnamedByte),
        (NamedShort, UnnamedShort),
        (NamedUShort, UnnamedUShort),
        (NamedInt, UnnamedInt),
        (NamedUInt, UnnamedUInt),
        (NamedLong, UnnamedLong),
        (NamedULong, UnnamedULong),
        (NamedFloat, UnnamedFloat),
        (NamedDouble, UnnamedDouble),
        (NamedDecimal, UnnamedDecimal),
        (NamedChar, UnnamedChar),
        (NamedString, UnnamedString),
        (NamedGuid, UnnamedGuid),
        (NamedBoolean, UnnamedBoolean),
        (NamedNull, UnnamedNull),
    ] {
        assert!(named.is_named());
        assert!(!unnamed.is_named());
        assert_eq!(named.entry_type(), unnamed.entry_type());
        assert!(named.entry_type().is_some());
    }
}

#[test]
fn test_type_entries_never_peekable() {
    assert!(BinaryEntryType::TypeName.entry_type().is_none());
    assert!(BinaryEntryType::TypeId.entry_type().is_none());
}
