//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist document format.
//!
//! Constants and structures defined in this module represent the various
//! sections of a binary property list document, and the table of marker
//! bytes used to tag each object in the object table.
//!
//! A bplist document is organized into four segments:
//!
//! 1. Header
//! 2. Object Table
//! 3. Offset Table
//! 4. Trailer
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-1151.16/CFBinaryPList.c

/// The number of bytes of data required to define a bplist header.
pub const HEADER_SIZE: usize = 8;

/// The bplist magic number ("bplist").
pub const HEADER_MAGIC_NUMBER: &[u8] = &[ 0x62, 0x70, 0x6C, 0x69, 0x73, 0x74 ];

/// The bplist version 00 identifier ("00").
pub const HEADER_VERSION_00: (u8, u8) = (0x30, 0x30);

/// The bplist version 10 identifier ("10"), required by the extended object kinds.
pub const HEADER_VERSION_10: (u8, u8) = (0x31, 0x30);

/// Seconds between the Unix epoch (1970-01-01T00:00:00Z) and the
/// Core Data epoch (2001-01-01T00:00:00Z) from which dates are measured.
pub const EPOCH_OFFSET: f64 = 978_307_200.0;

/// Binary property list header.
///
/// The header is composed of a magic number and a two-byte version marker
/// representing the major and minor version of the serialization format in
/// which the document is encoded.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct Header {
    /// The bplist version as as two 8-bit values.
    pub version: (u8, u8)
}

impl Header {
    /// Returns the 8-byte encoding of the header.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[.. HEADER_MAGIC_NUMBER.len()].copy_from_slice(HEADER_MAGIC_NUMBER);
        bytes[6] = self.version.0;
        bytes[7] = self.version.1;
        bytes
    }

    /// Whether this library is able to interpret documents of this version.
    pub fn is_supported(self) -> bool {
        self.version == HEADER_VERSION_00 || self.version == HEADER_VERSION_10
    }
}

/// Binary property list offset table.
///
/// The offset table is a mapping from element identifiers to byte offset from
/// the start of the file at which the object resides.
pub type OffsetTable = Vec<usize>;

/// Binary property list object wire format.
///
/// The format is self-describing. Each object consists of a marker byte
/// and zero or more bytes of additional data. The marker byte is comprised of
/// 'tag' bits, which specifes its format, and up to four bits of embedded value data.
///
/// # Notes
/// 1. All values are stored in network byte order (big endian).
/// 2. Null, Url, Uuid, Utf8String, OrderedSet and Set are only written in
///    version 10 documents.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ObjectFormat {
    /// The null singleton.
    Null,
    /// A 1-bit boolean literal value.
    Boolean,
    /// A URL followed by an inline string. The value bit is set when the URL has a scheme.
    Url,
    /// A 16-byte UUID.
    Uuid,
    /// A 'fill' byte, used for padding.
    Fill,
    /// An unsigned 8-bit integer.
    UInt8,
    /// An unsigned 16-bit integer.
    UInt16,
    /// An unsigned 32-bit integer.
    UInt32,
    /// A signed 64-bit integer.
    SInt64,
    /// A signed 128-bit integer.
    SInt128,
    /// A single-precision 32-bit floating point value.
    Float32,
    /// A double-precision 64-bit floating point value.
    Float64,
    /// A 64-bit double-precision CFAbsoluteTime value.
    Date,
    /// An arbitrary set of bytes.
    Data,
    /// A 7-bit ASCII string.
    AsciiString,
    /// A 16-bit UTF16 string.
    Utf16String,
    /// An 8-bit UTF8 string.
    Utf8String,
    /// A UID used by NSKeyedArchiver.
    Uid,
    /// An array.
    Array,
    /// An ordered set.
    OrderedSet,
    /// A set.
    Set,
    /// A dictionary.
    Dictionary,
}

impl ObjectFormat {

    /// Every format recognized in a marker byte.
    pub const ALL: [ObjectFormat; 22] = [
        ObjectFormat::Null,
        ObjectFormat::Boolean,
        ObjectFormat::Url,
        ObjectFormat::Uuid,
        ObjectFormat::Fill,
        ObjectFormat::UInt8,
        ObjectFormat::UInt16,
        ObjectFormat::UInt32,
        ObjectFormat::SInt64,
        ObjectFormat::SInt128,
        ObjectFormat::Float32,
        ObjectFormat::Float64,
        ObjectFormat::Date,
        ObjectFormat::Data,
        ObjectFormat::AsciiString,
        ObjectFormat::Utf16String,
        ObjectFormat::Utf8String,
        ObjectFormat::Uid,
        ObjectFormat::Array,
        ObjectFormat::OrderedSet,
        ObjectFormat::Set,
        ObjectFormat::Dictionary,
    ];

    /// Compute the bitwise AND of the marker byte and tag mask to obtain the its bits.
    pub fn tag_mask(self) -> u8 {
        use ObjectFormat::*;
        match self {
            Boolean | Url =>
                0b1111_1110,
            Null | Uuid | Fill | UInt8 | UInt16 | UInt32 | SInt64 | SInt128 | Float32 | Float64 | Date =>
                0b1111_1111,
            Data | AsciiString | Utf16String | Utf8String | Uid | Array | OrderedSet | Set | Dictionary =>
                0b1111_0000,
        }
    }

    /// Compute the bitwise AND of the marker byte and the value mask to obtain its value bits.
    pub fn value_mask(self) -> u8 {
        use ObjectFormat::*;
        match self {
            Boolean | Url =>
                0b0000_0001,
            Null | Uuid | Fill | UInt8 | UInt16 | UInt32 | SInt64 | SInt128 | Float32 | Float64 | Date =>
                0b0000_0000,
            Data | AsciiString | Utf16String | Utf8String | Uid | Array | OrderedSet | Set | Dictionary =>
                0b0000_1111,
        }
    }

    /// Uniquely identifies the object format when compared to the tag bits of a marker byte.
    pub fn tag_bits(self) -> u8 {
        use ObjectFormat::*;
        match self {
            Null =>
                0b0000_0000,
            Boolean =>
                0b0000_1000,
            Url =>
                0b0000_1100,
            Uuid =>
                0b0000_1110,
            Fill =>
                0b0000_1111,
            UInt8 =>
                0b0001_0000,
            UInt16 =>
                0b0001_0001,
            UInt32 =>
                0b0001_0010,
            SInt64 =>
                0b0001_0011,
            SInt128 =>
                0b0001_0100,
            Float32 =>
                0b0010_0010,
            Float64 =>
                0b0010_0011,
            Date =>
                0b0011_0011,
            Data =>
                0b0100_0000,
            AsciiString =>
                0b0101_0000,
            Utf16String =>
                0b0110_0000,
            Utf8String =>
                0b0111_0000,
            Uid =>
                0b1000_0000,
            Array =>
                0b1010_0000,
            OrderedSet =>
                0b1011_0000,
            Set =>
                0b1100_0000,
            Dictionary =>
                0b1101_0000,
        }
    }

    /// Whether this marker byte is tagged with the receiver's format.
    pub fn matches(self, marker: u8) -> bool {
        (marker & self.tag_mask()) == self.tag_bits()
    }

    /// Identifies the format of a marker byte, returning it along with the embedded value bits.
    pub fn from_marker(marker: u8) -> Option<(ObjectFormat, u8)> {
        ObjectFormat::ALL
            .iter()
            .find(|format| format.matches(marker))
            .map(|format| (*format, marker & format.value_mask()))
    }

    /// The integer format storing a value in the given number of bytes.
    pub fn integer_of_width(width: usize) -> Option<ObjectFormat> {
        match width {
            1 => Some(ObjectFormat::UInt8),
            2 => Some(ObjectFormat::UInt16),
            4 => Some(ObjectFormat::UInt32),
            8 => Some(ObjectFormat::SInt64),
            16 => Some(ObjectFormat::SInt128),
            _ => None,
        }
    }

}

/// The number of bytes of data required to define a bplist trailer.
pub const TRAILER_SIZE: usize = 32;

/// The number of unused bytes in the trailer preamble.
pub const TRAILER_PREAMBLE_UNUSED_SIZE: usize = 5;

/// Binary property list trailer.
///
/// The trailer contains information necessary to interpret the preceding
/// document, particularly the size of variably-sized offsets and references.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub struct Trailer {
    /// The sort version.
    pub sort_version: u8,
    /// Number of bytes needed for each offset table entry.
    pub offset_table_entry_size: usize,
    /// Number of bytes needed for each object reference in a container.
    pub object_reference_size: usize,
    /// Number of objects encoded in the document.
    pub number_of_objects: usize,
    /// Element id of the root object.
    pub root_object: usize,
    /// Offset into the file denoting the start of the offset table.
    pub offset_table_offset: usize,
}

impl Trailer {
    /// Returns the 32-byte encoding of the trailer.
    pub fn to_bytes(&self) -> [u8; TRAILER_SIZE] {
        let mut bytes = [0u8; TRAILER_SIZE];
        bytes[TRAILER_PREAMBLE_UNUSED_SIZE] = self.sort_version;
        bytes[6] = self.offset_table_entry_size as u8;
        bytes[7] = self.object_reference_size as u8;
        bytes[8 .. 16].copy_from_slice(&(self.number_of_objects as u64).to_be_bytes());
        bytes[16 .. 24].copy_from_slice(&(self.root_object as u64).to_be_bytes());
        bytes[24 .. 32].copy_from_slice(&(self.offset_table_offset as u64).to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_formats_do_not_overlap() {
        for marker in 0 ..= 255u8 {
            let matching = ObjectFormat::ALL
                .iter()
                .filter(|format| format.matches(marker))
                .count();
            assert!(matching <= 1, "marker {:#04x} matches {} formats", marker, matching);
        }
    }

    #[test]
    fn test_from_marker() {
        assert_eq!(ObjectFormat::from_marker(0x00), Some((ObjectFormat::Null, 0)));
        assert_eq!(ObjectFormat::from_marker(0x09), Some((ObjectFormat::Boolean, 1)));
        assert_eq!(ObjectFormat::from_marker(0x0C), Some((ObjectFormat::Url, 0)));
        assert_eq!(ObjectFormat::from_marker(0x0D), Some((ObjectFormat::Url, 1)));
        assert_eq!(ObjectFormat::from_marker(0x0E), Some((ObjectFormat::Uuid, 0)));
        assert_eq!(ObjectFormat::from_marker(0x14), Some((ObjectFormat::SInt128, 0)));
        assert_eq!(ObjectFormat::from_marker(0x33), Some((ObjectFormat::Date, 0)));
        assert_eq!(ObjectFormat::from_marker(0x7F), Some((ObjectFormat::Utf8String, 0x0F)));
        assert_eq!(ObjectFormat::from_marker(0xB3), Some((ObjectFormat::OrderedSet, 3)));
        assert_eq!(ObjectFormat::from_marker(0xC0), Some((ObjectFormat::Set, 0)));
        assert_eq!(ObjectFormat::from_marker(0x15), None);
        assert_eq!(ObjectFormat::from_marker(0x90), None);
        assert_eq!(ObjectFormat::from_marker(0xE0), None);
    }

    #[test]
    fn test_header_bytes() {
        let header = Header { version: HEADER_VERSION_10 };
        assert_eq!(&header.to_bytes(), b"bplist10");
        assert!(header.is_supported());
        assert!(!Header { version: (0x31, 0x35) }.is_supported());
    }

    #[test]
    fn test_trailer_bytes() {
        let trailer = Trailer {
            sort_version: 0,
            offset_table_entry_size: 1,
            object_reference_size: 2,
            number_of_objects: 3,
            root_object: 0,
            offset_table_offset: 0x1234,
        };
        assert_eq!(&trailer.to_bytes()[..], &[
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x02,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x12, 0x34,
        ][..]);
    }
}
