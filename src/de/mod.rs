//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Decoding of binary property list documents into the value model.

mod parser;

use log::{debug, trace};
use ordered_float::OrderedFloat;
use serde::de::DeserializeOwned;

use std::ops::Range;

use crate::document::{
    HEADER_SIZE,
    TRAILER_SIZE,
    OffsetTable,
    ObjectFormat,
};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::value::{self, Date, Dictionary, Set, Uid, Url, Uuid, Value};

#[derive(Clone, Eq, PartialEq, Debug)]
struct Metadata {
    /// The table of offsets from the start of the input to the location of a given object.
    offset_table: OffsetTable,
    /// The byte length of an object reference.
    object_reference_size: usize,
    /// The index of the root object to decode.
    root_object: usize,
    /// The range of bytes of the input where objects may reside.
    object_table_range: Range<usize>,
}

impl Metadata {
    /// Utilizes the offset table to compute the offset of the given object.
    fn offset_of(&self, object: usize) -> Result<usize> {
        self.offset_table
            .get(object)
            .copied()
            .ok_or(Error::InvalidObjectReference { object })
    }
}

/// Parses the metadata necessary to interpret the contents of the document.
///
/// # Notes
///
/// The smallest possible document consists of:
///   1. A fixed-sized header.
///   2. An object table with a single one-byte entry such as a zero-length array.
///   3. An offset table with a single one-byte entry for the root object.
///   4. A fixed-sized trailer.
fn parse_metadata(input: &[u8]) -> Result<Metadata> {
    if input.len() < HEADER_SIZE + 2 + TRAILER_SIZE {
        return Err(Error::Eof);
    }

    // Parse the header and verify both the magic number and the version marker.
    let header_slice = &input[0 .. HEADER_SIZE];
    let (_, header) = parser::document::header(header_slice).map_err(|_| {
        Error::MissingOrInvalidHeader
    })?;
    if !header.is_supported() {
        return Err(Error::UnsupportedVersion(header.version));
    }

    // Parse the trailer from the end of the input and sanity check the fields.
    let trailer_start = input.len() - TRAILER_SIZE;
    let (_, trailer) = parser::document::trailer(&input[trailer_start .. ]).map_err(|_| {
        Error::MissingOrInvalidTrailer
    })?;
    if trailer.root_object >= trailer.number_of_objects {
        return Err(Error::InvalidRootObject);
    }

    // Compute the location and length of the offset table.
    // The offset table must follow the header and must not overlap the trailer.
    let offset_table_start = trailer.offset_table_offset;
    let offset_table_end = trailer.number_of_objects
        .checked_mul(trailer.offset_table_entry_size)
        .and_then(|length| length.checked_add(offset_table_start))
        .ok_or(Error::MissingOrInvalidOffsetTable)?;
    if offset_table_start < HEADER_SIZE || offset_table_end > trailer_start {
        return Err(Error::MissingOrInvalidOffsetTable);
    }

    // Parse the offset table.
    let offset_table_slice = &input[offset_table_start .. offset_table_end];
    let (_, offset_table) = parser::document::offset_table(
        trailer.number_of_objects,
        trailer.offset_table_entry_size
    )(offset_table_slice).map_err(|_| {
        Error::MissingOrInvalidOffsetTable
    })?;

    debug!(
        "bplist{}{}: {} objects, {}-byte offsets, {}-byte references, root object {}",
        char::from(header.version.0),
        char::from(header.version.1),
        trailer.number_of_objects,
        trailer.offset_table_entry_size,
        trailer.object_reference_size,
        trailer.root_object,
    );

    Ok(Metadata {
        offset_table,
        object_reference_size: trailer.object_reference_size,
        root_object: trailer.root_object,
        object_table_range: (HEADER_SIZE .. offset_table_start)
    })
}

/// Provides access to objects within the object table.
#[derive(Debug)]
struct ObjectTable<'a> {
    input: &'a [u8],
    metadata: Metadata,
}

/// Defines a basic parser over the object at an offset, mapping failures to
/// a malformed object error.
macro_rules! define_parser {
    ($name:ident, $parser:expr, $type:ty) => {
        fn $name(&self, offset: usize) -> Result<$type> {
            $parser(self.data_at(offset))
                .map(|(_, value)| value)
                .map_err(|_| self.malformed(offset))
        }
    };
}

impl<'a> ObjectTable<'a> {

    /// Returns the offset of the object, past any fill bytes preceding it.
    fn offset_of(&self, object: usize) -> Result<usize> {
        let start = self.metadata.offset_of(object)?;
        let range = &self.metadata.object_table_range;

        let mut offset = start;
        while range.contains(&offset) && parser::object::fill(self.data_at(offset)).is_ok() {
            offset += 1;
        }

        // Make sure the offset is to a point within the object table.
        if range.contains(&offset) {
            Ok(offset)
        } else {
            Err(Error::InvalidOffsetToObject { object, offset: start })
        }
    }

    /// Returns the slice of the object table starting at the offset.
    fn data_at(&self, offset: usize) -> &'a [u8] {
        self.input
            .get(offset .. self.metadata.object_table_range.end)
            .unwrap_or(&[])
    }

    /// Parses the marker byte at the offset and returns the format.
    fn kind_at(&self, offset: usize) -> Result<ObjectFormat> {
        parser::object::any_marker(self.data_at(offset))
            .map(|(_, (format, _))| format)
            .map_err(|_| self.unrecognized(offset))
    }

    /// Error for a marker byte which does not name any object format.
    fn unrecognized(&self, offset: usize) -> Error {
        Error::InvalidOrUnsupportedObjectFormat {
            offset,
            marker: self.input.get(offset).copied().unwrap_or_default(),
        }
    }

    /// Error for an object whose payload does not match its marker.
    fn malformed(&self, offset: usize) -> Error {
        match self.kind_at(offset) {
            Ok(format) => Error::MalformedObject { format, offset },
            Err(error) => error,
        }
    }

    define_parser![
        parse_null,
        parser::object::null,
        ()
    ];
    define_parser![
        parse_boolean,
        parser::object::boolean,
        bool
    ];
    define_parser![
        parse_integer,
        parser::object::integer,
        i128
    ];
    define_parser![
        parse_real,
        parser::object::real,
        f64
    ];
    define_parser![
        parse_date,
        parser::object::date,
        f64
    ];
    define_parser![
        parse_data,
        parser::object::data,
        &'a [u8]
    ];
    define_parser![
        parse_string,
        parser::object::any_string,
        String
    ];
    define_parser![
        parse_uid,
        parser::object::uid,
        u128
    ];
    define_parser![
        parse_url,
        parser::object::url,
        (bool, String)
    ];
    define_parser![
        parse_uuid,
        parser::object::uuid,
        [u8; 16]
    ];

    /// Parses an array, ordered set or set whose reference size is determined in metadata.
    fn parse_references(&self, offset: usize, format: ObjectFormat) -> Result<Vec<usize>> {
        let reference_size = self.metadata.object_reference_size;
        let result = match format {
            ObjectFormat::OrderedSet => parser::object::ordered_set(reference_size)(self.data_at(offset)),
            ObjectFormat::Set => parser::object::set(reference_size)(self.data_at(offset)),
            _ => parser::object::array(reference_size)(self.data_at(offset)),
        };
        result
            .map(|(_, objects)| objects)
            .map_err(|_| self.malformed(offset))
    }

    /// Parses a dictionary whose reference size is determined in metadata.
    fn parse_dictionary(&self, offset: usize) -> Result<Vec<(usize, usize)>> {
        parser::object::dictionary(self.metadata.object_reference_size)(self.data_at(offset))
            .map(|(_, pairs)| pairs)
            .map_err(|_| self.malformed(offset))
    }

}

/// Decodes a binary property list document with the default options.
pub fn decode(input: &[u8]) -> Result<Value> {
    Decoder::new().decode(input)
}

/// Support for deserializing any supported type from a binary property list document.
pub fn from_slice<T>(input: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    value::from_value(decode(input)?)
}

/// Decodes binary property list documents into values.
#[derive(Copy, Clone, Default, Debug)]
pub struct Decoder {
    options: Options,
}

impl Decoder {
    /// Returns a decoder with the default options.
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Returns a decoder with the given options.
    pub fn with_options(options: Options) -> Self {
        Decoder { options }
    }

    /// Decodes the complete document in the input, starting from the root object.
    pub fn decode(&self, input: &[u8]) -> Result<Value> {
        let metadata = parse_metadata(input)?;
        let root_object = metadata.root_object;
        let mut decoder = ObjectDecoder {
            object_table: ObjectTable { input, metadata },
            max_depth: self.options.max_depth,
            object_limit: self.options.object_limit(input.len()),
            objects_decoded: 0,
            collection_stack: Vec::new(),
        };
        decoder.decode_object(root_object)
    }
}

/// Recursively decodes objects from an object table.
struct ObjectDecoder<'a> {
    object_table: ObjectTable<'a>,
    max_depth: usize,
    object_limit: usize,
    /// Every object produced so far, including repeated visits to shared objects.
    objects_decoded: usize,
    /// The collections being decoded, outermost first, to detect cycles.
    collection_stack: Vec<usize>,
}

impl<'a> ObjectDecoder<'a> {

    /// Pushes an object onto the collection stack to ensure no cycles can occur.
    #[must_use = "the result must be checked to avoid creating a cycle"]
    fn enter_collection(&mut self, object: usize) -> Result<()> {
        if self.collection_stack.contains(&object) {
            Err(Error::CycleDetected { object })
        } else if self.collection_stack.len() >= self.max_depth {
            Err(Error::RecursionLimitExceeded { limit: self.max_depth })
        } else {
            self.collection_stack.push(object);
            Ok(())
        }
    }

    /// Pops the most recently entered collection from the stack.
    fn exit_collection(&mut self) {
        let exited = self.collection_stack.pop();
        debug_assert!(exited.is_some(), "unbalanced calls in object stack tracking");
    }

    fn decode_object(&mut self, object: usize) -> Result<Value> {
        if self.objects_decoded >= self.object_limit {
            return Err(Error::ObjectLimitExceeded { limit: self.object_limit });
        }
        self.objects_decoded += 1;

        let offset = self.object_table.offset_of(object)?;
        let format = self.object_table.kind_at(offset)?;
        trace!("object {} at offset {} is {:?}", object, offset, format);

        let table = &self.object_table;
        let value = match format {
            ObjectFormat::Null => {
                table.parse_null(offset)?;
                Value::Null
            }
            ObjectFormat::Boolean =>
                Value::Boolean(table.parse_boolean(offset)?),
            ObjectFormat::UInt8
            | ObjectFormat::UInt16
            | ObjectFormat::UInt32
            | ObjectFormat::SInt64
            | ObjectFormat::SInt128 =>
                Value::Integer(table.parse_integer(offset)?),
            ObjectFormat::Float32 | ObjectFormat::Float64 =>
                Value::Real(OrderedFloat(table.parse_real(offset)?)),
            ObjectFormat::Date =>
                Value::Date(Date::from_absolute_time(table.parse_date(offset)?)),
            ObjectFormat::Data =>
                Value::Data(table.parse_data(offset)?.to_vec()),
            ObjectFormat::AsciiString
            | ObjectFormat::Utf16String
            | ObjectFormat::Utf8String =>
                Value::String(table.parse_string(offset)?),
            ObjectFormat::Uid =>
                Value::Uid(Uid(table.parse_uid(offset)?)),
            ObjectFormat::Url => {
                let (has_scheme, text) = table.parse_url(offset)?;
                Value::Url(Url { text, has_scheme })
            }
            ObjectFormat::Uuid =>
                Value::Uuid(Uuid(table.parse_uuid(offset)?)),

            // Fill bytes are skipped when resolving the offset.
            ObjectFormat::Fill =>
                return Err(table.malformed(offset)),

            ObjectFormat::Array => {
                let objects = table.parse_references(offset, format)?;
                Value::Array(self.decode_collection(object, objects)?)
            }
            ObjectFormat::OrderedSet => {
                let objects = table.parse_references(offset, format)?;
                Value::OrderedSet(self.decode_collection(object, objects)?.into_iter().collect())
            }
            ObjectFormat::Set => {
                let objects = table.parse_references(offset, format)?;
                Value::Set(Set::new(self.decode_collection(object, objects)?))
            }
            ObjectFormat::Dictionary => {
                let pairs = table.parse_dictionary(offset)?;
                Value::Dictionary(self.decode_dictionary(object, pairs)?)
            }
        };

        Ok(value)
    }

    /// Decodes the elements of an array or set in reference order.
    fn decode_collection(&mut self, object: usize, objects: Vec<usize>) -> Result<Vec<Value>> {
        self.enter_collection(object)?;
        let result = objects
            .into_iter()
            .map(|element| self.decode_object(element))
            .collect::<Result<Vec<Value>>>();
        self.exit_collection();
        result
    }

    /// Decodes the entries of a dictionary, ordered by key.
    fn decode_dictionary(&mut self, object: usize, pairs: Vec<(usize, usize)>) -> Result<Dictionary> {
        self.enter_collection(object)?;
        let result = self.decode_entries(pairs);
        self.exit_collection();

        let mut entries = result?;
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut dictionary = Dictionary::with_capacity(entries.len());
        for (key, value) in entries {
            if dictionary.contains_key(&key) {
                return Err(Error::DuplicateKey(key));
            }
            dictionary.insert(key, value);
        }
        Ok(dictionary)
    }

    fn decode_entries(&mut self, pairs: Vec<(usize, usize)>) -> Result<Vec<(String, Value)>> {
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = match self.decode_object(key)? {
                Value::String(key) => key,
                _ => return Err(Error::NonStringKey { object: key }),
            };
            entries.push((key, self.decode_object(value)?));
        }
        Ok(entries)
    }

}
