//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Encoding of values as binary property list documents.
//!
//! A document is written in a single forward pass after the value tree has been
//! flattened into the object table. The header version is only known once every
//! object has been visited, so the header is written as version 00 and patched
//! at the very end.

mod flatten;
mod writer;

use log::debug;
use serde::Serialize;

use crate::document::{
    Header,
    Trailer,
    HEADER_SIZE,
    HEADER_VERSION_00,
    HEADER_VERSION_10,
};
use crate::error::Result;
use crate::options::Options;
use crate::value::{self, Value};

use self::writer::{min_byte_width, ObjectWriter};

/// Encodes a value as a binary property list document with the default options.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Encoder::new().encode(value)
}

/// Serializes any supported type as a binary property list document.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    encode(&value::to_value(value)?)
}

/// Encodes values as binary property list documents.
#[derive(Copy, Clone, Default, Debug)]
pub struct Encoder {
    options: Options,
}

impl Encoder {
    /// Returns an encoder with the default options.
    pub fn new() -> Self {
        Encoder::default()
    }

    /// Returns an encoder with the given options.
    pub fn with_options(options: Options) -> Self {
        Encoder { options }
    }

    /// Encodes the value as the root object of a new document.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let flattened = flatten::flatten(value, self.options.max_depth)?;
        let number_of_objects = flattened.objects.len();
        let object_reference_size = min_byte_width(number_of_objects as i128 - 1);

        // Write the objects, recording where each one starts.
        let mut writer = ObjectWriter::new(object_reference_size);
        writer.write_bytes(&Header { version: HEADER_VERSION_00 }.to_bytes());
        let mut offset_table = Vec::with_capacity(number_of_objects);
        for object in &flattened.objects {
            offset_table.push(writer.position());
            writer.write_object(object)?;
        }

        // Write the offset table in object order.
        let offset_table_offset = writer.position();
        let offset_table_entry_size = min_byte_width(offset_table_offset as i128);
        for offset in offset_table {
            writer.write_sized(offset as i128, offset_table_entry_size);
        }

        let trailer = Trailer {
            sort_version: 0,
            offset_table_entry_size,
            object_reference_size,
            number_of_objects,
            root_object: 0,
            offset_table_offset,
        };
        writer.write_bytes(&trailer.to_bytes());

        let header = Header {
            version: if flattened.extended { HEADER_VERSION_10 } else { HEADER_VERSION_00 },
        };
        let mut output = writer.into_inner();
        output[.. HEADER_SIZE].copy_from_slice(&header.to_bytes());

        debug!(
            "wrote bplist{}{}: {} objects, {}-byte offsets, {}-byte references, {} bytes",
            char::from(header.version.0),
            char::from(header.version.1),
            number_of_objects,
            offset_table_entry_size,
            object_reference_size,
            output.len(),
        );

        Ok(output)
    }
}
