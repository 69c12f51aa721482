//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ascii::AsciiStr;

use std::convert::TryFrom;

use crate::document::ObjectFormat;
use crate::error::{Error, Result};
use crate::ser::flatten::FlatObject;
use crate::value::{self, Value};

/// Returns the number of bytes needed to store an integer.
///
/// # Notes
///
/// 1. Non-negative values take 1, 2, 4, 8 or 16 bytes.
/// 2. 1, 2 and 4-byte integers are read back as unsigned, so negative values
///    always take 8 or 16 bytes.
pub fn min_byte_width(value: i128) -> usize {
    if value < 0 {
        // |value| - 1, which cannot overflow for i128::MIN.
        let magnitude = -(value + 1);
        if magnitude <= i128::from(i64::max_value()) { 8 } else { 16 }
    } else if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else if value <= 0xFFFF_FFFF {
        4
    } else if value <= i128::from(i64::max_value()) {
        8
    } else {
        16
    }
}

/// Accumulates the encoded objects of a document.
#[derive(Debug)]
pub struct ObjectWriter {
    output: Vec<u8>,
    object_reference_size: usize,
}

impl ObjectWriter {
    pub fn new(object_reference_size: usize) -> Self {
        ObjectWriter {
            output: Vec::new(),
            object_reference_size,
        }
    }

    /// The number of bytes written so far, which is the offset of the next object.
    pub fn position(&self) -> usize {
        self.output.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.output
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    /// Writes the low `width` bytes of the two's complement value, big-endian.
    pub fn write_sized(&mut self, value: i128, width: usize) {
        let bytes = value.to_be_bytes();
        self.output.extend_from_slice(&bytes[bytes.len() - width .. ]);
    }

    /// Writes the object at the current position.
    pub fn write_object(&mut self, object: &FlatObject<'_>) -> Result<()> {
        match object {
            FlatObject::Scalar(value) => self.write_scalar(value)?,
            FlatObject::Key(key) => self.write_string(key),
            FlatObject::Collection { format, count, references } => {
                self.write_marker(*format, *count);
                for reference in references {
                    self.write_sized(*reference as i128, self.object_reference_size);
                }
            }
        }
        Ok(())
    }

    fn write_scalar(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null =>
                self.write_bytes(&[ObjectFormat::Null.tag_bits()]),
            Value::Boolean(value) =>
                self.write_bytes(&[ObjectFormat::Boolean.tag_bits() | *value as u8]),
            Value::Integer(value) =>
                self.write_integer(*value),
            Value::Real(value) => {
                self.write_bytes(&[ObjectFormat::Float64.tag_bits()]);
                self.write_bytes(&value.to_bits().to_be_bytes());
            }
            Value::Date(date) => {
                self.write_bytes(&[ObjectFormat::Date.tag_bits()]);
                self.write_bytes(&date.absolute_time.to_bits().to_be_bytes());
            }
            Value::String(text) =>
                self.write_string(text),
            Value::Data(data) => {
                self.write_marker(ObjectFormat::Data, data.len());
                self.write_bytes(data);
            }
            Value::Uid(uid) => {
                let value = i128::try_from(uid.0)
                    .map_err(|_| Error::IntegerOutOfRange(uid.0.to_string()))?;
                let width = min_byte_width(value);
                self.write_bytes(&[ObjectFormat::Uid.tag_bits() | (width - 1) as u8]);
                self.write_sized(value, width);
            }
            Value::Url(url) => {
                let has_scheme = value::has_scheme(&url.text);
                self.write_bytes(&[ObjectFormat::Url.tag_bits() | has_scheme as u8]);
                self.write_string(&url.text);
            }
            Value::Uuid(uuid) => {
                self.write_bytes(&[ObjectFormat::Uuid.tag_bits()]);
                self.write_bytes(&uuid.0);
            }
            Value::Array(_) | Value::Dictionary(_) | Value::Set(_) | Value::OrderedSet(_) =>
                return Err(Error::UnsupportedType(format!("{} written as a scalar", value.kind()))),
        }
        Ok(())
    }

    /// Writes an integer object in the narrowest width which reads back as the same value.
    fn write_integer(&mut self, value: i128) {
        let width = min_byte_width(value);
        let tag = ObjectFormat::integer_of_width(width)
            .map(|format| format.tag_bits())
            .unwrap_or_else(|| ObjectFormat::SInt128.tag_bits());
        self.write_bytes(&[tag]);
        self.write_sized(value, width);
    }

    /// Writes a marker carrying a size, either inline or followed by an integer object.
    fn write_marker(&mut self, format: ObjectFormat, size: usize) {
        if size < 0b0000_1111 {
            self.write_bytes(&[format.tag_bits() | size as u8]);
        } else {
            self.write_bytes(&[format.tag_bits() | 0b0000_1111]);
            self.write_integer(size as i128);
        }
    }

    /// Writes a string as ASCII if possible, otherwise as UTF-16.
    fn write_string(&mut self, text: &str) {
        match AsciiStr::from_ascii(text) {
            Ok(ascii) => {
                self.write_marker(ObjectFormat::AsciiString, ascii.len());
                self.write_bytes(ascii.as_bytes());
            }
            Err(_) => {
                let code_units = text.encode_utf16().collect::<Vec<u16>>();
                self.write_marker(ObjectFormat::Utf16String, code_units.len());
                for code_unit in code_units {
                    self.write_bytes(&code_unit.to_be_bytes());
                }
            }
        }
    }
}
