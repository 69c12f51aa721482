//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::Display;

use serde::{de, ser};
use thiserror::Error;

use crate::document::ObjectFormat;

pub type Result<T> = std::result::Result<T, Error>;

/// Binary property list serialization and deserialization error.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// Constructed from serialization and deserialization errors.
    #[error("{0}")]
    Message(String),
    /// A value cannot be represented in the property list object model.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// An integer is outside of the 128-bit signed range the format can store.
    #[error("integer out of range: {0} exceeds 128 bits")]
    IntegerOutOfRange(String),
    /// The bplist magic number and version marker is missing or invalid.
    #[error("missing or invalid bplist header")]
    MissingOrInvalidHeader,
    /// The offset table used determine the location of objects in the object table is missing or invalid.
    #[error("missing or invalid bplist offset table")]
    MissingOrInvalidOffsetTable,
    /// The trailer with the metadata necessary to interpret the offset table and object table is missing or invalid.
    #[error("missing or invalid bplist trailer")]
    MissingOrInvalidTrailer,
    /// The version number in the header is not one of the versions supported by this library.
    #[error("document version {} is not 00 or 10", version_string(.0))]
    UnsupportedVersion((u8, u8)),
    /// Encountered a reference to an object not in the offset table.
    #[error("invalid reference to object {object} not in offset table")]
    InvalidObjectReference {
        /// The referenced object id.
        object: usize,
    },
    /// Encountered an offset to an object not in the object table.
    #[error("offset {offset} of object {object} is outside of the object table")]
    InvalidOffsetToObject {
        /// The object id being resolved.
        object: usize,
        /// The offending byte offset.
        offset: usize,
    },
    /// Encountered a marker byte for an object format not supported by this library.
    #[error("invalid or unsupported marker {marker:#04x} at offset {offset}")]
    InvalidOrUnsupportedObjectFormat {
        /// Byte offset of the marker.
        offset: usize,
        /// The marker byte.
        marker: u8,
    },
    /// The root object in the trailer is not in the offset table.
    #[error("invalid root object in document metadata")]
    InvalidRootObject,
    /// The object at the offset carried a valid marker but its payload could not be parsed.
    #[error("malformed {format:?} object at offset {offset}")]
    MalformedObject {
        /// Format announced by the marker byte.
        format: ObjectFormat,
        /// Byte offset of the marker.
        offset: usize,
    },
    /// A dictionary key decoded to something other than a string.
    #[error("dictionary key object {object} is not a string")]
    NonStringKey {
        /// The key object id.
        object: usize,
    },
    /// The same key appeared twice in one dictionary.
    #[error("duplicate dictionary key `{0}`")]
    DuplicateKey(String),
    /// Binary property lists are directed acyclic graphs and objects cannot reference each other.
    #[error("cycle detected at object {object}")]
    CycleDetected {
        /// The collection which was entered twice.
        object: usize,
    },
    /// Collections were nested more deeply than the configured limit.
    #[error("recursion limit of {limit} nested collections exceeded")]
    RecursionLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
    },
    /// Decoding produced more objects than the configured limit, typically
    /// because objects are referenced from many places.
    #[error("object limit of {limit} decoded objects exceeded")]
    ObjectLimitExceeded {
        /// The configured maximum number of objects.
        limit: usize,
    },
    /// Prematurely reached the end of the file.
    #[error("unexpected end of input")]
    Eof,
}

fn version_string(version: &(u8, u8)) -> String {
    [version.0, version.1].iter().map(|b| char::from(*b)).collect()
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
