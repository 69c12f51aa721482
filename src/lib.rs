//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Reading and writing binary property lists.
//!
//! ```
//! use property_list::{decode, encode, Dictionary, Value};
//!
//! let mut point = Dictionary::new();
//! point.insert(String::from("x"), Value::from(1));
//! point.insert(String::from("y"), Value::from(20));
//!
//! let document = encode(&Value::Dictionary(point.clone())).unwrap();
//! assert_eq!(&document[.. 8], b"bplist00");
//! assert_eq!(decode(&document), Ok(Value::Dictionary(point)));
//! ```

mod de;
mod document;
mod error;
mod format;
mod options;
mod ser;

pub mod value;

pub use de::{decode, from_slice, Decoder};
pub use document::{ObjectFormat, EPOCH_OFFSET};
pub use error::{Error, Result};
pub use format::Format;
pub use options::{Options, DEFAULT_MAX_DEPTH, DEFAULT_OBJECTS_PER_BYTE};
pub use ser::{encode, to_vec, Encoder};
pub use value::{
    from_value,
    to_value,
    Date,
    Dictionary,
    OrderedSet,
    Set,
    Uid,
    Url,
    Uuid,
    Value,
};
