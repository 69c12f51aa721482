//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The property list value model.
//!
//! Version 00 documents support the following object kinds:
//!
//! 1. Boolean.
//! 2. Integers, up to 128 bits long.
//! 3. Real, single- and double-precision.
//! 4. Data.
//! 5. Date.
//! 6. String.
//! 7. Uid.
//! 8. Array.
//! 9. Dictionary.
//!
//! Version 10 documents add Null, Url, Uuid, Set and OrderedSet.
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-1151.16/CFBinaryPList.c

mod date;
mod de;
mod ser;
mod uid;

pub use self::date::Date;
pub use self::de::from_value;
pub use self::ser::to_value;
pub use self::uid::Uid;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use std::iter::FromIterator;

/// A map of string keys to values roughly equivalent to an `NSDictionary<NSString, id>`.
///
/// Entries are written in insertion order. Equality ignores order.
pub type Dictionary = IndexMap<String, Value>;

/// A URL roughly equivalent to an `NSURL`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Url {
    /// The URL text.
    pub text: String,
    /// Whether the text begins with an explicit `scheme://`.
    pub has_scheme: bool,
}

impl Url {
    /// Creates a URL, detecting whether the text carries a scheme.
    pub fn new<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let has_scheme = has_scheme(&text);
        Url { text, has_scheme }
    }
}

/// Matches `\A\w+://`.
pub(crate) fn has_scheme(text: &str) -> bool {
    let scheme_length = text
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    scheme_length > 0 && text[scheme_length ..].starts_with("://")
}

/// A 16-byte universally unique identifier roughly equivalent to an `NSUUID`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Uuid(pub [u8; 16]);

/// An unordered collection roughly equivalent to an `NSSet`.
///
/// Two sets are equal when they contain the same elements the same number
/// of times, in any order.
#[derive(Clone, Default, Debug)]
pub struct Set {
    elements: Vec<Value>,
}

impl Set {
    /// Creates a set holding the given elements.
    pub fn new(elements: Vec<Value>) -> Self {
        Set { elements }
    }

    /// The number of elements in the set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates the elements in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Returns the elements in storage order.
    pub fn into_vec(self) -> Vec<Value> {
        self.elements
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Set) -> bool {
        if self.elements.len() != other.elements.len() {
            return false;
        }

        // Pair each element with a distinct equal element of the other set.
        let mut unmatched: Vec<&Value> = other.elements.iter().collect();
        self.elements.iter().all(|element| {
            match unmatched.iter().position(|candidate| *candidate == element) {
                Some(index) => {
                    unmatched.swap_remove(index);
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for Set {}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Set::new(iter.into_iter().collect())
    }
}

/// An ordered collection of unique elements roughly equivalent to an `NSOrderedSet`.
///
/// Duplicates are removed on construction and the first occurrence wins.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct OrderedSet {
    elements: Vec<Value>,
}

impl OrderedSet {
    /// Creates an ordered set from the elements, dropping repeated values.
    pub fn new(elements: Vec<Value>) -> Self {
        elements.into_iter().collect()
    }

    /// The number of unique elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Returns the elements in order.
    pub fn into_vec(self) -> Vec<Value> {
        self.elements
    }
}

impl FromIterator<Value> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut elements: Vec<Value> = Vec::new();
        for element in iter {
            if !elements.contains(&element) {
                elements.push(element);
            }
        }
        OrderedSet { elements }
    }
}

/// Represents any valid property list value.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Represents the null singleton, like `NSNull`.
    Null,

    /// Represents a boolean, like `NSNumber`.
    Boolean(bool),

    /// Represents an integral value of up to 128 bits, like `NSNumber`.
    Integer(i128),

    /// Represents a floating-point value, like `NSNumber`.
    ///
    /// Unlike normal `f64` values, these values have a defined order, implementing
    /// `Eq` in addition to `PartialEq`.
    Real(OrderedFloat<f64>),

    /// Represents a date, like `NSDate`.
    Date(Date),

    /// Represents a string, like `NSString`.
    String(String),

    /// Represents a data instance, like `NSData`.
    Data(Vec<u8>),

    /// Represents an array of values, like `NSArray<id>`.
    Array(Vec<Value>),

    /// Represents a dictionary with string keys, like `NSDictionary<NSString, id>`.
    ///
    /// Values decoded from a binary document have their entries ordered by key.
    Dictionary(Dictionary),

    /// Represents an unordered collection, like `NSSet<id>`.
    Set(Set),

    /// Represents an ordered collection of unique values, like `NSOrderedSet<id>`.
    OrderedSet(OrderedSet),

    /// Represents a keyed-archiver UID, an index into the `$objects` array.
    Uid(Uid),

    /// Represents a URL, like `NSURL`.
    Url(Url),

    /// Represents a UUID, like `NSUUID`.
    Uuid(Uuid),
}

impl Value {
    /// A short name for the kind of value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Date(_) => "date",
            Value::String(_) => "string",
            Value::Data(_) => "data",
            Value::Array(_) => "array",
            Value::Dictionary(_) => "dictionary",
            Value::Set(_) => "set",
            Value::OrderedSet(_) => "ordered set",
            Value::Uid(_) => "uid",
            Value::Url(_) => "url",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Returns the string if the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer if the value is an integer.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the array elements if the value is an array.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the dictionary if the value is a dictionary.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(value) => Some(value),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Value {
                Value::$variant(value.into())
            }
        }
    };
}

impl_from!(bool, Boolean);
impl_from!(i8, Integer);
impl_from!(i16, Integer);
impl_from!(i32, Integer);
impl_from!(i64, Integer);
impl_from!(i128, Integer);
impl_from!(u8, Integer);
impl_from!(u16, Integer);
impl_from!(u32, Integer);
impl_from!(u64, Integer);
impl_from!(f64, Real);
impl_from!(Date, Date);
impl_from!(String, String);
impl_from!(&str, String);
impl_from!(Vec<u8>, Data);
impl_from!(Vec<Value>, Array);
impl_from!(Dictionary, Dictionary);
impl_from!(Set, Set);
impl_from!(OrderedSet, OrderedSet);
impl_from!(Uid, Uid);
impl_from!(Url, Url);
impl_from!(Uuid, Uuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("http://foo.com"));
        assert!(has_scheme("x_1://"));
        assert!(!has_scheme("/foo.com"));
        assert!(!has_scheme("://foo.com"));
        assert!(!has_scheme("mailto:someone@example.com"));
        assert!(Url::new("file:///tmp").has_scheme);
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Set::new(vec![Value::from(3), Value::from("foo"), Value::from(3)]);
        let b = Set::new(vec![Value::from("foo"), Value::from(3), Value::from(3)]);
        let c = Set::new(vec![Value::from("foo"), Value::from("foo"), Value::from(3)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Set::new(vec![Value::from(3), Value::from("foo")]));
    }

    #[test]
    fn test_ordered_set_first_occurrence_wins() {
        let set = OrderedSet::new(vec![
            Value::from("b"),
            Value::from("a"),
            Value::from("b"),
            Value::from(1),
        ]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.into_vec(), vec![Value::from("b"), Value::from("a"), Value::from(1)]);
    }

    #[test]
    fn test_dictionary_equality_ignores_order() {
        let mut a = Dictionary::new();
        a.insert("x".to_owned(), Value::from(1));
        a.insert("y".to_owned(), Value::from(2));
        let mut b = Dictionary::new();
        b.insert("y".to_owned(), Value::from(2));
        b.insert("x".to_owned(), Value::from(1));
        assert_eq!(Value::Dictionary(a), Value::Dictionary(b));
    }
}
