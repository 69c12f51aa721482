//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ordered_float::OrderedFloat;
use serde::ser::{
    self,
    Impossible,
    Serialize,
    SerializeMap,
    SerializeSeq,
};

use std::convert::TryFrom;

use super::{date, uid, Date, Dictionary, Uid, Value};
use crate::error::{Error, Result};

/// Converts any serializable type into a property list value.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer)
}

/// Serialization of property list values into any serde format.
///
/// Sets and ordered sets are written as sequences, URLs as strings and UUIDs
/// as bytes. Dates and UIDs use reserved pseudo-structures.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            Value::Null =>
                serializer.serialize_unit(),
            Value::Boolean(value) =>
                serializer.serialize_bool(*value),
            Value::Integer(value) => match i64::try_from(*value) {
                Ok(value) => serializer.serialize_i64(value),
                Err(_) => serializer.serialize_i128(*value),
            },
            Value::Real(value) =>
                serializer.serialize_f64(value.into_inner()),
            Value::Date(date) =>
                date.serialize(serializer),
            Value::String(value) =>
                serializer.serialize_str(value),
            Value::Data(value) =>
                serializer.serialize_bytes(value),
            Value::Array(elements) =>
                serializer.collect_seq(elements),
            Value::Dictionary(dictionary) =>
                serializer.collect_map(dictionary),
            Value::Set(set) =>
                serializer.collect_seq(set.iter()),
            Value::OrderedSet(set) =>
                serializer.collect_seq(set.iter()),
            Value::Uid(uid) =>
                uid.serialize(serializer),
            Value::Url(url) =>
                serializer.serialize_str(&url.text),
            Value::Uuid(uuid) =>
                serializer.serialize_bytes(&uuid.0),
        }
    }
}

/// Serializer whose output is a property list value.
///
/// Enums are externally tagged: unit variants become strings and all other
/// variants single-entry dictionaries keyed by the variant name.
pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeArray;
    type SerializeTuple = SerializeArray;
    type SerializeTupleStruct = SerializeArray;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeDictionary;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        i128::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::IntegerOutOfRange(v.to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Real(OrderedFloat(v.into())))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Real(OrderedFloat(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Data(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        let mut dictionary = Dictionary::with_capacity(1);
        dictionary.insert(variant.to_owned(), to_value(value)?);
        Ok(Value::Dictionary(dictionary))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeArray> {
        Ok(SerializeArray {
            elements: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeArray> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeArray> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            elements: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeDictionary> {
        Ok(SerializeDictionary {
            dictionary: Dictionary::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeStruct> {
        Ok(SerializeStruct {
            name,
            dictionary: Dictionary::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            dictionary: Dictionary::with_capacity(len),
        })
    }
}

/// Collects the elements of sequences and tuples.
pub struct SerializeArray {
    elements: Vec<Value>,
}

impl SerializeSeq for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.elements.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.elements))
    }
}

impl ser::SerializeTuple for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        SerializeSeq::end(self)
    }
}

/// Collects the elements of a tuple variant.
pub struct SerializeTupleVariant {
    variant: &'static str,
    elements: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.elements.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut dictionary = Dictionary::with_capacity(1);
        dictionary.insert(self.variant.to_owned(), Value::Array(self.elements));
        Ok(Value::Dictionary(dictionary))
    }
}

/// Collects the entries of a map. Keys must serialize as strings.
pub struct SerializeDictionary {
    dictionary: Dictionary,
    next_key: Option<String>,
}

impl SerializeMap for SerializeDictionary {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.next_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        match self.next_key.take() {
            Some(key) => {
                self.dictionary.insert(key, to_value(value)?);
                Ok(())
            }
            None => Err(ser::Error::custom("serialize_value called before serialize_key")),
        }
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Dictionary(self.dictionary))
    }
}

/// Collects the fields of a structure.
///
/// The reserved Date and UID structures are converted back into their values.
pub struct SerializeStruct {
    name: &'static str,
    dictionary: Dictionary,
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.dictionary.insert(key.to_owned(), to_value(value)?);
        Ok(())
    }

    fn end(mut self) -> Result<Value> {
        if self.name == date::STRUCT_NAME {
            match self.dictionary.swap_remove(date::STRUCT_FIELD) {
                Some(Value::Real(absolute_time)) =>
                    Ok(Value::Date(Date { absolute_time })),
                _ =>
                    Err(ser::Error::custom("malformed date structure")),
            }
        } else if self.name == uid::STRUCT_NAME {
            match self.dictionary.swap_remove(uid::STRUCT_FIELD) {
                Some(Value::Integer(value)) if value >= 0 =>
                    Ok(Value::Uid(Uid(value as u128))),
                _ =>
                    Err(ser::Error::custom("malformed uid structure")),
            }
        } else {
            Ok(Value::Dictionary(self.dictionary))
        }
    }
}

/// Collects the fields of a struct variant.
pub struct SerializeStructVariant {
    variant: &'static str,
    dictionary: Dictionary,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.dictionary.insert(key.to_owned(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut outer = Dictionary::with_capacity(1);
        outer.insert(self.variant.to_owned(), Value::Dictionary(self.dictionary));
        Ok(Value::Dictionary(outer))
    }
}

/// Serializer for dictionary keys, which can only be strings.
struct KeySerializer;

fn key_must_be_a_string(found: &str) -> Error {
    Error::UnsupportedType(format!("dictionary key must be a string, found {}", found))
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_owned())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(key_must_be_a_string("boolean"))
    }

    fn serialize_i8(self, _v: i8) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_i16(self, _v: i16) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_i32(self, _v: i32) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_i64(self, _v: i64) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_u8(self, _v: u8) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_u16(self, _v: u16) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_u32(self, _v: u32) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_u64(self, _v: u64) -> Result<String> {
        Err(key_must_be_a_string("integer"))
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_must_be_a_string("real"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_must_be_a_string("real"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_must_be_a_string("data"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_must_be_a_string("none"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        Err(key_must_be_a_string("option"))
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_must_be_a_string("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_must_be_a_string("unit struct"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        Err(key_must_be_a_string("newtype variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_a_string("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_a_string("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_a_string("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_a_string("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_a_string("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_a_string("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_a_string("struct variant"))
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use std::collections::BTreeMap;

    use super::*;

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(u32),
        Line(u8, u8),
        Rect { w: u32, h: u32 },
    }

    #[derive(Serialize)]
    struct Record {
        name: &'static str,
        when: Date,
        object: Uid,
        shapes: Vec<Shape>,
        note: Option<String>,
        bytes: serde_bytes_like::Bytes,
    }

    mod serde_bytes_like {
        use serde::{Serialize, Serializer};

        pub struct Bytes(pub Vec<u8>);

        impl Serialize for Bytes {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bytes(&self.0)
            }
        }
    }

    fn dictionary(entries: Vec<(&str, Value)>) -> Value {
        Value::Dictionary(entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
    }

    #[test]
    fn test_to_value_struct() {
        let record = Record {
            name: "disk",
            when: Date::from_absolute_time(1.0),
            object: Uid(9),
            shapes: vec![Shape::Empty, Shape::Circle(2), Shape::Line(1, 5), Shape::Rect { w: 3, h: 4 }],
            note: None,
            bytes: serde_bytes_like::Bytes(vec![0x00, 0xFE]),
        };

        assert_eq!(to_value(&record), Ok(dictionary(vec![
            ("name", Value::from("disk")),
            ("when", Value::Date(Date::from_absolute_time(1.0))),
            ("object", Value::Uid(Uid(9))),
            ("shapes", Value::Array(vec![
                Value::from("Empty"),
                dictionary(vec![("Circle", Value::from(2))]),
                dictionary(vec![("Line", Value::Array(vec![Value::from(1), Value::from(5)]))]),
                dictionary(vec![("Rect", dictionary(vec![
                    ("w", Value::from(3)),
                    ("h", Value::from(4)),
                ]))]),
            ])),
            ("note", Value::Null),
            ("bytes", Value::Data(vec![0x00, 0xFE])),
        ])));
    }

    #[test]
    fn test_to_value_rejects_non_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(1u8, "one");
        assert_eq!(
            to_value(&map),
            Err(Error::UnsupportedType("dictionary key must be a string, found integer".to_owned()))
        );
    }

    #[test]
    fn test_to_value_u128_out_of_range() {
        assert_eq!(to_value(&u128::MAX), Err(Error::IntegerOutOfRange(u128::MAX.to_string())));
        assert_eq!(to_value(&(i128::MAX as u128)), Ok(Value::Integer(i128::MAX)));
    }

    #[test]
    fn test_value_serializes_into_itself() {
        let value = Value::Array(vec![
            Value::Date(Date::from_absolute_time(-3.25)),
            Value::Uid(Uid(42)),
            Value::Integer(-(1 << 100)),
            Value::Null,
        ]);
        assert_eq!(to_value(&value), Ok(value));
    }
}
