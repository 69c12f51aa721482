//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use indexmap::map;
use ordered_float::OrderedFloat;
use serde::de::{
    self,
    DeserializeOwned,
    DeserializeSeed,
    EnumAccess,
    IntoDeserializer,
    MapAccess,
    SeqAccess,
    Unexpected,
    VariantAccess,
    Visitor,
};

use std::convert::TryFrom;
use std::fmt;
use std::vec;

use super::{date, uid, Date, Dictionary, Uid, Value};
use crate::error::{Error, Result};

/// Interprets a property list value as an instance of type `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

/// Deserialization of property list values from any serde format.
/// There are two notable exceptions, `Uid` and `Date`. These are implemented
/// as single-entry maps/structs with magic keys, and as such, will only be
/// recognized when produced by this crate.
impl<'de> de::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid property list value")
            }

            #[inline]
            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Boolean(value))
            }

            #[inline]
            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value.into()))
            }

            #[inline]
            fn visit_i128<E>(self, value: i128) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value))
            }

            #[inline]
            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::Integer(value.into()))
            }

            #[inline]
            fn visit_u128<E>(self, value: u128) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                i128::try_from(value)
                    .map(Value::Integer)
                    .map_err(|_| de::Error::custom("u128 value was too large"))
            }

            #[inline]
            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Real(OrderedFloat::from(value)))
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.into()))
            }

            #[inline]
            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            #[inline]
            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E> {
                Ok(Value::Data(value.into()))
            }

            #[inline]
            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Data(value))
            }

            #[inline]
            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            #[inline]
            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            #[inline]
            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                de::Deserialize::deserialize(deserializer)
            }

            #[inline]
            fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                de::Deserialize::deserialize(deserializer)
            }

            #[inline]
            fn visit_seq<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> std::result::Result<Value, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut map = Dictionary::new();

                // Re-mapped types without Serde are identified by a special key.
                let mut key: Option<String> = visitor.next_key()?;

                // These do not map to Dictionaries.
                if let Some(ref name) = key {
                    if name == date::STRUCT_FIELD {
                        let absolute_time: f64 = visitor.next_value()?;
                        return Ok(Value::Date(Date::from_absolute_time(absolute_time)));
                    } else if name == uid::STRUCT_FIELD {
                        return Ok(Value::Uid(Uid(visitor.next_value()?)));
                    }
                }

                // Process all key-value pairs checking for duplicates.
                while let Some(k) = key {
                    if map.contains_key(&k) {
                        let msg = format!("duplicate key: `{}`", k);
                        return Err(de::Error::custom(msg));
                    } else {
                        let v = visitor.next_value()?;
                        map.insert(k, v);
                        key = visitor.next_key()?;
                    }
                }

                Ok(Value::Dictionary(map))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Value {
    /// Describes the value for serde's type mismatch diagnostics.
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Boolean(value) => Unexpected::Bool(*value),
            Value::Integer(value) => match i64::try_from(*value) {
                Ok(value) => Unexpected::Signed(value),
                Err(_) => Unexpected::Other("128-bit integer"),
            },
            Value::Real(value) => Unexpected::Float(value.into_inner()),
            Value::String(value) => Unexpected::Str(value),
            Value::Data(value) => Unexpected::Bytes(value),
            Value::Array(_) => Unexpected::Seq,
            Value::Dictionary(_) => Unexpected::Map,
            other => Unexpected::Other(other.kind()),
        }
    }
}

/// Values act as deserializers so they can be converted into arbitrary types.
impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Null =>
                visitor.visit_unit(),
            Value::Boolean(value) =>
                visitor.visit_bool(value),
            Value::Integer(value) => {
                if let Ok(value) = i64::try_from(value) {
                    visitor.visit_i64(value)
                } else if let Ok(value) = u64::try_from(value) {
                    visitor.visit_u64(value)
                } else {
                    visitor.visit_i128(value)
                }
            }
            Value::Real(value) =>
                visitor.visit_f64(value.into_inner()),
            Value::String(value) =>
                visitor.visit_string(value),
            Value::Data(value) =>
                visitor.visit_byte_buf(value),
            Value::Array(elements) =>
                visit_array(elements, visitor),
            Value::Set(set) =>
                visit_array(set.into_vec(), visitor),
            Value::OrderedSet(set) =>
                visit_array(set.into_vec(), visitor),
            Value::Dictionary(dictionary) =>
                visit_dictionary(dictionary, visitor),

            // Urls and Uuids have no serde analogue and are presented in their textual and binary forms.
            Value::Url(url) =>
                visitor.visit_string(url.text),
            Value::Uuid(uuid) =>
                visitor.visit_bytes(&uuid.0),

            // A date is deserialized as a Date type via map access object.
            Value::Date(date) =>
                visitor.visit_map(DateDeserializer::new(date.absolute_time.into_inner())),

            // A UID is deserialized as a Uid type via map access object.
            Value::Uid(uid) =>
                visitor.visit_map(UidDeserializer::new(uid.0)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            // Unit variants are stored by name.
            Value::String(variant) =>
                visitor.visit_enum(EnumDeserializer { variant, value: Value::Null }),

            // Variants with content are stored as a single-entry dictionary.
            Value::Dictionary(dictionary) => {
                if dictionary.len() != 1 {
                    return Err(de::Error::invalid_length(dictionary.len(), &"a map with a single key"));
                }
                match dictionary.into_iter().next() {
                    Some((variant, value)) =>
                        visitor.visit_enum(EnumDeserializer { variant, value }),
                    None =>
                        Err(de::Error::invalid_length(0, &"a map with a single key")),
                }
            }

            other =>
                Err(de::Error::invalid_type(other.unexpected(), &"string or map")),
        }
    }

    serde::forward_to_deserialize_any! {
        bool
        u8 u16 u32 u64 u128
        i8 i16 i32 i64 i128
        f32 f64
        char str string
        seq map
        bytes byte_buf
        struct
        unit unit_struct
        tuple tuple_struct
        ignored_any
        identifier
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Value;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

/// Visits the elements of an array, requiring every element to be consumed.
fn visit_array<'de, V>(elements: Vec<Value>, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let length = elements.len();
    let mut sequence = ArraySequence::new(elements);
    let result = visitor.visit_seq(&mut sequence)?;
    if sequence.elements.len() == 0 {
        Ok(result)
    } else {
        Err(de::Error::invalid_length(length, &"fewer elements in array"))
    }
}

/// Visits the entries of a dictionary, requiring every entry to be consumed.
fn visit_dictionary<'de, V>(dictionary: Dictionary, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let length = dictionary.len();
    let mut map = DictionarySequence::new(dictionary);
    let result = visitor.visit_map(&mut map)?;
    if map.entries.len() == 0 {
        Ok(result)
    } else {
        Err(de::Error::invalid_length(length, &"fewer elements in map"))
    }
}

/// Access object to process the elements in an Array.
struct ArraySequence {
    elements: vec::IntoIter<Value>,
}

impl ArraySequence {
    fn new(elements: Vec<Value>) -> Self {
        ArraySequence {
            elements: elements.into_iter()
        }
    }
}

impl<'de> SeqAccess<'de> for ArraySequence {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if let Some(element) = self.elements.next() {
            seed.deserialize(element).map(Some)
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

/// Access object used to process the entries in a Dictionary.
struct DictionarySequence {
    entries: map::IntoIter<String, Value>,
    current_value: Option<Value>,
}

impl DictionarySequence {
    fn new(dictionary: Dictionary) -> Self {
        DictionarySequence {
            entries: dictionary.into_iter(),
            current_value: None,
        }
    }
}

impl<'de> MapAccess<'de> for DictionarySequence {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        // Advance the iterator and stash the value for the following call.
        if let Some((key, value)) = self.entries.next() {
            self.current_value = Some(value);
            seed.deserialize(Value::String(key)).map(Some)
        } else {
            Ok(None)
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current_value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("value is missing")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Access object to provide a Map around a Date-type pseudo-structure.
struct DateDeserializer {
    visited: bool,
    absolute_time: f64,
}

impl DateDeserializer {
    fn new(absolute_time: f64) -> Self {
        DateDeserializer {
            absolute_time,
            visited: false,
        }
    }
}

impl<'de> MapAccess<'de> for DateDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de> {
        if self.visited {
            Ok(None)
        } else {
            self.visited = true;
            seed.deserialize(date::STRUCT_FIELD.into_deserializer()).map(Some)
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de> {
        seed.deserialize(self.absolute_time.into_deserializer())
    }
}

/// Access object to provide a Map around a UID-type pseudo-structure.
struct UidDeserializer {
    visited: bool,
    value: u128,
}

impl UidDeserializer {
    fn new(value: u128) -> Self {
        UidDeserializer {
            value,
            visited: false,
        }
    }
}

impl<'de> MapAccess<'de> for UidDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de> {
        if self.visited {
            Ok(None)
        } else {
            self.visited = true;
            seed.deserialize(uid::STRUCT_FIELD.into_deserializer()).map(Some)
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de> {
        seed.deserialize(self.value.into_deserializer())
    }
}

/// Access object selecting an enum variant by name.
struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantDeserializer)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Value::String(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

/// Access object for the content of an enum variant.
struct VariantDeserializer {
    value: Value,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(de::Error::invalid_type(other.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Array(elements) => visit_array(elements, visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Dictionary(dictionary) => visit_dictionary(dictionary, visitor),
            other => Err(de::Error::invalid_type(other.unexpected(), &"struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use std::collections::BTreeMap;

    use super::*;

    #[derive(Deserialize, Debug, PartialEq)]
    enum Shape {
        Empty,
        Circle(u32),
        Rect { w: u32, h: u32 },
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Record {
        name: String,
        when: Date,
        object: Uid,
        shapes: Vec<Shape>,
        note: Option<String>,
    }

    fn dictionary(entries: Vec<(&str, Value)>) -> Value {
        Value::Dictionary(entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
    }

    #[test]
    fn test_from_value_struct() {
        let value = dictionary(vec![
            ("name", Value::from("disk")),
            ("when", Value::Date(Date::from_absolute_time(12.5))),
            ("object", Value::Uid(Uid(7))),
            ("shapes", Value::Array(vec![
                Value::from("Empty"),
                dictionary(vec![("Circle", Value::from(3))]),
                dictionary(vec![("Rect", dictionary(vec![
                    ("w", Value::from(2)),
                    ("h", Value::from(4)),
                ]))]),
            ])),
            ("note", Value::Null),
        ]);

        assert_eq!(from_value::<Record>(value), Ok(Record {
            name: "disk".to_owned(),
            when: Date::from_absolute_time(12.5),
            object: Uid(7),
            shapes: vec![Shape::Empty, Shape::Circle(3), Shape::Rect { w: 2, h: 4 }],
            note: None,
        }));
    }

    #[test]
    fn test_value_from_value_preserves_dates_and_uids() {
        let value = Value::Array(vec![
            Value::Date(Date::from_absolute_time(-4.0)),
            Value::Uid(Uid(300)),
            Value::Integer(i128::MIN),
        ]);
        assert_eq!(from_value::<Value>(value.clone()), Ok(value));
    }

    #[test]
    fn test_from_value_type_mismatch() {
        assert!(from_value::<BTreeMap<String, u8>>(Value::from("nope")).is_err());
        assert!(from_value::<u8>(Value::from(256)).is_err());
        assert_eq!(from_value::<(u8, u8)>(Value::Array(vec![Value::from(1), Value::from(2)])), Ok((1, 2)));
    }
}
