//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Serde does not provide a data type analogous to a UID.
//! As such, the property list UID type is mapped onto a custom UID structure.
//! This is achieved by having it represented during serialization as a structure with
//! a special name and field, similar to the way the TOML crate approaches Dates.

use serde::{de, ser};
use serde::ser::SerializeStruct;

use std::fmt;

/// Name of the UID structure.
pub const STRUCT_NAME: &str = "$__property_list_private_Uid";

/// Name of the field in the structure.
pub const STRUCT_FIELD: &str = "$__property_list_private_Uid_value";

/// A keyed-archiver UID, conventionally an index into the `$objects` array.
///
/// UIDs are always unsigned, regardless of the width in which they are stored.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Uid(pub u128);

/// Custom serializer for the UID pseudo-structure.
impl ser::Serialize for Uid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let mut state = serializer.serialize_struct(STRUCT_NAME, 1)?;
        state.serialize_field(STRUCT_FIELD, &self.0)?;
        state.end()
    }
}

/// Custom deserializer for the UID pseudo-structure.
impl<'de> de::Deserialize<'de> for Uid {
    fn deserialize<D>(deserializer: D) -> Result<Uid, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct UidVisitor;

        // Process the structure as a map.
        impl<'de> de::Visitor<'de> for UidVisitor {
            type Value = Uid;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a UID")
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Uid, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let value = visitor.next_key::<UidKey>()?;
                if value.is_none() {
                    return Err(de::Error::custom("uid key not found"));
                }
                Ok(Uid(visitor.next_value()?))
            }
        }

        // Deserialize the UID structure with the special name and field.
        deserializer.deserialize_struct(
            STRUCT_NAME,
            &[STRUCT_FIELD],
            UidVisitor
        )
    }
}

struct UidKey;

/// Deserializes the custom UID struct field.
impl<'de> de::Deserialize<'de> for UidKey {
    fn deserialize<D>(deserializer: D) -> Result<UidKey, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct FieldVisitor;

        impl<'de> de::Visitor<'de> for FieldVisitor {
            type Value = ();

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a valid UID field")
            }

            fn visit_str<E>(self, s: &str) -> Result<(), E>
            where
                E: de::Error,
            {
                if s == STRUCT_FIELD {
                    Ok(())
                } else {
                    Err(de::Error::custom("expected field with custom name"))
                }
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)?;
        Ok(UidKey)
    }
}
