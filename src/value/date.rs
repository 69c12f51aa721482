//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Serde does not provide a Date or Time type.
//! As such, the property list Date type is mapped onto a custom Date structure.
//! This is achieved by having it represented during serialization as a structure with
//! a special name and field, similar to the way the TOML crate approaches it.

use ordered_float::OrderedFloat;
use serde::{de, ser};
use serde::ser::SerializeStruct;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::document::EPOCH_OFFSET;

/// Name of the Date structure.
pub const STRUCT_NAME: &str = "$__property_list_private_Date";

/// Name of the field in the structure.
pub const STRUCT_FIELD: &str = "$__property_list_private_Date_absolute_time";

/// A date structure roughly equivalent to an `NSDate`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Date {
    /// A double-precision 64-bit offset, in seconds, from the Core Data Epoch.
    /// This is defined as 1 January 2001, 00:00:00 UTC.
    pub absolute_time: OrderedFloat<f64>,
}

impl Date {
    /// Creates a date from an offset in seconds from the Core Data Epoch.
    pub fn from_absolute_time(seconds: f64) -> Self {
        Date {
            absolute_time: OrderedFloat(seconds),
        }
    }

    /// Creates a date from an offset in seconds from the Unix epoch.
    pub fn from_unix_timestamp(seconds: f64) -> Self {
        Date::from_absolute_time(seconds - EPOCH_OFFSET)
    }

    /// The offset in seconds from the Unix epoch.
    pub fn unix_timestamp(&self) -> f64 {
        self.absolute_time.into_inner() + EPOCH_OFFSET
    }

    /// Converts the date into a `SystemTime`, if it is representable as one.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let seconds = self.unix_timestamp();
        let magnitude = Duration::try_from_secs_f64(seconds.abs()).ok()?;
        if seconds >= 0.0 {
            UNIX_EPOCH.checked_add(magnitude)
        } else {
            UNIX_EPOCH.checked_sub(magnitude)
        }
    }
}

impl From<SystemTime> for Date {
    fn from(time: SystemTime) -> Date {
        let seconds = match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(error) => -error.duration().as_secs_f64(),
        };
        Date::from_unix_timestamp(seconds)
    }
}

/// Custom serializer for the Date pseudo-structure.
impl ser::Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let mut state = serializer.serialize_struct(STRUCT_NAME, 1)?;
        state.serialize_field(STRUCT_FIELD, &self.absolute_time.into_inner())?;
        state.end()
    }
}

/// Custom deserializer for the Date pseudo-structure.
impl<'de> de::Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct DateVisitor;

        // Process the structure as a map.
        impl<'de> de::Visitor<'de> for DateVisitor {
            type Value = Date;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a date")
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Date, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let value = visitor.next_key::<DateKey>()?;
                if value.is_none() {
                    return Err(de::Error::custom("date key not found"));
                }
                let absolute_time: f64 = visitor.next_value()?;
                Ok(Date::from_absolute_time(absolute_time))
            }
        }

        // Deserialize the Date structure with the special name and field.
        deserializer.deserialize_struct(
            STRUCT_NAME,
            &[STRUCT_FIELD],
            DateVisitor
        )
    }
}

struct DateKey;

/// Deserializes the custom date struct field.
impl<'de> de::Deserialize<'de> for DateKey {
    fn deserialize<D>(deserializer: D) -> Result<DateKey, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct FieldVisitor;

        impl<'de> de::Visitor<'de> for FieldVisitor {
            type Value = ();

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a valid date field")
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
        Ok(DateKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_conversion() {
        assert_eq!(Date::from_unix_timestamp(978_307_200.0), Date::from_absolute_time(0.0));
        assert_eq!(Date::from_absolute_time(-1.5).unix_timestamp(), 978_307_198.5);
    }

    #[test]
    fn test_system_time_conversion() {
        let time = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let date = Date::from(time);
        assert_eq!(date.absolute_time.into_inner(), 1_600_000_000.0 - EPOCH_OFFSET);
        assert_eq!(date.to_system_time(), Some(time));

        let before_unix_epoch = Date::from_unix_timestamp(-86_400.0);
        assert_eq!(
            before_unix_epoch.to_system_time(),
            UNIX_EPOCH.checked_sub(Duration::from_secs(86_400))
        );
        assert_eq!(Date::from_absolute_time(f64::NAN).to_system_time(), None);
    }
}
