use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ModelError;

/// Day slot within a weekly plan, `0..=6`.
///
/// Stored and serialized as a string key (`"0"` .. `"6"`); integer keys are
/// accepted when deserializing so hand-written YAML plans can use `0:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekdayIndex(u8);

impl WeekdayIndex {
    pub const MAX: u8 = 6;

    pub fn new(index: u8) -> Result<Self, ModelError> {
        if index > Self::MAX {
            return Err(ModelError::WeekdayOutOfRange(index.into()));
        }
        Ok(Self(index))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Day offset from the start of the week this slot lands on.
    pub fn offset_days(self) -> u64 {
        u64::from(self.0)
    }

    pub fn all() -> impl Iterator<Item = WeekdayIndex> {
        (0..=Self::MAX).map(WeekdayIndex)
    }

    fn from_i64(value: i64) -> Result<Self, ModelError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(WeekdayIndex)
            .ok_or(ModelError::WeekdayOutOfRange(value))
    }
}

impl fmt::Display for WeekdayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WeekdayIndex {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidWeekday(s.to_string()))?;
        Self::from_i64(value)
    }
}

impl Serialize for WeekdayIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdayIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeekdayVisitor;

        impl Visitor<'_> for WeekdayVisitor {
            type Value = WeekdayIndex;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a weekday index between 0 and 6")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                WeekdayIndex::from_i64(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let v = i64::try_from(v).unwrap_or(i64::MAX);
                WeekdayIndex::from_i64(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(WeekdayVisitor)
    }
}
