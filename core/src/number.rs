//! A numeric scalar the API sends either as a JSON number or as a string.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Numeric value that decodes from `42`, `42.5`, `"42"` or `"42.5"` alike.
///
/// An empty string decodes to zero. Serializes as a plain JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct NumberString(pub f64);

impl NumberString {
    pub fn value(&self) -> f64 {
        self.0
    }

    /// The value as an integer, when it has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        if self.0.fract() == 0.0 && self.0.is_finite() {
            Some(self.0 as i64)
        } else {
            None
        }
    }
}

impl From<f64> for NumberString {
    fn from(v: f64) -> Self {
        NumberString(v)
    }
}

impl From<i64> for NumberString {
    fn from(v: i64) -> Self {
        NumberString(v as f64)
    }
}

impl fmt::Display for NumberString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NumberString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(i) => serializer.serialize_i64(i),
            None => serializer.serialize_f64(self.0),
        }
    }
}

struct NumberStringVisitor;

impl<'de> Visitor<'de> for NumberStringVisitor {
    type Value = NumberString;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string containing a number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(NumberString(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(NumberString(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(NumberString(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(NumberString(0.0));
        }
        trimmed
            .parse::<f64>()
            .map(NumberString)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NumberString(0.0))
    }
}

impl<'de> Deserialize<'de> for NumberString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberStringVisitor)
    }
}
