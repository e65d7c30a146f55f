//! Serde helpers for the remote API's loosely typed JSON.
//!
//! The API echoes back whatever a client posted, so numeric fields may arrive
//! as numbers or numeric strings, and `is_favorite` as a boolean or as
//! `"true"`/`"false"`. Everything is normalised on the way in; ids must be
//! integers before they touch a store key.

use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{Error, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Float(f64),
    Text(String),
}

impl NumberOrString {
    fn into_i64<E: serde::de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            Self::Number(value) => Ok(value),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(value) if value.fract() == 0.0 => Ok(value as i64),
            Self::Float(value) => Err(E::custom(format!("expected an integer, got {value}"))),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a numeric string, got {text:?}"))),
        }
    }
}

/// Deserialize an integer from a JSON number or numeric string.
pub fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_i64()
}

/// Optional variant of [`lenient_i64`]; `null` maps to `None`.
pub fn lenient_i64_opt<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_i64)
        .transpose()
}

/// Normalize a caller-supplied id (path segment, form field) to its numeric key.
pub fn normalize_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("id must be numeric, got {raw:?}")))
}

/// Stringified boolean, written as `"true"`/`"false"`.
pub mod string_bool {
    use super::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolOrString>::deserialize(deserializer)? {
            None => Ok(false),
            Some(BoolOrString::Bool(value)) => Ok(value),
            Some(BoolOrString::Text(text)) => {
                match text.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(true),
                    "false" | "" => Ok(false),
                    _ => Err(serde::de::Error::custom(format!(
                        "expected \"true\" or \"false\", got {text:?}"
                    ))),
                }
            }
        }
    }
}
