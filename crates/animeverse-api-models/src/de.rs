//! Serde helpers shared by several DTOs.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept identifiers sent either as strings or as JSON numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}
