//! Decoders for numeric fields that older clients stored as form strings.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Either a JSON number or the text a form input produced for it.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

/// Decode a floating-point field such as `rating`. Blank text reads as zero.
pub(crate) fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number {n} is not representable"))),
        NumberOrText::Text(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

/// Decode a non-negative integer field such as `count`.
pub(crate) fn unsigned<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => match n.as_u64() {
            Some(v) => v,
            None => return Err(D::Error::custom(format!("expected a whole count, got {n}"))),
        },
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a whole count, got {s:?}")))?,
    };
    u32::try_from(raw).map_err(|_| D::Error::custom(format!("count {raw} is out of range")))
}

pub(crate) fn default_count() -> u32 {
    1
}
