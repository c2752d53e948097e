//! Serde adapter for numbers the quote API transmits as JSON strings.
//!
//! Use with `#[serde(with = "string_number")]`. Values are parsed on the way in
//! and written back with their `Display` form, so `"128.4400"` becomes `128.44`.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serializer, de};

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse()
        .map_err(|e| de::Error::custom(format!("invalid numeric string {raw:?}: {e}")))
}
