//! 后端透传的 B 站字段有时是数字、有时是字符串。

use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Text(String),
    Null,
}

pub fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Int(v)) => v.to_string(),
        Some(Loose::Text(s)) => s,
        Some(Loose::Null) | None => String::new(),
    })
}

pub fn i64_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Loose::deserialize(d)? {
        Loose::Int(v) => Ok(v),
        Loose::Text(s) => s.trim().parse().map_err(D::Error::custom),
        Loose::Null => Err(D::Error::custom("id is null")),
    }
}

pub fn opt_i64_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<Loose>::deserialize(d)? {
        Some(Loose::Int(v)) => Ok(Some(v)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Some(Loose::Null) | None => Ok(None),
    }
}
