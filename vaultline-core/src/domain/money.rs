//! Serde helpers for monetary amounts
//!
//! The dashboard API sends amounts as JSON numbers, some mock servers send
//! them as strings. Both are accepted; amounts are always written back as
//! numbers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// Deserialize an amount that can be a number or a numeric string
pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    parse_value(&value).map_err(D::Error::custom)
}

/// Serialize an amount as a JSON number
pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::Error;
    let value = amount
        .to_f64()
        .ok_or_else(|| S::Error::custom(format!("amount {} out of range", amount)))?;
    serializer.serialize_f64(value)
}

fn parse_value(value: &JsonValue) -> Result<Decimal, String> {
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| {
                n.as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .ok_or_else(|| format!("invalid decimal: {}", n))
            }),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("invalid decimal: {}", e)),
        _ => Err("expected number or string for amount".to_string()),
    }
}

/// Same as the module functions, for `Option<Decimal>` fields
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value: Option<JsonValue> = Option::deserialize(deserializer)?;
        match value {
            None | Some(JsonValue::Null) => Ok(None),
            Some(v) => parse_value(&v).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn serialize<S>(amount: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match amount {
            Some(a) => super::serialize(a, serializer),
            None => serializer.serialize_none(),
        }
    }
}
