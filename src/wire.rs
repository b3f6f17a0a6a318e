//! Lenient decoding of values coming from the admin dashboard.
//!
//! The PHP endpoints are loose about types: IDs and counters arrive as JSON
//! numbers on some screens and numeric strings on others. Everything is
//! normalised here, once, so the rest of the crate only sees one
//! representation per field.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Record identifier, always held as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::new(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Ok(RecordId::new(s)),
            Value::Number(n) => Ok(RecordId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected record id, got {other}"
            ))),
        }
    }
}

fn value_to_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Integer that may be sent as a number or a numeric string.
pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(deserializer)?;
    value_to_i64(&v).ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {v}")))
}

/// Optional integer; `null`, missing and empty strings become `None`.
pub fn lenient_opt_i64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Null => Ok(None),
        Value::String(ref s) if s.trim().is_empty() => Ok(None),
        ref other => value_to_i64(other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {other}"))),
    }
}

/// Non-negative counter; negatives clamp to zero.
pub fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    lenient_i64(deserializer).map(|n| n.max(0) as u64)
}

/// Optional non-negative counter.
pub fn lenient_opt_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    lenient_opt_i64(deserializer).map(|n| n.map(|n| n.max(0) as u64))
}

fn value_to_decimal(v: &Value) -> Option<Decimal> {
    let raw = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Decimal that may be a number or a numeric string.
pub fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let v = Value::deserialize(deserializer)?;
    value_to_decimal(&v).ok_or_else(|| serde::de::Error::custom(format!("expected decimal, got {v}")))
}

/// Optional decimal; `null`, missing and empty strings become `None`.
pub fn lenient_opt_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Null => Ok(None),
        Value::String(ref s) if s.trim().is_empty() => Ok(None),
        ref other => value_to_decimal(other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected decimal, got {other}"))),
    }
}

/// Calendar date from `YYYY-MM-DD`, tolerating a trailing time part
/// (`2024-01-31 18:22:05`, `2024-01-31T18:22:05Z`).
pub fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| serde::de::Error::custom(format!("expected YYYY-MM-DD date, got {raw:?}")))
}

/// First non-empty string among `keys`.
pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// First boolean-ish value among `keys` (`true`, `1`, `"true"`, `"1"`).
pub(crate) fn value_bool(v: &Value, keys: &[&str]) -> Option<bool> {
    for key in keys {
        match v.get(*key) {
            Some(Value::Bool(b)) => return Some(*b),
            Some(Value::Number(n)) => return n.as_i64().map(|n| n != 0),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => return Some(true),
                "false" | "0" => return Some(false),
                _ => {}
            },
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: RecordId,
        #[serde(deserialize_with = "lenient_i64")]
        filial: i64,
        #[serde(default, deserialize_with = "lenient_opt_i64")]
        caixa: Option<i64>,
        #[serde(deserialize_with = "lenient_u64")]
        total: u64,
    }

    #[test]
    fn ids_and_numbers_accept_both_shapes() {
        let a: Row = serde_json::from_value(json!({
            "id": 991, "filial": "12", "caixa": "", "total": "25"
        }))
        .unwrap();
        assert_eq!(a.id.as_str(), "991");
        assert_eq!(a.filial, 12);
        assert_eq!(a.caixa, None);
        assert_eq!(a.total, 25);

        let b: Row = serde_json::from_value(json!({
            "id": " PV-77 ", "filial": 3, "caixa": 2, "total": -4
        }))
        .unwrap();
        assert_eq!(b.id, RecordId::from("PV-77"));
        assert_eq!(b.caixa, Some(2));
        assert_eq!(b.total, 0);
    }

    #[test]
    fn missing_optional_integer_is_none() {
        let row: Row = serde_json::from_value(json!({ "id": "1", "filial": 1, "total": 0 })).unwrap();
        assert_eq!(row.caixa, None);
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = serde_json::from_value::<Row>(json!({ "id": "", "filial": 1, "total": 0 }));
        assert!(err.is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Money {
        #[serde(deserialize_with = "lenient_decimal")]
        valor: Decimal,
        #[serde(default, deserialize_with = "lenient_opt_decimal")]
        desconto: Option<Decimal>,
    }

    #[test]
    fn decimals_accept_strings_numbers_and_blanks() {
        let a: Money = serde_json::from_value(json!({ "valor": "10.10", "desconto": "" })).unwrap();
        assert_eq!(a.valor, Decimal::from_str("10.10").unwrap());
        assert_eq!(a.desconto, None);

        let b: Money = serde_json::from_value(json!({ "valor": 0.1, "desconto": 2 })).unwrap();
        assert_eq!(b.valor, Decimal::from_str("0.1").unwrap());
        assert_eq!(b.desconto, Some(Decimal::from(2)));

        assert!(serde_json::from_value::<Money>(json!({ "valor": "abc" })).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Day {
        #[serde(deserialize_with = "lenient_date")]
        data: NaiveDate,
    }

    #[test]
    fn dates_tolerate_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        for raw in ["2024-01-31", "2024-01-31 18:22:05", "2024-01-31T18:22:05Z"] {
            let day: Day = serde_json::from_value(json!({ "data": raw })).unwrap();
            assert_eq!(day.data, expected);
        }
        assert!(serde_json::from_value::<Day>(json!({ "data": "31/01/2024" })).is_err());
    }

    #[test]
    fn value_helpers_read_loose_envelopes() {
        let v = json!({ "success": "1", "error": "  ", "message": "Sem permissão" });
        assert_eq!(value_bool(&v, &["success"]), Some(true));
        assert_eq!(
            value_str(&v, &["error", "message"]).as_deref(),
            Some("Sem permissão")
        );
    }
}
