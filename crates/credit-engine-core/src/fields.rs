//! Loose-field helpers shared by every calculator.
//!
//! Officer-entered forms and bureau exports rarely agree on field names or number
//! formats. Everything that has to tolerate that goes through this module:
//!
//! 1. **Key normalization** -- `normalize_key` folds `Nama Pelapor`, `nama_pelapor`
//!    and `namaPelapor` to the same lookup key.
//! 2. **Ordered fallbacks** -- `first_present` walks an explicit candidate list
//!    instead of nested "try A, else B" chains.
//! 3. **Lenient numbers** -- `parse_decimal` accepts `Rp 1.500.000,-`, `12,5%` or
//!    `1,500,000.00`; anything unparseable is treated as absent.
//!    Rates use `parse_percent`, which never reads a separator as thousands.
//! 4. **Serde adapters** -- `lenient_decimal` / `lenient_opt_decimal` (and the
//!    `_percent` twins) for `deserialize_with`, so JSON and YAML inputs coerce
//!    instead of failing.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A flat record keyed by normalized field name.
pub type FieldRecord = BTreeMap<String, String>;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y%m%d"];

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Lowercase and strip everything that is not alphanumeric.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Return the first candidate key with a non-blank value, in candidate order.
pub fn first_present<'a>(record: &'a FieldRecord, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        record
            .get(&normalize_key(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    })
}

/// Like `first_present`, parsed as a decimal. Unparseable text counts as absent.
pub fn first_decimal(record: &FieldRecord, keys: &[&str]) -> Option<Decimal> {
    first_present(record, keys).and_then(parse_decimal)
}

/// Like `first_decimal`, for rate fields.
pub fn first_percent(record: &FieldRecord, keys: &[&str]) -> Option<Decimal> {
    first_present(record, keys).and_then(parse_percent)
}

/// Build a `FieldRecord` from a JSON object. Scalars become text; nested values are dropped.
pub fn record_from_json(map: &serde_json::Map<String, Value>) -> FieldRecord {
    map.iter()
        .filter_map(|(k, v)| scalar_text(v).map(|text| (normalize_key(k), text)))
        .collect()
}

/// Build a `FieldRecord` from parallel header/value slices.
pub fn record_from_row(headers: &[String], row: &[String]) -> FieldRecord {
    headers
        .iter()
        .zip(row.iter())
        .map(|(h, v)| (normalize_key(h), v.trim().to_string()))
        .collect()
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Parse a human-entered number.
///
/// Currency prefixes, percent signs and whitespace are ignored. When both `.` and
/// `,` appear, the rightmost one is the decimal separator. A lone separator followed
/// by exactly three digits (and a non-zero integer part) is a thousands separator,
/// which is how IDR amounts are usually written (`1.500` = 1500).
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    parse_number(text, true)
}

/// Parse a rate or percentage. Same rules as `parse_decimal`, except a lone
/// separator is always the decimal mark (`10.125` = 10.125, `12,5%` = 12.5).
pub fn parse_percent(text: &str) -> Option<Decimal> {
    parse_number(text, false)
}

fn parse_number(text: &str, lone_separator_groups: bool) -> Option<Decimal> {
    let negative = text.trim_start().starts_with('-');
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let body = kept.trim_matches(|c: char| !c.is_ascii_digit());
    if body.is_empty() {
        return None;
    }

    let dots = body.matches('.').count();
    let commas = body.matches(',').count();
    let normalized = match (dots, commas) {
        (0, 0) => body.to_string(),
        (_, 0) => {
            if dots > 1 || (lone_separator_groups && is_thousands_group(body, '.')) {
                body.replace('.', "")
            } else {
                body.to_string()
            }
        }
        (0, _) => {
            if commas > 1 || (lone_separator_groups && is_thousands_group(body, ',')) {
                body.replace(',', "")
            } else {
                body.replace(',', ".")
            }
        }
        _ => {
            if body.rfind(',') > body.rfind('.') {
                body.replace('.', "").replace(',', ".")
            } else {
                body.replace(',', "")
            }
        }
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

fn is_thousands_group(body: &str, sep: char) -> bool {
    match body.split_once(sep) {
        Some((int_part, frac)) => {
            frac.len() == 3 && !int_part.trim_start_matches('0').is_empty()
        }
        None => false,
    }
}

/// Convert any JSON scalar into a decimal, `None` for null, bools and containers.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    number_from_value(value, parse_decimal)
}

/// `decimal_from_value` for rate fields: strings go through `parse_percent`.
pub fn percent_from_value(value: &Value) -> Option<Decimal> {
    number_from_value(value, parse_percent)
}

fn number_from_value(value: &Value, parse_text: fn(&str) -> Option<Decimal>) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            }
        }
        Value::String(s) => parse_text(s),
        _ => None,
    }
}

/// `deserialize_with` adapter: numbers, numeric strings, null or garbage (as 0).
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .unwrap_or(Decimal::ZERO))
}

/// `deserialize_with` adapter keeping "never entered" distinct from zero.
pub fn lenient_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

/// `lenient_decimal` for rates and percentages.
pub fn lenient_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(percent_from_value)
        .unwrap_or(Decimal::ZERO))
}

/// `lenient_opt_decimal` for rates and percentages.
pub fn lenient_opt_percent<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(percent_from_value))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Best-effort date parse over the formats seen in SLIK exports.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let head = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}
