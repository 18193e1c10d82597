//! Value, label and time formatting shared by every chart kind.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Placeholder for missing cells.
pub const MISSING: &str = "-";

/// Fixed-point text with ties rounded away from zero, the way browsers
/// render `toFixed`. Plain `{:.N}` would round exact ties to even.
pub fn format_number(value: f64, decimals: usize) -> String {
    let value = if is_exact_tie(value, decimals) {
        // One ulp further from zero; finite ties are never the largest float.
        f64::from_bits(value.to_bits() + 1)
    } else {
        value
    };
    format!("{value:.decimals$}")
}

/// True when `value` lies exactly halfway between two `decimals`-place
/// numbers. Such a value times `2^(decimals + 1)` is an odd integer.
fn is_exact_tie(value: f64, decimals: usize) -> bool {
    let Ok(exponent) = i32::try_from(decimals + 1) else {
        return false;
    };
    let scaled = value * 2f64.powi(exponent);
    scaled.is_finite() && scaled.fract() == 0.0 && scaled % 2.0 != 0.0
}

/// Display text of a cell: numbers rounded, null as [`MISSING`], strings
/// as-is, anything else as JSON text.
pub fn format_value(value: &Value, decimals: usize) -> String {
    match value {
        Value::Null => MISSING.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(number) => format_number(number, decimals),
            None => number.to_string(),
        },
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn format_cell(value: Option<&Value>, decimals: usize) -> String {
    value.map_or_else(|| MISSING.to_string(), |value| format_value(value, decimals))
}

/// Category text for an x position; numbers keep their full precision.
pub fn category_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn numeric(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

/// `sea_surface_temp` becomes `SEA SURFACE TEMP`.
pub fn axis_label(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

/// Milliseconds since the Unix epoch. Dates without a zone are read as UTC.
pub fn parse_timestamp_ms(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(moment) = DateTime::parse_from_rfc3339(text) {
        return Some(moment.timestamp_millis());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(moment) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(moment.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|moment| moment.and_utc().timestamp_millis())
}

fn utc(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
}

/// Tooltip form, e.g. `Sun, 01 Jan 2023 00:00:00 GMT`.
pub fn format_utc(timestamp_ms: i64) -> String {
    utc(timestamp_ms)
        .map(|moment| moment.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Axis tick form, e.g. `2023-01-01`.
pub fn format_tick_date(timestamp_ms: i64) -> String {
    utc(timestamp_ms)
        .map(|moment| moment.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}
