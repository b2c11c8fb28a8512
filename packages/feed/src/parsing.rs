//! Shared parsing utilities for the state normalizers.
//!
//! Datetime, coordinate and loosely-typed JSON field helpers used across
//! multiple feed formats.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|\r?\n").unwrap_or_else(|_| unreachable!()));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap_or_else(|_| unreachable!()));

/// Datetime formats tried in order before the lenient fallbacks.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats, interpreted as midnight.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Parses a feed datetime string.
///
/// Tries the fixed formats in [`DATETIME_FORMATS`], then date-only
/// formats, then RFC 3339 and RFC 2822. Offset-bearing values keep the
/// publisher's local wall-clock time. Returns `None` if nothing matches.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }

    None
}

/// Parses a `"lat,lon"` string. Returns `None` if malformed or invalid.
#[must_use]
pub fn parse_lat_lon_str(s: &str) -> Option<(f64, f64)> {
    let (lat, lon) = aus_emergency_geofence::parse_lat_lon(s)?;
    valid_coordinates(lat, lon)
}

/// Parses a `GeoRSS` `"lat lon"` point. Returns `None` if malformed or
/// invalid.
#[must_use]
pub fn parse_georss_point(s: &str) -> Option<(f64, f64)> {
    let mut parts = s.split_whitespace();
    let lat = parts.next()?.parse::<f64>().ok()?;
    let lon = parts.next()?.parse::<f64>().ok()?;
    valid_coordinates(lat, lon)
}

/// Rejects out-of-range, non-finite and `0,0` coordinates.
#[must_use]
pub fn valid_coordinates(lat: f64, lon: f64) -> Option<(f64, f64)> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return None;
    }
    if lat == 0.0 && lon == 0.0 {
        return None;
    }
    Some((lat, lon))
}

/// Reads a JSON value as an `f64`, accepting numbers and numeric strings.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Reads a JSON value as trimmed, non-empty text. Numbers and booleans
/// are stringified.
#[must_use]
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Returns the first of `keys` present in `object` as text.
#[must_use]
pub fn text_field(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(value_as_text))
}

/// Returns the first of `keys` present in `object` as a number.
#[must_use]
pub fn number_field(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(value_as_f64))
}

/// Reads a string-or-number latitude/longitude pair from `object`.
#[must_use]
pub fn lat_lon_fields(
    object: &serde_json::Map<String, Value>,
    lat_keys: &[&str],
    lon_keys: &[&str],
) -> Option<(f64, f64)> {
    let lat = number_field(object, lat_keys)?;
    let lon = number_field(object, lon_keys)?;
    valid_coordinates(lat, lon)
}

/// Extracts `Key: value` pairs from an HTML-ish description.
///
/// Lines are split on `<br>` variants and newlines, remaining tags are
/// stripped, and keys are lowercased. Lines without a colon are ignored.
#[must_use]
pub fn labeled_fields(description: &str) -> BTreeMap<String, String> {
    LINE_BREAK_RE
        .split(description)
        .filter_map(|line| {
            let line = strip_tags(line);
            let (key, value) = line.split_once(':')?;
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key, value.to_string()))
        })
        .collect()
}

/// Strips HTML tags and collapses the result to plain text.
#[must_use]
pub fn strip_tags(s: &str) -> String {
    let without_breaks = LINE_BREAK_RE.replace_all(s, "\n");
    let text = TAG_RE.replace_all(&without_breaks, "");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sa_date_and_time() {
        let dt = parse_datetime("14/10/2025 13:45").unwrap();
        assert_eq!(dt.to_string(), "2025-10-14 13:45:00");
    }

    #[test]
    fn parses_twelve_hour_clock() {
        let dt = parse_datetime("4/10/2025 1:05:00 PM").unwrap();
        assert_eq!(dt.to_string(), "2025-10-04 13:05:00");
    }

    #[test]
    fn parses_iso_variants() {
        assert_eq!(
            parse_datetime("2025-10-14T13:45:00.000").unwrap().to_string(),
            "2025-10-14 13:45:00"
        );
        assert_eq!(
            parse_datetime("2025-10-14 13:45:00").unwrap().to_string(),
            "2025-10-14 13:45:00"
        );
        // Offset-bearing values keep the published wall-clock time.
        assert_eq!(
            parse_datetime("2025-10-14T13:45:00+10:30").unwrap().to_string(),
            "2025-10-14 13:45:00"
        );
    }

    #[test]
    fn parses_rfc2822_pub_dates() {
        let dt = parse_datetime("Tue, 14 Oct 2025 13:45:00 +1100").unwrap();
        assert_eq!(dt.to_string(), "2025-10-14 13:45:00");
    }

    #[test]
    fn parses_date_only_as_midnight() {
        assert_eq!(
            parse_datetime("14/10/2025").unwrap().to_string(),
            "2025-10-14 00:00:00"
        );
        assert_eq!(
            parse_datetime("2025-10-14").unwrap().to_string(),
            "2025-10-14 00:00:00"
        );
    }

    #[test]
    fn unparseable_datetime_is_none() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday arvo").is_none());
        assert!(parse_datetime("32/13/2025").is_none());
    }

    #[test]
    fn parses_coordinate_strings() {
        assert_eq!(
            parse_lat_lon_str("-34.9, 138.6"),
            Some((-34.9, 138.6))
        );
        assert!(parse_lat_lon_str("-34.9").is_none());
        assert!(parse_lat_lon_str("0,0").is_none());
        assert!(parse_lat_lon_str("-134.9,138.6").is_none());
        assert_eq!(parse_georss_point("-42.88 147.33"), Some((-42.88, 147.33)));
        assert!(parse_georss_point("-42.88,147.33").is_none());
    }

    #[test]
    fn reads_string_or_numeric_fields() {
        let obj = serde_json::json!({
            "lat": "-37.81",
            "lng": 144.96,
            "count": 3,
            "blank": "  ",
        });
        let obj = obj.as_object().unwrap();
        assert_eq!(lat_lon_fields(obj, &["lat"], &["lng"]), Some((-37.81, 144.96)));
        assert_eq!(text_field(obj, &["blank", "count"]).as_deref(), Some("3"));
        assert!(text_field(obj, &["missing"]).is_none());
    }

    #[test]
    fn extracts_labeled_fields_from_html() {
        let fields = labeled_fields(
            "ALERT LEVEL: Advice <br />LOCATION: Smiths Rd, Kurrajong<br/>\
             COUNCIL AREA: Hawkesbury <br>STATUS: Under control<br />\
             TYPE: Bush Fire<br />UPDATED: 14 Oct 2025 10:00",
        );
        assert_eq!(fields.get("alert level").map(String::as_str), Some("Advice"));
        assert_eq!(
            fields.get("location").map(String::as_str),
            Some("Smiths Rd, Kurrajong")
        );
        assert_eq!(fields.get("council area").map(String::as_str), Some("Hawkesbury"));
        assert_eq!(fields.get("updated").map(String::as_str), Some("14 Oct 2025 10:00"));
    }

    #[test]
    fn strips_tags() {
        assert_eq!(
            strip_tags("<p>Type: <b>Bushfire</b></p><br />Status: Going"),
            "Type: Bushfire\nStatus: Going"
        );
    }
}
