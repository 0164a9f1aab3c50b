//! Editable string projection of property values
//!
//! `to_edit_string` and `from_edit_string` are inverses for every variant
//! except `entity`, given the same project/namespace context.
//!
//! Top-level values use their bare form (a string is its own text). Inside
//! arrays each element uses a self-describing literal so its type survives:
//!
//! | Variant | Element literal |
//! |---|---|
//! | null | `NULL` |
//! | boolean | `true` / `false` |
//! | integer | `-12` |
//! | double | `4.5`, `4.0`, `1e300`, `NaN`, `inf` |
//! | timestamp | `DATETIME("2024-01-01T00:00:00Z")` |
//! | string | `'O\'Brien'` |
//! | blob | `BLOB("aGk=")` |
//! | geoPoint | `GEOPT(1.5, -2.0)` |
//! | key | `KEY(Org, 'acme')` |
//! | array | `[1, 'a']` |

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use super::errors::{ValueError, ValueResult};
use super::key::Key;
use super::property::{GeoPoint, PropertyValue, ValueType};
use super::scan::{double_quote, single_quote, Scanner};

/// Renders a value as editable text
pub fn to_edit_string(value: &PropertyValue, project: &str, namespace: Option<&str>) -> String {
    match value {
        PropertyValue::Null => "NULL".to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Double(d) => format_double(*d),
        PropertyValue::Timestamp(ts) => format_timestamp(ts),
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Blob(bytes) => STANDARD.encode(bytes),
        PropertyValue::GeoPoint(point) => format!(
            "{},{}",
            format_coordinate(point.latitude),
            format_coordinate(point.longitude)
        ),
        PropertyValue::Key(key) => key.to_literal(project, namespace),
        PropertyValue::Array(_) | PropertyValue::Entity(_) => {
            element_literal(value, project, namespace)
        }
    }
}

/// Parses editable text as a value of the requested type
pub fn from_edit_string(
    text: &str,
    value_type: ValueType,
    project: &str,
    namespace: Option<&str>,
) -> ValueResult<PropertyValue> {
    let trimmed = text.trim();
    match value_type {
        ValueType::Null => {
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                Ok(PropertyValue::Null)
            } else {
                Err(ValueError::validation(format!("'{}' is not NULL", trimmed)))
            }
        }
        ValueType::Boolean => parse_boolean(trimmed).map(PropertyValue::Boolean),
        ValueType::Integer => parse_integer(trimmed).map(PropertyValue::Integer),
        ValueType::Double => trimmed
            .parse::<f64>()
            .map(PropertyValue::Double)
            .map_err(|_| ValueError::validation(format!("'{}' is not a number", trimmed))),
        ValueType::Timestamp => parse_timestamp(trimmed).map(PropertyValue::Timestamp),
        ValueType::String => Ok(PropertyValue::String(text.to_string())),
        ValueType::Blob => parse_blob(trimmed).map(PropertyValue::Blob),
        ValueType::GeoPoint => parse_geo_point(trimmed).map(PropertyValue::GeoPoint),
        ValueType::Key => Key::parse_literal(trimmed, project, namespace).map(PropertyValue::Key),
        ValueType::Array => {
            let mut scanner = Scanner::new(trimmed);
            if scanner.peek() != Some('[') {
                return Err(scanner.unexpected("'['"));
            }
            let value = parse_element(&mut scanner, project, namespace)?;
            if !scanner.is_at_end() {
                return Err(scanner.unexpected("end of array"));
            }
            Ok(value)
        }
        ValueType::Entity => Err(ValueError::validation("entity values are not editable")),
        ValueType::Raw => Err(ValueError::validation(
            "raw text has no value representation",
        )),
    }
}

/// Renders a value in its self-describing literal form
pub fn element_literal(value: &PropertyValue, project: &str, namespace: Option<&str>) -> String {
    match value {
        PropertyValue::Null => "NULL".to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Double(d) => format_double(*d),
        PropertyValue::Timestamp(ts) => format!("DATETIME({})", double_quote(&format_timestamp(ts))),
        PropertyValue::String(s) => single_quote(s),
        PropertyValue::Blob(bytes) => format!("BLOB({})", double_quote(&STANDARD.encode(bytes))),
        PropertyValue::GeoPoint(point) => format!(
            "GEOPT({}, {})",
            format_coordinate(point.latitude),
            format_coordinate(point.longitude)
        ),
        PropertyValue::Key(key) => key.to_literal(project, namespace),
        PropertyValue::Array(values) => {
            let items: Vec<String> = values
                .iter()
                .map(|v| element_literal(v, project, namespace))
                .collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Entity(properties) => {
            let items: Vec<String> = properties
                .iter()
                .map(|(name, v)| format!("{}: {}", name, element_literal(v, project, namespace)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

/// Shortest round-trip form that never reads as an integer
pub fn format_double(d: f64) -> String {
    format!("{:?}", d)
}

/// RFC 3339 in UTC; years outside 0000-9999 carry an explicit sign
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn format_coordinate(c: Option<f64>) -> String {
    c.map(format_double).unwrap_or_default()
}

fn parse_boolean(text: &str) -> ValueResult<bool> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ValueError::validation(format!("'{}' is not a boolean", text)))
    }
}

fn parse_integer(text: &str) -> ValueResult<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::validation(format!("'{}' is not an integer", text)));
    }
    text.parse::<i64>()
        .map_err(|_| ValueError::validation(format!("'{}' does not fit in 64 bits", text)))
}

/// Inverse of `format_timestamp`, also accepting any RFC 3339 offset
pub(crate) fn parse_timestamp(text: &str) -> ValueResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|e| parse_signed_year(text).ok_or(e))
        .map_err(|e| ValueError::validation(format!("'{}' is not an ISO-8601 timestamp: {}", text, e)))
}

/// `+10000-01-01T00:00:00Z`, `-0001-01-01T00:00:00Z`
fn parse_signed_year(text: &str) -> Option<DateTime<Utc>> {
    if !text.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let body = text.strip_suffix('Z').or_else(|| text.strip_suffix('z'))?;
    NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_blob(text: &str) -> ValueResult<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| ValueError::validation(format!("invalid base64: {}", e)))
}

fn parse_geo_point(text: &str) -> ValueResult<GeoPoint> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        return Err(ValueError::validation(format!(
            "'{}' is not a 'latitude,longitude' pair",
            text
        )));
    }
    Ok(GeoPoint {
        latitude: parse_coordinate(parts[0])?,
        longitude: parse_coordinate(parts[1])?,
    })
}

fn parse_coordinate(text: &str) -> ValueResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| ValueError::validation(format!("'{}' is not a coordinate", text)))
}

/// Parses one element literal at the scanner's position
fn parse_element(
    scanner: &mut Scanner<'_>,
    project: &str,
    namespace: Option<&str>,
) -> ValueResult<PropertyValue> {
    match scanner.peek() {
        None => Err(scanner.unexpected("a value")),
        Some('\'') => Ok(PropertyValue::String(scanner.quoted('\'')?)),
        Some('[') => {
            scanner.expect('[')?;
            let mut values = Vec::new();
            if scanner.eat(']') {
                return Ok(PropertyValue::Array(values));
            }
            loop {
                values.push(parse_element(scanner, project, namespace)?);
                if scanner.eat(']') {
                    return Ok(PropertyValue::Array(values));
                }
                scanner.expect(',')?;
            }
        }
        Some('{') => Err(ValueError::validation("entity values are not editable")),
        Some(c) if c.is_ascii_alphabetic() => parse_keyword(scanner, project, namespace),
        Some(_) => parse_number(scanner),
    }
}

fn parse_keyword(
    scanner: &mut Scanner<'_>,
    project: &str,
    namespace: Option<&str>,
) -> ValueResult<PropertyValue> {
    if scanner.eat_word("NULL") {
        return Ok(PropertyValue::Null);
    }
    if scanner.eat_word("true") {
        return Ok(PropertyValue::Boolean(true));
    }
    if scanner.eat_word("false") {
        return Ok(PropertyValue::Boolean(false));
    }
    if scanner.eat_call("DATETIME") {
        let text = scanner.quoted('"')?;
        scanner.expect(')')?;
        return parse_timestamp(&text).map(PropertyValue::Timestamp);
    }
    if scanner.eat_call("BLOB") {
        let text = scanner.quoted('"')?;
        scanner.expect(')')?;
        return parse_blob(&text).map(PropertyValue::Blob);
    }
    if scanner.eat_call("GEOPT") {
        let latitude = parse_optional_coordinate(scanner)?;
        scanner.expect(',')?;
        let longitude = parse_optional_coordinate(scanner)?;
        scanner.expect(')')?;
        return Ok(PropertyValue::GeoPoint(GeoPoint {
            latitude,
            longitude,
        }));
    }
    let starts_key = scanner
        .rest()
        .get(..3)
        .map(|word| word.eq_ignore_ascii_case("KEY"))
        .unwrap_or(false);
    if starts_key {
        return Key::parse_from(scanner, project, namespace).map(PropertyValue::Key);
    }
    parse_number(scanner)
}

fn parse_optional_coordinate(scanner: &mut Scanner<'_>) -> ValueResult<Option<f64>> {
    if matches!(scanner.peek(), Some(',') | Some(')')) {
        return Ok(None);
    }
    let token = scanner
        .number_token()
        .ok_or_else(|| scanner.unexpected("a coordinate"))?;
    parse_coordinate(token)
}

fn parse_number(scanner: &mut Scanner<'_>) -> ValueResult<PropertyValue> {
    let token = scanner
        .number_token()
        .ok_or_else(|| scanner.unexpected("a value"))?;
    if let Ok(i) = parse_integer(token) {
        return Ok(PropertyValue::Integer(i));
    }
    token
        .parse::<f64>()
        .map(PropertyValue::Double)
        .map_err(|_| ValueError::validation(format!("'{}' is not a value literal", token)))
}
