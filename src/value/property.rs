//! Property values and rows
//!
//! `PropertyValue` is a closed sum type: exactly one variant per instance.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValueError;
use super::key::Key;

/// Named properties of an entity, ordered by name
pub type Properties = BTreeMap<String, PropertyValue>;

/// Variant tag of a property value
///
/// `Raw` is never produced by a value; it is the declared type of a clause
/// whose text is passed into the query unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Double,
    Timestamp,
    String,
    Blob,
    GeoPoint,
    Array,
    Entity,
    Key,
    Raw,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::Timestamp => "timestamp",
            ValueType::String => "string",
            ValueType::Blob => "blob",
            ValueType::GeoPoint => "geoPoint",
            ValueType::Array => "array",
            ValueType::Entity => "entity",
            ValueType::Key => "key",
            ValueType::Raw => "raw",
        }
    }

    /// Returns true for integer and double
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Double)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim() {
            "null" => ValueType::Null,
            "boolean" => ValueType::Boolean,
            "integer" => ValueType::Integer,
            "double" => ValueType::Double,
            "timestamp" => ValueType::Timestamp,
            "string" => ValueType::String,
            "blob" => ValueType::Blob,
            "geoPoint" => ValueType::GeoPoint,
            "array" => ValueType::Array,
            "entity" => ValueType::Entity,
            "key" => ValueType::Key,
            "raw" => ValueType::Raw,
            other => {
                return Err(ValueError::validation(format!(
                    "unknown value type '{}'",
                    other
                )))
            }
        };
        Ok(ty)
    }
}

/// Geographic point; each coordinate may be absent
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        same_coordinate(self.latitude, other.latitude)
            && same_coordinate(self.longitude, other.longitude)
    }
}

/// A document property value
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    /// 64-bit integer; the wire form is a decimal string
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Blob(Vec<u8>),
    GeoPoint(GeoPoint),
    Array(Vec<PropertyValue>),
    /// Embedded properties; produced by joins, never edited
    Entity(Properties),
    Key(Key),
}

impl PropertyValue {
    /// Variant tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Null => ValueType::Null,
            PropertyValue::Boolean(_) => ValueType::Boolean,
            PropertyValue::Integer(_) => ValueType::Integer,
            PropertyValue::Double(_) => ValueType::Double,
            PropertyValue::Timestamp(_) => ValueType::Timestamp,
            PropertyValue::String(_) => ValueType::String,
            PropertyValue::Blob(_) => ValueType::Blob,
            PropertyValue::GeoPoint(_) => ValueType::GeoPoint,
            PropertyValue::Array(_) => ValueType::Array,
            PropertyValue::Entity(_) => ValueType::Entity,
            PropertyValue::Key(_) => ValueType::Key,
        }
    }

    /// Numeric view used by aggregation; other variants yield `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            PropertyValue::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        use PropertyValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Double(a), Double(b)) => same_double(*a, *b),
            (Timestamp(a), Timestamp(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Blob(a), Blob(b)) => a == b,
            (GeoPoint(a), GeoPoint(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Entity(a), Entity(b)) => a == b,
            (Key(a), Key(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<Key> for PropertyValue {
    fn from(key: Key) -> Self {
        PropertyValue::Key(key)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", super::edit::element_literal(self, "", None))
    }
}

/// One fetched document
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: Key,
    pub properties: Properties,
}

impl Entity {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            properties: Properties::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// Doubles are equal when numerically equal or both NaN
fn same_double(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn same_coordinate(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_double(a, b),
        (None, None) => true,
        _ => false,
    }
}
