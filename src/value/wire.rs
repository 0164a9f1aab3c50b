//! Tagged wire representation (REST JSON)
//!
//! Each value is an object carrying exactly one `*Value` member:
//!
//! ```text
//! {"integerValue": "42"}
//! {"keyValue": {"partitionId": {"projectId": "p"}, "path": [{"kind": "Org", "name": "acme"}]}}
//! ```
//!
//! Unrelated members such as `excludeFromIndexes` or `meaning` are ignored.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde_json::{json, Map, Value};

use super::edit::{format_timestamp, parse_timestamp};
use super::errors::{ValueError, ValueResult};
use super::key::{Key, KeyId, PathElement};
use super::property::{Entity, GeoPoint, Properties, PropertyValue, ValueType};

/// Wire member names, one per variant
const TAGS: [(&str, ValueType); 11] = [
    ("nullValue", ValueType::Null),
    ("booleanValue", ValueType::Boolean),
    ("integerValue", ValueType::Integer),
    ("doubleValue", ValueType::Double),
    ("timestampValue", ValueType::Timestamp),
    ("stringValue", ValueType::String),
    ("blobValue", ValueType::Blob),
    ("geoPointValue", ValueType::GeoPoint),
    ("arrayValue", ValueType::Array),
    ("entityValue", ValueType::Entity),
    ("keyValue", ValueType::Key),
];

/// Determines the variant of a wire value
///
/// Fails with `UnknownVariant` when no recognized tag is present.
pub fn value_type(wire: &Value) -> ValueResult<ValueType> {
    let obj = wire
        .as_object()
        .ok_or_else(|| ValueError::unknown_variant(format!("not an object: {}", wire)))?;

    let mut found = TAGS.iter().filter(|(tag, _)| obj.contains_key(*tag));
    match (found.next(), found.next()) {
        (Some((_, ty)), None) => Ok(*ty),
        (Some((a, _)), Some((b, _))) => Err(ValueError::validation(format!(
            "value carries both '{}' and '{}'",
            a, b
        ))),
        (None, _) => {
            let members: Vec<&str> = obj.keys().map(String::as_str).collect();
            Err(ValueError::unknown_variant(format!(
                "no value tag among [{}]",
                members.join(", ")
            )))
        }
    }
}

/// Decodes one wire value
pub fn value_from_wire(wire: &Value) -> ValueResult<PropertyValue> {
    let ty = value_type(wire)?;
    let tag = TAGS
        .iter()
        .find(|(_, t)| *t == ty)
        .map(|(tag, _)| *tag)
        .unwrap_or_default();
    let payload = &wire[tag];

    match ty {
        ValueType::Null => Ok(PropertyValue::Null),
        ValueType::Boolean => payload
            .as_bool()
            .map(PropertyValue::Boolean)
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::Integer => decode_integer(payload)
            .map(PropertyValue::Integer)
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::Double => decode_double(payload)
            .map(PropertyValue::Double)
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::Timestamp => payload
            .as_str()
            .and_then(|s| parse_timestamp(s).ok())
            .map(PropertyValue::Timestamp)
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::String => payload
            .as_str()
            .map(|s| PropertyValue::String(s.to_string()))
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::Blob => payload
            .as_str()
            .and_then(|s| STANDARD.decode(s).ok())
            .map(PropertyValue::Blob)
            .ok_or_else(|| invalid(tag, payload)),
        ValueType::GeoPoint => {
            if !payload.is_object() {
                return Err(invalid(tag, payload));
            }
            Ok(PropertyValue::GeoPoint(GeoPoint {
                latitude: payload.get("latitude").and_then(decode_double),
                longitude: payload.get("longitude").and_then(decode_double),
            }))
        }
        ValueType::Array => {
            let values = match payload.get("values") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(value_from_wire)
                    .collect::<ValueResult<Vec<_>>>()?,
                Some(other) => return Err(invalid(tag, other)),
            };
            Ok(PropertyValue::Array(values))
        }
        ValueType::Entity => properties_from_wire(payload.get("properties")).map(PropertyValue::Entity),
        ValueType::Key => key_from_wire(payload).map(PropertyValue::Key),
        ValueType::Raw => Err(ValueError::unknown_variant("raw has no wire form")),
    }
}

/// Encodes one value
pub fn value_to_wire(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => json!({ "nullValue": null }),
        PropertyValue::Boolean(b) => json!({ "booleanValue": b }),
        PropertyValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        PropertyValue::Double(d) => json!({ "doubleValue": encode_double(*d) }),
        PropertyValue::Timestamp(ts) => json!({ "timestampValue": format_timestamp(ts) }),
        PropertyValue::String(s) => json!({ "stringValue": s }),
        PropertyValue::Blob(bytes) => json!({ "blobValue": STANDARD.encode(bytes) }),
        PropertyValue::GeoPoint(point) => {
            let mut inner = Map::new();
            if let Some(lat) = point.latitude {
                inner.insert("latitude".to_string(), encode_double(lat));
            }
            if let Some(lon) = point.longitude {
                inner.insert("longitude".to_string(), encode_double(lon));
            }
            json!({ "geoPointValue": inner })
        }
        PropertyValue::Array(values) => {
            let items: Vec<Value> = values.iter().map(value_to_wire).collect();
            json!({ "arrayValue": { "values": items } })
        }
        PropertyValue::Entity(properties) => {
            json!({ "entityValue": { "properties": properties_to_wire(properties) } })
        }
        PropertyValue::Key(key) => json!({ "keyValue": key_to_wire(key) }),
    }
}

/// Decodes a key object (`partitionId` + `path`)
pub fn key_from_wire(wire: &Value) -> ValueResult<Key> {
    let partition = wire.get("partitionId");
    let project_id = partition
        .and_then(|p| p.get("projectId"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let namespace = partition
        .and_then(|p| p.get("namespaceId"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let elements = wire
        .get("path")
        .and_then(Value::as_array)
        .ok_or_else(|| ValueError::validation("key has no path"))?;

    let path = elements
        .iter()
        .map(path_element_from_wire)
        .collect::<ValueResult<Vec<_>>>()?;

    Key::new(project_id, namespace, path)
}

fn path_element_from_wire(wire: &Value) -> ValueResult<PathElement> {
    let kind = wire
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ValueError::validation("key path element has no kind"))?;

    let id = match (wire.get("id"), wire.get("name")) {
        (Some(id), None) => KeyId::Id(
            decode_integer(id)
                .ok_or_else(|| ValueError::validation(format!("invalid key id {}", id)))?,
        ),
        (None, Some(name)) => KeyId::Name(
            name.as_str()
                .ok_or_else(|| ValueError::validation(format!("invalid key name {}", name)))?
                .to_string(),
        ),
        (Some(_), Some(_)) => {
            return Err(ValueError::validation(format!(
                "key path element '{}' has both id and name",
                kind
            )))
        }
        (None, None) => {
            return Err(ValueError::validation(format!(
                "key path element '{}' is incomplete",
                kind
            )))
        }
    };

    Ok(PathElement {
        kind: kind.to_string(),
        id,
    })
}

/// Encodes a key object
pub fn key_to_wire(key: &Key) -> Value {
    let mut partition = Map::new();
    if !key.project_id().is_empty() {
        partition.insert("projectId".to_string(), json!(key.project_id()));
    }
    if let Some(ns) = key.namespace() {
        partition.insert("namespaceId".to_string(), json!(ns));
    }

    let path: Vec<Value> = key
        .path()
        .iter()
        .map(|el| match &el.id {
            KeyId::Id(id) => json!({ "kind": el.kind, "id": id.to_string() }),
            KeyId::Name(name) => json!({ "kind": el.kind, "name": name }),
        })
        .collect();

    json!({ "partitionId": partition, "path": path })
}

/// Decodes a row: `{"key": .., "properties": {..}}`, optionally wrapped as `{"entity": ..}`
pub fn entity_from_wire(wire: &Value) -> ValueResult<Entity> {
    let wire = wire.get("entity").unwrap_or(wire);
    let key = wire
        .get("key")
        .ok_or_else(|| ValueError::validation("entity has no key"))
        .and_then(key_from_wire)?;
    let properties = properties_from_wire(wire.get("properties"))?;
    Ok(Entity { key, properties })
}

/// Encodes a row
pub fn entity_to_wire(entity: &Entity) -> Value {
    json!({
        "key": key_to_wire(&entity.key),
        "properties": properties_to_wire(&entity.properties),
    })
}

fn properties_from_wire(wire: Option<&Value>) -> ValueResult<Properties> {
    match wire {
        None | Some(Value::Null) => Ok(Properties::new()),
        Some(Value::Object(members)) => members
            .iter()
            .map(|(name, v)| value_from_wire(v).map(|value| (name.clone(), value)))
            .collect(),
        Some(other) => Err(ValueError::validation(format!(
            "properties must be an object, got {}",
            other
        ))),
    }
}

fn properties_to_wire(properties: &Properties) -> Value {
    let members: Map<String, Value> = properties
        .iter()
        .map(|(name, v)| (name.clone(), value_to_wire(v)))
        .collect();
    Value::Object(members)
}

fn decode_integer(wire: &Value) -> Option<i64> {
    match wire {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn decode_double(wire: &Value) -> Option<f64> {
    match wire {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn encode_double(d: f64) -> Value {
    if d.is_nan() {
        json!("NaN")
    } else if d.is_infinite() {
        json!(if d > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        Value::from(d)
    }
}

fn invalid(tag: &str, payload: &Value) -> ValueError {
    ValueError::validation(format!("invalid {} payload: {}", tag, payload))
}

impl Key {
    /// URL-safe token for navigation links (base64 of the wire form)
    pub fn to_url_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(key_to_wire(self).to_string())
    }

    /// Decodes a navigation token produced by `to_url_token`
    pub fn from_url_token(token: &str) -> ValueResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| ValueError::validation(format!("invalid key token: {}", e)))?;
        let wire: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ValueError::validation(format!("invalid key token: {}", e)))?;
        key_from_wire(&wire)
    }
}
