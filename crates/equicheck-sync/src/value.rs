//! Firestore typed-value codec.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type:
//!
//! | JSON            | Firestore                                  |
//! |-----------------|--------------------------------------------|
//! | `null`          | `{"nullValue": null}`                      |
//! | `true`          | `{"booleanValue": true}`                   |
//! | `42`            | `{"integerValue": "42"}` (int64 as string) |
//! | `4.2`           | `{"doubleValue": 4.2}`                     |
//! | `"s"`           | `{"stringValue": "s"}`                     |
//! | `[..]`          | `{"arrayValue": {"values": [..]}}`         |
//! | `{..}`          | `{"mapValue": {"fields": {..}}}`           |
//!
//! On decode, `timestampValue` and `referenceValue` become strings and
//! `geoPointValue` becomes a `{latitude, longitude}` object. An empty array or
//! map may arrive with `values`/`fields` omitted.

use serde_json::{Map, Number, Value, json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected a single-key typed value, got {0}")]
    NotTyped(String),

    #[error("unsupported value type {0:?}")]
    UnsupportedType(String),

    #[error("invalid {kind}: {detail}")]
    Invalid { kind: &'static str, detail: String },
}

/// Encode a JSON value as a Firestore `Value`.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            // u64 beyond i64 range does not fit Firestore's int64.
            (None, Some(u)) => json!({ "doubleValue": u as f64 }),
            (None, None) => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every entry of a JSON object, giving a document `fields` map.
pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), encode(v))).collect()
}

/// Decode a Firestore `Value` into plain JSON.
pub fn decode(value: &Value) -> Result<Value, CodecError> {
    let obj = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| CodecError::NotTyped(value.to_string()))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| CodecError::NotTyped(value.to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid("booleanValue", inner)),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| invalid("string", inner)),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => match inner.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(values)) => values
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(other) => Err(invalid("arrayValue", other)),
        },
        "mapValue" => match inner.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(invalid("mapValue", other)),
        },
        other => Err(CodecError::UnsupportedType(other.to_string())),
    }
}

/// Decode a document `fields` map into a JSON object.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, CodecError> {
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|d| (k.clone(), d)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value, CodecError> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|i| Value::Number(i.into()))
        .ok_or_else(|| invalid("integerValue", inner))
}

fn decode_double(inner: &Value) -> Result<Value, CodecError> {
    let parsed = match inner {
        Value::Number(n) => n.as_f64(),
        // "NaN" / "Infinity" have no JSON representation.
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| invalid("doubleValue", inner))
}

fn invalid(kind: &'static str, value: &Value) -> CodecError {
    CodecError::Invalid {
        kind,
        detail: value.to_string(),
    }
}
