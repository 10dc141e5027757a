//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "Foo"}` or `{"integerValue": "42"}` (64-bit
//! integers travel as strings).

use serde_json::{Map, Number, Value, json};

use crate::error::StoreError;
use crate::types::Fields;

/// Encodes a JSON value as a Firestore typed value.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                // Beyond i64: Firestore integers are signed, keep precision as double.
                json!({ "doubleValue": u as f64 })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes a document body.
pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect();
    Value::Object(encoded)
}

/// Decodes a Firestore typed value into plain JSON.
pub fn decode(value: &Value) -> Result<Value, StoreError> {
    let Some(obj) = value.as_object() else {
        return Err(StoreError::InvalidDocument(format!(
            "typed value is not an object: {value}"
        )));
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Err(StoreError::InvalidDocument("empty typed value".into()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid(kind, inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| invalid(kind, inner))
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(kind, inner))
        }
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| invalid(kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .map(decode_fields)
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::InvalidDocument(format!(
            "unsupported value type: {other}"
        ))),
    }
}

/// Decodes a document's `fields` object.
pub fn decode_fields(fields: &Value) -> Result<Fields, StoreError> {
    let Some(map) = fields.as_object() else {
        return Err(StoreError::InvalidDocument("fields is not an object".into()));
    };
    map.iter()
        .map(|(k, v)| decode(v).map(|d| (k.clone(), d)))
        .collect()
}

fn invalid(kind: &str, inner: &Value) -> StoreError {
    StoreError::InvalidDocument(format!("bad {kind}: {inner}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_game_document() {
        let doc = json!({
            "title": "Foo",
            "externalId": 42,
            "rating": 4.5,
            "platform": "Unknown"
        });
        let encoded = encode_fields(doc.as_object().unwrap());

        assert_eq!(encoded["title"], json!({ "stringValue": "Foo" }));
        assert_eq!(encoded["externalId"], json!({ "integerValue": "42" }));
        assert_eq!(encoded["rating"], json!({ "doubleValue": 4.5 }));
    }

    #[test]
    fn decodes_integer_from_string() {
        let v = decode(&json!({ "integerValue": "42" })).unwrap();
        assert_eq!(v, json!(42));
    }

    #[test]
    fn decodes_nested_map_and_array() {
        let typed = json!({
            "mapValue": { "fields": {
                "tags": { "arrayValue": { "values": [
                    { "stringValue": "rpg" },
                    { "booleanValue": true }
                ]}},
                "missing": { "nullValue": null }
            }}
        });
        let v = decode(&typed).unwrap();
        assert_eq!(v, json!({ "tags": ["rpg", true], "missing": null }));
    }

    #[test]
    fn empty_array_value_decodes() {
        let v = decode(&json!({ "arrayValue": {} })).unwrap();
        assert_eq!(v, json!([]));
    }

    #[test]
    fn timestamp_decodes_as_string() {
        let v = decode(&json!({ "timestampValue": "2024-01-01T00:00:00Z" })).unwrap();
        assert_eq!(v, json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = decode(&json!({ "fancyValue": 1 })).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[test]
    fn bad_integer_is_rejected() {
        assert!(decode(&json!({ "integerValue": "forty-two" })).is_err());
    }

    #[test]
    fn encode_then_decode_preserves_document() {
        let doc = json!({
            "title": "Foo",
            "externalId": 42,
            "rating": null,
            "screens": ["a", "b"]
        });
        let map = doc.as_object().unwrap();
        let back = decode_fields(&encode_fields(map)).unwrap();
        assert_eq!(Value::Object(back), doc);
    }
}
