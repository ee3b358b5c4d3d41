//! Conversion between [`DynamicValue`] and the wire value representation.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::codec::value::{DynamicValue, Parameters};

/// Protocol representation of a single value.
pub type WireValue = Value;

/// Protocol representation of a struct (string-keyed value map).
pub type WireMap = Map<String, Value>;

/// Largest magnitude below which every integer is exact in an f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Errors raised while converting values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value has no wire representation. `key` is the path of the
    /// offending value (`""` for a bare value, `order.items[2]` when nested).
    #[error("unsupported value type at `{key}`: {reason}")]
    UnsupportedValueType { key: String, reason: String },

    /// A dynamic value could not be turned into the requested native type.
    #[error("value conversion failed: {0}")]
    Conversion(#[source] serde_json::Error),
}

/// Encode a dynamic value into its wire form.
pub fn encode(value: &DynamicValue) -> Result<WireValue, CodecError> {
    encode_at(value, "")
}

/// Decode a wire value. Every wire value has a dynamic counterpart.
pub fn decode(value: &WireValue) -> DynamicValue {
    match value {
        Value::Null => DynamicValue::Null,
        Value::Bool(b) => DynamicValue::Bool(*b),
        Value::Number(n) => DynamicValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) => DynamicValue::String(s.clone()),
        Value::Array(items) => DynamicValue::List(items.iter().map(decode).collect()),
        Value::Object(map) => DynamicValue::Map(decode_map(map)),
    }
}

/// Encode a parameter map. Returns the first failure; no partial map escapes.
pub fn encode_map(map: &Parameters) -> Result<WireMap, CodecError> {
    let mut out = WireMap::new();
    for (key, value) in map {
        out.insert(key.clone(), encode_at(value, key)?);
    }
    Ok(out)
}

/// Decode a wire struct into a parameter map.
pub fn decode_map(map: &WireMap) -> Parameters {
    map.iter().map(|(k, v)| (k.clone(), decode(v))).collect()
}

fn encode_at(value: &DynamicValue, path: &str) -> Result<WireValue, CodecError> {
    Ok(match value {
        DynamicValue::Null => Value::Null,
        DynamicValue::Bool(b) => Value::Bool(*b),
        DynamicValue::Number(n) => Value::Number(encode_number(*n, path)?),
        DynamicValue::String(s) => Value::String(s.clone()),
        DynamicValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(encode_at(item, &format!("{}[{}]", path, i))?);
            }
            Value::Array(out)
        }
        DynamicValue::Map(map) => {
            let mut out = WireMap::new();
            for (key, item) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                out.insert(key.clone(), encode_at(item, &child)?);
            }
            Value::Object(out)
        }
    })
}

/// Integral doubles in the exact range are written without a fraction,
/// matching the protocol encoder. Negative zero keeps its float form.
fn encode_number(n: f64, path: &str) -> Result<Number, CodecError> {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER && !(n == 0.0 && n.is_sign_negative()) {
        return Ok(Number::from(n as i64));
    }
    Number::from_f64(n).ok_or_else(|| CodecError::UnsupportedValueType {
        key: path.to_string(),
        reason: format!("non-finite number {}", n),
    })
}
