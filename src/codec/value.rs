//! The dynamic value model exposed to handlers.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::convert::{decode, encode, CodecError};

/// String-keyed parameter map (session parameters, form parameters, payload).
pub type Parameters = HashMap<String, DynamicValue>;

/// A JSON-like value with a closed set of shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<DynamicValue>),
    Map(Parameters),
}

impl DynamicValue {
    /// Name of the shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Number(_) => "number",
            DynamicValue::String(_) => "string",
            DynamicValue::List(_) => "list",
            DynamicValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Parameters> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consume the value, returning the map if it is one.
    pub fn into_map(self) -> Option<Parameters> {
        match self {
            DynamicValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert any serializable native value into the dynamic model.
    ///
    /// Fails with [`CodecError::UnsupportedValueType`] when the value has no
    /// JSON shape (non-string map keys, non-finite floats).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        let wire = serde_json::to_value(value).map_err(|e| CodecError::UnsupportedValueType {
            key: String::new(),
            reason: e.to_string(),
        })?;
        Ok(decode(&wire))
    }

    /// Convert the dynamic value into a native type.
    pub fn to_native<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let wire = encode(self)?;
        serde_json::from_value(wire).map_err(CodecError::Conversion)
    }
}

impl fmt::Display for DynamicValue {
    /// Strings render bare; everything else renders as JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Null => f.write_str("null"),
            DynamicValue::Bool(b) => write!(f, "{}", b),
            DynamicValue::Number(n) => write!(f, "{}", n),
            DynamicValue::String(s) => f.write_str(s),
            other => match encode(other) {
                Ok(wire) => write!(f, "{}", wire),
                Err(_) => write!(f, "<{}>", other.kind()),
            },
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

impl From<f64> for DynamicValue {
    fn from(n: f64) -> Self {
        DynamicValue::Number(n)
    }
}

impl From<f32> for DynamicValue {
    fn from(n: f32) -> Self {
        DynamicValue::Number(n.into())
    }
}

impl From<i32> for DynamicValue {
    fn from(n: i32) -> Self {
        DynamicValue::Number(n.into())
    }
}

impl From<u32> for DynamicValue {
    fn from(n: u32) -> Self {
        DynamicValue::Number(n.into())
    }
}

impl From<i64> for DynamicValue {
    fn from(n: i64) -> Self {
        DynamicValue::Number(n as f64)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        DynamicValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Parameters> for DynamicValue {
    fn from(map: Parameters) -> Self {
        DynamicValue::Map(map)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Order {
        size: String,
        quantity: u32,
        gift: bool,
    }

    #[test]
    fn display_renders_strings_bare() {
        assert_eq!(DynamicValue::from("red").to_string(), "red");
        assert_eq!(DynamicValue::from(2).to_string(), "2");
        assert_eq!(DynamicValue::from(6.3).to_string(), "6.3");
        assert_eq!(DynamicValue::from(vec!["a", "b"]).to_string(), r#"["a","b"]"#);
    }

    #[test]
    fn option_none_is_null() {
        let v: DynamicValue = Option::<&str>::None.into();
        assert!(v.is_null());
    }

    #[test]
    fn native_struct_round_trips() {
        let order = Order { size: "large".into(), quantity: 3, gift: true };
        let value = DynamicValue::from_serialize(&order).unwrap();

        let map = value.as_map().unwrap();
        assert_eq!(map.get("size"), Some(&DynamicValue::from("large")));
        assert_eq!(map.get("quantity"), Some(&DynamicValue::Number(3.0)));

        let back: Order = value.to_native().unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn non_string_keys_are_unsupported() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8, 2], "x");
        let err = DynamicValue::from_serialize(&bad).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedValueType { .. }));
    }
}
