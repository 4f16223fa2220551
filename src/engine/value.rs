// SPDX-License-Identifier: MIT

//! Typed runtime values
//!
//! Every value carries its type tag in the enum discriminant. Values serialize
//! adjacently tagged, e.g. `{"type": "int64", "value": 42}`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Array,
    Set,
    Map,
    Struct,
    /// Host functions live in the environment registry, never inside a value
    Function,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int8 => "int8",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Uint8 => "uint8",
            ValueType::Uint16 => "uint16",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Set => "set",
            ValueType::Map => "map",
            ValueType::Struct => "struct",
            ValueType::Function => "function",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Int8
                | ValueType::Int16
                | ValueType::Int32
                | ValueType::Int64
                | ValueType::Uint8
                | ValueType::Uint16
                | ValueType::Uint32
                | ValueType::Uint64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ValueType::Float32 | ValueType::Float64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value produced by literal parsing, by the environment or by evaluation
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Array(Vec<Value>),
    /// Unordered collection without duplicates, see [`Value::set`]
    Set(#[serde(deserialize_with = "unique_items")] Vec<Value>),
    Map(BTreeMap<String, Value>),
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// Build a set value, dropping structurally equal duplicates
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(unique(items))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int8(_) => ValueType::Int8,
            Value::Int16(_) => ValueType::Int16,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Uint8(_) => ValueType::Uint8,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Float32(_) => ValueType::Float32,
            Value::Float64(_) => ValueType::Float64,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Set(_) => ValueType::Set,
            Value::Map(_) => ValueType::Map,
            Value::Struct(_) => ValueType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_integer(&self) -> bool {
        self.value_type().is_integer()
    }

    pub fn is_numeric(&self) -> bool {
        self.value_type().is_numeric()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload widened to `i128`, which holds every supported width exactly
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int8(n) => Some(i128::from(*n)),
            Value::Int16(n) => Some(i128::from(*n)),
            Value::Int32(n) => Some(i128::from(*n)),
            Value::Int64(n) => Some(i128::from(*n)),
            Value::Uint8(n) => Some(i128::from(*n)),
            Value::Uint16(n) => Some(i128::from(*n)),
            Value::Uint32(n) => Some(i128::from(*n)),
            Value::Uint64(n) => Some(i128::from(*n)),
            _ => None,
        }
    }

    /// Numeric payload promoted to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(n) => Some(f64::from(*n)),
            Value::Float64(n) => Some(*n),
            // i128 -> f64 rounds to nearest for values beyond 2^53
            other => other.as_i128().map(|n| n as f64),
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Field of a map or struct value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) | Value::Struct(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Set a field on a map or struct value, returning the previous field value.
    ///
    /// Returns `None` without storing anything when `self` is not a map or struct.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        match self {
            Value::Map(entries) | Value::Struct(entries) => entries.insert(key.into(), value),
            _ => None,
        }
    }

    /// Convert to plain JSON, dropping the type tags
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int8(n) => Json::from(*n),
            Value::Int16(n) => Json::from(*n),
            Value::Int32(n) => Json::from(*n),
            Value::Int64(n) => Json::from(*n),
            Value::Uint8(n) => Json::from(*n),
            Value::Uint16(n) => Json::from(*n),
            Value::Uint32(n) => Json::from(*n),
            Value::Uint64(n) => Json::from(*n),
            // Non-finite floats have no JSON form and become null
            Value::Float32(n) => Json::from(f64::from(*n)),
            Value::Float64(n) => Json::from(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) | Value::Set(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) | Value::Struct(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Structural equality over every tag combination.
///
/// Numbers compare by value regardless of width (NaN is never equal). Arrays
/// compare element-wise in order. Sets ignore order and duplicates. Maps and
/// structs compare keys and values. Any other pair of different tags is unequal.
pub fn structural_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| structural_eq(x, y))
        }
        (Value::Set(a), Value::Set(b)) => covers(a, b) && covers(b, a),
        (Value::Map(a), Value::Map(b)) | (Value::Struct(a), Value::Struct(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| structural_eq(x, y)))
        }
        (a, b) if a.is_integer() && b.is_integer() => a.as_i128() == b.as_i128(),
        (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

/// Every element of `items` has an equal element in `other`
fn covers(items: &[Value], other: &[Value]) -> bool {
    items
        .iter()
        .all(|x| other.iter().any(|y| structural_eq(x, y)))
}

fn unique(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

fn unique_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(unique)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int8(n) => write!(f, "{}", n),
            Value::Int16(n) => write!(f, "{}", n),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}", n),
            Value::Uint8(n) => write!(f, "{}", n),
            Value::Uint16(n) => write!(f, "{}", n),
            Value::Uint32(n) => write!(f, "{}", n),
            Value::Uint64(n) => write!(f, "{}", n),
            Value::Float32(n) => write!(f, "{}", n),
            Value::Float64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Value::Map(entries) | Value::Struct(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    write_nested(f, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_nested(f, item)?;
    }
    Ok(())
}

// Strings inside containers are quoted so `["a, b"]` and `["a", "b"]` differ
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{:?}", s),
        other => write!(f, "{}", other),
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// JSON numbers become `int64` when they fit, then `uint64`, then `float64`
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Null.value_type(), ValueType::Null);
        assert_eq!(Value::from(true).value_type(), ValueType::Bool);
        assert_eq!(Value::from(1i8).value_type(), ValueType::Int8);
        assert_eq!(Value::from(1u32).value_type(), ValueType::Uint32);
        assert_eq!(Value::from(1.5f32).value_type(), ValueType::Float32);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(Value::set(vec![]).value_type(), ValueType::Set);
        assert_eq!(
            Value::Struct(BTreeMap::new()).value_type(),
            ValueType::Struct
        );
    }

    #[test]
    fn test_numeric_equality_across_widths() {
        assert_eq!(Value::Int32(7), Value::Int64(7));
        assert_eq!(Value::Uint8(7), Value::Float64(7.0));
        assert_ne!(Value::Int64(-1), Value::Uint64(u64::MAX));
        assert_ne!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
    }

    #[test]
    fn test_different_tags_are_unequal() {
        assert_ne!(Value::from("1"), Value::Int64(1));
        assert_ne!(Value::Null, Value::Bool(false));
        assert_ne!(
            Value::Array(vec![Value::Int64(1)]),
            Value::set(vec![Value::Int64(1)])
        );
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::from(json!({"tags": ["a", "b"], "n": 1}));
        let b = Value::from(json!({"n": 1.0, "tags": ["a", "b"]}));
        let c = Value::from(json!({"n": 1, "tags": ["b", "a"]}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_set_ignores_order_and_duplicates() {
        let s = Value::set(vec![Value::from(1i64), Value::from(2i64), Value::from(1i64)]);
        assert_eq!(s.as_array().map(<[Value]>::len), Some(2));
        assert_eq!(s, Value::set(vec![Value::from(2i64), Value::from(1i64)]));
    }

    #[test]
    fn test_deserialized_set_drops_duplicates() {
        let s: Value = serde_json::from_value(json!({
            "type": "set",
            "value": [
                {"type": "int64", "value": 1},
                {"type": "int64", "value": 1},
                {"type": "int64", "value": 2}
            ]
        }))
        .unwrap();
        assert_eq!(s.as_array().map(<[Value]>::len), Some(2));

        let other = Value::Set(vec![Value::from(1i64), Value::from(2i64), Value::from(3i64)]);
        assert_ne!(s, other);
        assert_ne!(other, s);
    }

    #[test]
    fn test_set_equality_checks_both_sides() {
        let ints = |xs: &[i64]| Value::Set(xs.iter().copied().map(Value::from).collect());
        let with_duplicates = ints(&[1, 1, 2]);
        let wider = ints(&[1, 2, 3]);
        assert_ne!(with_duplicates, wider);
        assert_ne!(wider, with_duplicates);
        assert_eq!(with_duplicates, Value::set(vec![Value::from(2i64), Value::from(1i64)]));
    }

    #[test]
    fn test_get_and_set_field() {
        let mut v = Value::from(json!({"a": 1}));
        assert_eq!(v.get("a"), Some(&Value::Int64(1)));
        assert_eq!(v.set_field("b", Value::from("x")), None);
        assert_eq!(v.get("b"), Some(&Value::from("x")));
        assert_eq!(v.set_field("a", Value::Null), Some(Value::Int64(1)));

        let mut scalar = Value::Int64(3);
        assert_eq!(scalar.set_field("a", Value::Null), None);
        assert_eq!(scalar.get("a"), None);
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(5)).value_type(), ValueType::Int64);
        assert_eq!(
            Value::from(json!(u64::MAX)).value_type(),
            ValueType::Uint64
        );
        assert_eq!(Value::from(json!(2.5)).value_type(), ValueType::Float64);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float64(3.0).to_string(), "3");
        assert_eq!(Value::Float64(2.5).to_string(), "2.5");
        assert_eq!(Value::from(json!(["a", 1, null])).to_string(), r#"["a", 1, null]"#);
        assert_eq!(Value::from(json!({"k": "v"})).to_string(), r#"{k: "v"}"#);
    }

    #[test]
    fn test_serde_tagging() {
        let v = Value::Int32(4);
        let encoded = serde_json::to_value(&v).unwrap();
        assert_eq!(encoded, json!({"type": "int32", "value": 4}));

        let decoded: Value = serde_json::from_value(json!({"type": "null"})).unwrap();
        assert!(decoded.is_null());

        let nested: Value = serde_json::from_value(json!({
            "type": "array",
            "value": [{"type": "string", "value": "x"}]
        }))
        .unwrap();
        assert_eq!(nested, Value::Array(vec![Value::from("x")]));
    }

    #[test]
    fn test_to_json_drops_tags() {
        let v = Value::from(json!({"a": [1, "two", true]}));
        assert_eq!(v.to_json(), json!({"a": [1, "two", true]}));
    }
}
