//! Runtime values for mapped types
//!
//! A [`TypedValue`] is an instance of a mapped complex type: an ordered
//! set of named fields holding [`Value`]s. Field order mirrors the
//! canonical order of the type's descriptors, so encoding can walk the
//! fields without re-sorting.

use crate::coercion;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A single runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text content
    String(String),
    /// Boolean
    Bool(bool),
    /// Integer (covers xs:int and xs:long)
    Int(i64),
    /// Floating point (covers xs:float and xs:double)
    Float(f64),
    /// Instant in time, normalized to UTC
    DateTime(DateTime<Utc>),
    /// Binary content
    Bytes(Vec<u8>),
    /// Instance of a mapped complex type
    Complex(TypedValue),
    /// Repeated values of one element
    Array(Vec<Value>),
}

impl Value {
    /// Human-readable name of this value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::DateTime(_) => "dateTime",
            Value::Bytes(_) => "bytes",
            Value::Complex(_) => "complex",
            Value::Array(_) => "array",
        }
    }

    /// Get the string content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer, if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float, if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the instant, if this is a dateTime
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Get the bytes, if this is binary content
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the complex instance, if this is one
    pub fn as_complex(&self) -> Option<&TypedValue> {
        match self {
            Value::Complex(tv) => Some(tv),
            _ => None,
        }
    }

    /// Get the complex instance mutably, if this is one
    pub fn as_complex_mut(&mut self) -> Option<&mut TypedValue> {
        match self {
            Value::Complex(tv) => Some(tv),
            _ => None,
        }
    }

    /// Get the element list, if this is an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the element list mutably, if this is an array
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// JSON rendering for inspection output
    ///
    /// Non-finite floats fall back to their wire spelling since JSON has
    /// no representation for them. Binary content renders as base64.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => serde_json::Value::String(coercion::render_float(*f)),
            },
            Value::DateTime(dt) => serde_json::Value::String(coercion::render_datetime(dt)),
            Value::Bytes(b) => serde_json::Value::String(coercion::render_base64(b)),
            Value::Complex(tv) => tv.to_json(),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        Value::Complex(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

/// An instance of a mapped complex type
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    /// Mapped type name this instance belongs to
    pub type_name: String,
    /// Fields in canonical order, keyed by field identifier
    pub fields: IndexMap<String, Value>,
}

impl TypedValue {
    /// Create an empty instance of the named type
    pub fn new(type_name: impl Into<String>) -> Self {
        TypedValue {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field, appending it if not yet present
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Get a field by identifier
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field mutably by identifier
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Field identifiers in canonical order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields present
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// JSON rendering for inspection output, fields in canonical order
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(42i64).as_int(), Some(42));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("hello").as_int(), None);
        assert!(Value::Array(vec![]).is_array());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::from("x").kind_name(), "string");
        assert_eq!(Value::from(1i64).kind_name(), "integer");
        assert_eq!(Value::Array(vec![]).kind_name(), "array");
    }

    #[test]
    fn test_typed_value_field_order() {
        let tv = TypedValue::new("Order")
            .with_field("id", 7i64)
            .with_field("label", "first")
            .with_field("urgent", true);

        let names: Vec<&str> = tv.field_names().collect();
        assert_eq!(names, vec!["id", "label", "urgent"]);
        assert_eq!(tv.get("label").and_then(Value::as_str), Some("first"));
        assert_eq!(tv.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut tv = TypedValue::new("Order")
            .with_field("id", 1i64)
            .with_field("label", "a");
        tv.set("id", 2i64);

        let names: Vec<&str> = tv.field_names().collect();
        assert_eq!(names, vec!["id", "label"]);
        assert_eq!(tv.get("id").and_then(Value::as_int), Some(2));
    }

    #[test]
    fn test_to_json() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let tv = TypedValue::new("Order")
            .with_field("id", 7i64)
            .with_field("when", dt)
            .with_field("payload", b"Hi".to_vec())
            .with_field(
                "items",
                Value::Array(vec![Value::from("a"), Value::from("b")]),
            );

        let json = tv.to_json();
        assert_eq!(json["id"], serde_json::json!(7));
        assert_eq!(json["when"], serde_json::json!("2024-01-15T10:30:00+00:00"));
        assert_eq!(json["payload"], serde_json::json!("SGk="));
        assert_eq!(json["items"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_non_finite_float_json() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::json!("NaN"));
        assert_eq!(
            Value::Float(f64::INFINITY).to_json(),
            serde_json::json!("INF")
        );
    }
}
