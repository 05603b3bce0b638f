use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// Represents a single data value stored in a record.
///
/// This enum wraps all supported Rust types into a single type that is used
/// uniformly by records, filter clauses and set clauses. It serializes
/// untagged so the persisted JSON keeps the natural number/string/bool shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64-bit signed integer value.
    Int(i64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    Text(Arc<str>),
    /// A boolean value.
    Bool(bool),
}

impl Value {
    /// Returns the inner integer value if this is a [Value::Int].
    /// Otherwise, returns `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    /// Otherwise, returns `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner boolean value if this is a [Value::Bool].
    /// Otherwise, returns `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the logical [DataType] corresponding to this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Text(_) => DataType::Text,
            Self::Bool(_) => DataType::Bool,
        }
    }

    /// Guesses a typed literal from command-line text.
    ///
    /// Quoted text (single or double quotes) is always [Value::Text],
    /// `true`/`false` become booleans, base-10 integers become [Value::Int]
    /// and anything else is kept as bare text.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();

        let quoted = raw.len() >= 2
            && ((raw.starts_with('"') && raw.ends_with('"'))
                || (raw.starts_with('\'') && raw.ends_with('\'')));
        if quoted {
            return Self::Text(raw[1..raw.len() - 1].into());
        }

        match raw.to_lowercase().as_str() {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }

        raw.parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Text(raw.into()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : accessors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Text("42".into()).as_int(), None);

        assert_eq!(Value::Text("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::Bool(true).as_str(), None);

        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : data_type
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_data_type() {
        assert_eq!(Value::Int(1).data_type(), DataType::Int);
        assert_eq!(Value::Text("x".into()).data_type(), DataType::Text);
        assert_eq!(Value::Bool(true).data_type(), DataType::Bool);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : no cross-type equality
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int(10), Value::Int(10));
        assert_ne!(Value::Int(10), Value::Int(20));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::Int(28), Value::Text("28".into()));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : JSON keeps the type
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_serde_untagged() {
        let values = vec![Value::Int(7), Value::Text("7".into()), Value::Bool(true)];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[7,"7",true]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : literal parsing
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("28"), Value::Int(28));
        assert_eq!(Value::parse_literal(" -3 "), Value::Int(-3));
        assert_eq!(Value::parse_literal("True"), Value::Bool(true));
        assert_eq!(Value::parse_literal("false"), Value::Bool(false));
        assert_eq!(Value::parse_literal("\"28\""), Value::Text("28".into()));
        assert_eq!(Value::parse_literal("'true'"), Value::Text("true".into()));
        assert_eq!(Value::parse_literal("John"), Value::Text("John".into()));
        assert_eq!(Value::parse_literal("'"), Value::Text("'".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-5).to_string(), "-5");
        assert_eq!(Value::Text("abc".into()).to_string(), "abc");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
