//! Typed parameter values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// Single character
    Char,
    /// Text
    #[serde(rename = "string")]
    Str,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Char => "char",
            ValueType::Str => "string",
        };
        f.write_str(name)
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Character, stored as its character code
    Char(u8),
    /// Text value
    Str(String),
}

impl Value {
    /// Type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Char(_) => ValueType::Char,
            Value::Str(_) => ValueType::Str,
        }
    }

    /// Get as integer, returning None if not an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float, returning None if not a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the character code, returning None if not a character
    pub fn as_char(&self) -> Option<u8> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Get as text, returning None if not a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as it is sent on the wire.
    ///
    /// Characters go out as their decimal character code.
    pub fn to_wire(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{}", *c as char),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_rendering() {
        assert_eq!(Value::Int(-359).to_wire(), "-359");
        assert_eq!(Value::Float(0.00025).to_wire(), "0.00025");
        assert_eq!(Value::Float(50_000_000_000.0).to_wire(), "50000000000");
        assert_eq!(Value::Char(b'A').to_wire(), "65");
        assert_eq!(Value::Str(".".into()).to_wire(), ".");
    }

    #[test]
    fn test_display_shows_character() {
        assert_eq!(Value::Char(b'%').to_string(), "%");
        assert_eq!(Value::Int(7).to_string(), "7");
    }

    #[test]
    fn test_accessors() {
        let value = Value::Float(14.7);
        assert_eq!(value.as_float(), Some(14.7));
        assert_eq!(value.as_int(), None);
        assert_eq!(value.value_type(), ValueType::Float);
    }
}
