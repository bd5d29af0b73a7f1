//! Drive parameters
//!
//! Every configurable value on a BA-Intellidrive is a numbered parameter
//! (`PRM:<id>`) with a fixed type and legal range. This module holds the
//! static description of those parameters and the cast/validate rules that
//! every value must pass before it is sent to the drive.

mod registry;
mod table;
mod value;

pub use registry::{ParameterListing, ParameterRegistry};
pub use value::{Value, ValueType};

use std::fmt;
use thiserror::Error;

/// Parameter id of the serial baud rate (`PRM:90`)
pub const BAUD_RATE_PARAM_ID: u16 = 90;

/// Parameter id of the daisy-chain unit address (`PRM:94`)
pub const UNIT_ADDRESS_PARAM_ID: u16 = 94;

/// Largest integer the drive accepts
pub const INT_MAX: i64 = 2_147_483_647;

/// Smallest integer the drive accepts
pub const INT_MIN: i64 = -2_147_483_647;

/// Errors raised while resolving, converting or range-checking parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Cannot use '{value}' for parameter '{name}': {reason}")]
    Cast {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Value {value} for parameter '{name}' is out of range, expected {bounds}")]
    OutOfRange {
        name: String,
        value: String,
        bounds: String,
    },

    #[error("Invalid parameter table: {0}")]
    InvalidTable(String),
}

/// Type and legal bounds of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Signed integer in `[min, max]`, optionally restricted to a fixed set
    Int {
        min: i64,
        max: i64,
        allowed: Option<&'static [u32]>,
    },
    /// Floating point number in `[min, max]`
    Float { min: f64, max: f64 },
    /// Single character, bounds compared by character code
    Char { min: u8, max: u8 },
    /// Free text, optionally length limited
    Str { max_len: Option<usize> },
}

/// Description of one drive parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Protocol number (`PRM:<id>`)
    pub id: u16,
    /// Human-readable name, unique within a registry
    pub name: &'static str,
    /// Type and bounds
    pub kind: ParamKind,
    /// Factory default
    pub default: Value,
    /// Unit of measurement, if any
    pub units: Option<&'static str>,
    /// Documentation shown in verbose listings
    pub doc: &'static str,
}

impl ParameterSpec {
    /// Integer parameter
    pub fn int(id: u16, name: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self::with_kind(
            id,
            name,
            ParamKind::Int {
                min,
                max,
                allowed: None,
            },
            Value::Int(default),
        )
    }

    /// Floating point parameter
    pub fn float(id: u16, name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self::with_kind(id, name, ParamKind::Float { min, max }, Value::Float(default))
    }

    /// Character parameter
    pub fn char(id: u16, name: &'static str, min: char, max: char, default: char) -> Self {
        Self::with_kind(
            id,
            name,
            ParamKind::Char {
                min: min as u8,
                max: max as u8,
            },
            Value::Char(default as u8),
        )
    }

    /// String parameter
    pub fn string(id: u16, name: &'static str, max_len: Option<usize>, default: &str) -> Self {
        Self::with_kind(
            id,
            name,
            ParamKind::Str { max_len },
            Value::Str(default.to_string()),
        )
    }

    fn with_kind(id: u16, name: &'static str, kind: ParamKind, default: Value) -> Self {
        Self {
            id,
            name,
            kind,
            default,
            units: None,
            doc: "",
        }
    }

    /// Restrict an integer parameter to a fixed set of values
    pub fn allowed(mut self, values: &'static [u32]) -> Self {
        if let ParamKind::Int { allowed, .. } = &mut self.kind {
            *allowed = Some(values);
        }
        self
    }

    /// Attach a unit of measurement
    pub fn units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    /// Attach documentation
    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    /// Declared value type
    pub fn value_type(&self) -> ValueType {
        match self.kind {
            ParamKind::Int { .. } => ValueType::Int,
            ParamKind::Float { .. } => ValueType::Float,
            ParamKind::Char { .. } => ValueType::Char,
            ParamKind::Str { .. } => ValueType::Str,
        }
    }

    /// Lower bound, for ordered types
    pub fn min(&self) -> Option<Value> {
        match self.kind {
            ParamKind::Int { min, .. } => Some(Value::Int(min)),
            ParamKind::Float { min, .. } => Some(Value::Float(min)),
            ParamKind::Char { min, .. } => Some(Value::Char(min)),
            ParamKind::Str { .. } => None,
        }
    }

    /// Upper bound, for ordered types
    pub fn max(&self) -> Option<Value> {
        match self.kind {
            ParamKind::Int { max, .. } => Some(Value::Int(max)),
            ParamKind::Float { max, .. } => Some(Value::Float(max)),
            ParamKind::Char { max, .. } => Some(Value::Char(max)),
            ParamKind::Str { .. } => None,
        }
    }

    /// Allowed value set (only the baud rate parameter has one)
    pub fn allowed_values(&self) -> Option<&'static [u32]> {
        match self.kind {
            ParamKind::Int { allowed, .. } => allowed,
            _ => None,
        }
    }

    /// Maximum length of a string parameter
    pub fn max_len(&self) -> Option<usize> {
        match self.kind {
            ParamKind::Str { max_len } => max_len,
            _ => None,
        }
    }

    /// Name as written in parameter files (spaces replaced by underscores)
    pub fn file_name(&self) -> String {
        self.name.replace(' ', "_")
    }

    /// Convert a value to this parameter's declared type.
    ///
    /// Text is parsed, floats are rounded for integer parameters, and
    /// character parameters accept either a single character or a raw
    /// character code. A single digit is taken as a character, not a code.
    pub fn cast(&self, input: &Value) -> Result<Value, ParamError> {
        let fail = |reason: &str| ParamError::Cast {
            name: self.name.to_string(),
            value: input.to_string(),
            reason: reason.to_string(),
        };

        match self.kind {
            ParamKind::Int { .. } => match input {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Float(f) => round_to_int(*f).ok_or_else(|| fail("expected an integer")),
                Value::Str(s) => parse_int(s).ok_or_else(|| fail("expected an integer")),
                Value::Char(_) => Err(fail("expected an integer")),
            },
            ParamKind::Float { .. } => match input {
                Value::Int(v) => Ok(Value::Float(*v as f64)),
                Value::Float(f) if f.is_finite() => Ok(Value::Float(*f)),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Float)
                    .ok_or_else(|| fail("expected a number")),
                _ => Err(fail("expected a number")),
            },
            ParamKind::Char { .. } => match input {
                Value::Char(c) => Ok(Value::Char(*c)),
                Value::Int(v) => u8::try_from(*v)
                    .map(Value::Char)
                    .map_err(|_| fail("character code must be 0-255")),
                Value::Str(s) => parse_char(s)
                    .map(Value::Char)
                    .ok_or_else(|| fail("expected a single ASCII character or character code")),
                Value::Float(_) => Err(fail("expected a character")),
            },
            ParamKind::Str { max_len } => {
                let text = match input {
                    Value::Char(c) => (*c as char).to_string(),
                    other => other.to_string(),
                };
                if text.is_empty() {
                    return Err(fail("empty string"));
                }
                if text.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(fail("whitespace and control characters are not allowed"));
                }
                if let Some(limit) = max_len {
                    if text.chars().count() > limit {
                        return Err(fail(&format!("longer than {} characters", limit)));
                    }
                }
                Ok(Value::Str(text))
            }
        }
    }

    /// Parse text into this parameter's declared type
    pub fn cast_str(&self, text: &str) -> Result<Value, ParamError> {
        self.cast(&Value::Str(text.to_string()))
    }

    /// Check a cast value against this parameter's bounds
    pub fn validate(&self, value: &Value) -> Result<(), ParamError> {
        let out_of_range = |bounds: String| ParamError::OutOfRange {
            name: self.name.to_string(),
            value: value.to_string(),
            bounds,
        };

        match (self.kind, value) {
            (ParamKind::Int { min, max, allowed }, Value::Int(v)) => {
                if *v < min || *v > max {
                    return Err(out_of_range(format!("[{}, {}]", min, max)));
                }
                if let Some(allowed) = allowed {
                    if !allowed.iter().any(|a| i64::from(*a) == *v) {
                        let list: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
                        return Err(out_of_range(format!("one of {}", list.join(", "))));
                    }
                }
                Ok(())
            }
            (ParamKind::Float { min, max }, Value::Float(v)) => {
                if *v < min || *v > max {
                    return Err(out_of_range(format!("[{}, {}]", min, max)));
                }
                Ok(())
            }
            (ParamKind::Char { min, max }, Value::Char(c)) => {
                if *c < min || *c > max {
                    return Err(out_of_range(format!(
                        "['{}', '{}']",
                        min as char, max as char
                    )));
                }
                Ok(())
            }
            (ParamKind::Str { .. }, Value::Str(_)) => Ok(()),
            (_, other) => Err(ParamError::Cast {
                name: self.name.to_string(),
                value: other.to_string(),
                reason: format!("expected a {} value", self.value_type()),
            }),
        }
    }

    /// Cast then validate, in that order
    pub fn prepare(&self, input: &Value) -> Result<Value, ParamError> {
        let value = self.cast(input)?;
        self.validate(&value)?;
        Ok(value)
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PRM:{} {}", self.id, self.name)
    }
}

fn round_to_int(f: f64) -> Option<Value> {
    if f.is_finite() {
        Some(Value::Int(f.round() as i64))
    } else {
        None
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(v) => Some(Value::Int(v)),
        Err(_) => text.parse::<f64>().ok().and_then(round_to_int),
    }
}

fn parse_char(text: &str) -> Option<u8> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c as u8),
        _ => text.trim().parse::<u8>().ok(),
    }
}
