//! Parameter registry
//!
//! An immutable, id-ordered table of parameter descriptions. The engine holds
//! it behind an `Arc` so callers can share it without copying.

use serde::Serialize;
use std::collections::HashSet;

use super::{table, ParamError, ParameterSpec, ValueType, BAUD_RATE_PARAM_ID};

/// The set of parameters a drive understands
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    specs: Vec<ParameterSpec>,
}

impl ParameterRegistry {
    /// Build a registry from a list of parameter descriptions.
    ///
    /// Fails if ids or names repeat or a default does not satisfy its own
    /// type and bounds.
    pub fn new(mut specs: Vec<ParameterSpec>) -> Result<Self, ParamError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for spec in &specs {
            if !ids.insert(spec.id) {
                return Err(ParamError::InvalidTable(format!(
                    "duplicate parameter id {}",
                    spec.id
                )));
            }
            if !names.insert(spec.name) {
                return Err(ParamError::InvalidTable(format!(
                    "duplicate parameter name '{}'",
                    spec.name
                )));
            }
            spec.prepare(&spec.default).map_err(|e| {
                ParamError::InvalidTable(format!("bad default for {}: {}", spec, e))
            })?;
        }
        specs.sort_by_key(|s| s.id);
        Ok(Self { specs })
    }

    /// The built-in BA-Intellidrive parameter table
    pub fn standard() -> Self {
        let mut specs = table::standard_parameters();
        specs.sort_by_key(|s| s.id);
        Self { specs }
    }

    /// Resolve a parameter by name or by number.
    ///
    /// Names may use underscores in place of spaces, as in parameter files.
    pub fn lookup(&self, key: &str) -> Result<&ParameterSpec, ParamError> {
        let key = key.trim();
        if let Some(spec) = self.by_name(key) {
            return Ok(spec);
        }
        key.parse::<u16>()
            .ok()
            .and_then(|id| self.by_id(id))
            .ok_or_else(|| ParamError::UnknownParameter(key.to_string()))
    }

    /// Find a parameter by its protocol number
    pub fn by_id(&self, id: u16) -> Option<&ParameterSpec> {
        self.specs
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.specs[i])
    }

    /// Find a parameter by name
    pub fn by_name(&self, name: &str) -> Option<&ParameterSpec> {
        let name = name.replace('_', " ");
        let name = if name == "baudrate" { "baud rate" } else { name.as_str() };
        self.specs.iter().find(|s| s.name == name)
    }

    /// Iterate over all parameters in id order
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterSpec> {
        self.specs.iter()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry has no parameters
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The baud rate parameter, if this registry has one
    pub fn baud_rate(&self) -> Option<&ParameterSpec> {
        self.by_id(BAUD_RATE_PARAM_ID)
    }

    /// Baud rates the drive can be configured for, in ascending order
    pub fn allowed_baud_rates(&self) -> &'static [u32] {
        self.baud_rate()
            .and_then(|spec| spec.allowed_values())
            .unwrap_or(&[])
    }

    /// Flattened description of every parameter, for dumps and listings
    pub fn listing(&self) -> Vec<ParameterListing> {
        self.specs.iter().map(ParameterListing::from).collect()
    }
}

impl<'a> IntoIterator for &'a ParameterRegistry {
    type Item = &'a ParameterSpec;
    type IntoIter = std::slice::Iter<'a, ParameterSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// One row of a parameter listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterListing {
    pub id: u16,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    pub doc: String,
}

impl From<&ParameterSpec> for ParameterListing {
    fn from(spec: &ParameterSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.to_string(),
            value_type: spec.value_type(),
            min: spec.min().map(|v| v.to_string()),
            max: spec.max().map(|v| v.to_string()),
            default: spec.default.to_string(),
            units: spec.units.map(str::to_string),
            allowed: spec.allowed_values().map(<[u32]>::to_vec),
            max_len: spec.max_len(),
            doc: spec.doc.to_string(),
        }
    }
}
