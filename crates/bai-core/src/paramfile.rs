//! Parameter files
//!
//! Plain text, one parameter per line:
//!
//! ```text
//! PRM:0:   KP                       750000
//! PRM:90:  baud_rate                9600
//! ```
//!
//! Names use underscores in place of spaces so each line splits into exactly
//! three fields. Blank lines and lines starting with `#` are ignored.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::params::{ParamError, ParameterRegistry, ParameterSpec, Value, BAUD_RATE_PARAM_ID};
use crate::protocol::{Address, Drive, ProtocolError, Transport};

/// Errors reading, writing or applying a parameter file
#[derive(Error, Debug)]
pub enum ParamFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected 'PRM:<id>: <name> <value>', found '{text}'")]
    Format { line: usize, text: String },

    #[error("line {line}: {source}")]
    Param {
        line: usize,
        #[source]
        source: ParamError,
    },

    #[error("line {line}: PRM:{id} is not parameter '{name}'")]
    IdMismatch { line: usize, id: u16, name: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One line of a parameter file, not yet checked against a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// 1-based line number
    pub line: usize,
    pub id: u16,
    pub name: String,
    pub value: String,
}

/// Render a value the way it appears in a file.
///
/// Characters are written as themselves when printable, otherwise as their
/// decimal code.
pub fn file_value(value: &Value) -> String {
    match value {
        Value::Char(c) if c.is_ascii_graphic() => (*c as char).to_string(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

/// Format one parameter line (without the newline)
pub fn format_entry(spec: &ParameterSpec, value: &Value) -> String {
    format!(
        "{:<8} {:<24} {}",
        format!("PRM:{}:", spec.id),
        spec.file_name(),
        file_value(value)
    )
}

/// Write parameter lines
pub fn write_parameter_file<'a, W, I>(writer: &mut W, entries: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a ParameterSpec, &'a Value)>,
{
    for (spec, value) in entries {
        writeln!(writer, "{}", format_entry(spec, value))?;
    }
    writer.flush()
}

/// Split a parameter file into entries
pub fn read_parameter_file(text: &str) -> Result<Vec<FileEntry>, ParamFileError> {
    let mut entries = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let format_error = || ParamFileError::Format {
            line,
            text: trimmed.to_string(),
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [tag, name, value] = fields.as_slice() else {
            return Err(format_error());
        };
        let id = tag
            .strip_prefix("PRM:")
            .and_then(|rest| rest.strip_suffix(':'))
            .and_then(|num| num.parse::<u16>().ok())
            .ok_or_else(format_error)?;

        entries.push(FileEntry {
            line,
            id,
            name: name.replace('_', " "),
            value: value.to_string(),
        });
    }
    Ok(entries)
}

/// Resolve, cast and validate every entry. Fails on the first bad line.
pub fn resolve_entries(
    registry: &ParameterRegistry,
    entries: &[FileEntry],
) -> Result<Vec<(ParameterSpec, Value)>, ParamFileError> {
    entries
        .iter()
        .map(|entry| {
            let line = entry.line;
            let spec = registry
                .lookup(&entry.name)
                .map_err(|source| ParamFileError::Param { line, source })?;
            if spec.id != entry.id {
                return Err(ParamFileError::IdMismatch {
                    line,
                    id: entry.id,
                    name: entry.name.clone(),
                });
            }
            let value = spec
                .prepare(&Value::Str(entry.value.clone()))
                .map_err(|source| ParamFileError::Param { line, source })?;
            Ok((spec.clone(), value))
        })
        .collect()
}

/// Write every parameter's factory default to a file
pub fn export_defaults(registry: &ParameterRegistry, path: &Path) -> Result<(), ParamFileError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_parameter_file(&mut writer, registry.iter().map(|spec| (spec, &spec.default)))?;
    info!(path = %path.display(), count = registry.len(), "defaults written");
    Ok(())
}

impl<T: Transport> Drive<T> {
    /// Read every parameter from the drive and write them to a file
    pub fn export_parameters(
        &mut self,
        path: &Path,
        address: Option<Address>,
    ) -> Result<Vec<(ParameterSpec, Value)>, ParamFileError> {
        let values = self.read_all(address)?;
        let mut writer = BufWriter::new(File::create(path)?);
        write_parameter_file(&mut writer, values.iter().map(|(spec, value)| (spec, value)))?;
        info!(path = %path.display(), count = values.len(), "parameters written");
        Ok(values)
    }

    /// Write the parameters in a file to the drive.
    ///
    /// Every line is checked before anything is sent. A unit address line
    /// moves the remaining writes to the new address. Returns true when the
    /// drive's baud rate setting changed, which takes effect only after a
    /// save and reset.
    pub fn import_parameters(
        &mut self,
        path: &Path,
        address: Option<Address>,
    ) -> Result<bool, ParamFileError> {
        let text = std::fs::read_to_string(path)?;
        let entries = read_parameter_file(&text)?;
        let registry = Arc::clone(self.registry());
        let values = resolve_entries(&registry, &entries)?;

        let mut target = self.resolve(address);
        let mut baud_changed = false;
        for (spec, value) in &values {
            if spec.id == BAUD_RATE_PARAM_ID {
                let current = self.read_parameter(spec, Some(target))?;
                baud_changed = current != *value;
            }
            debug!(param = %spec, value = %value, "writing from file");
            self.write_parameter(spec, value, Some(target), true)?;
            self.follow_unit_address(spec, value, address, &mut target)?;
        }

        info!(path = %path.display(), count = values.len(), "parameters loaded");
        Ok(baud_changed)
    }
}
