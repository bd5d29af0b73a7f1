//! Layered command line options
//!
//! Options come from four layers, later ones winning:
//! built-in defaults, `~/.bai_options.toml`, a file given with `--options`,
//! and command line flags. Every layer is a flat TOML table with the same
//! keys; unknown keys are rejected.

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use bai_core::params::ParameterRegistry;
use bai_core::protocol::{Address, DriveConfig, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};

/// Name of the per-user options file in the home directory
pub const HOME_OPTIONS_FILE: &str = ".bai_options.toml";

/// Fully resolved options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    pub port: String,
    pub baudrate: u32,
    pub address: String,
    /// Read timeout in seconds
    pub timeout: f64,
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            port: DriveConfig::default().port_name,
            baudrate: DEFAULT_BAUD_RATE,
            address: Address::default().to_string(),
            timeout: DEFAULT_TIMEOUT_MS as f64 / 1000.0,
            verbose: false,
        }
    }
}

/// One layer of options, any subset of keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baudrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl PartialOptions {
    /// Read one options file
    pub fn from_file(path: &Path) -> Result<Self> {
        Figment::from(Toml::file(path))
            .extract()
            .with_context(|| format!("invalid options file '{}'", path.display()))
    }

    fn has(&self, key: &str) -> bool {
        match key {
            "port" => self.port.is_some(),
            "baudrate" => self.baudrate.is_some(),
            "address" => self.address.is_some(),
            "timeout" => self.timeout.is_some(),
            "verbose" => self.verbose.is_some(),
            _ => false,
        }
    }
}

/// Where an option's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    Default,
    HomeFile,
    OptionsFile,
    CommandLine,
}

impl fmt::Display for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionSource::Default => "default",
            OptionSource::HomeFile => HOME_OPTIONS_FILE,
            OptionSource::OptionsFile => "options file",
            OptionSource::CommandLine => "command line",
        };
        f.write_str(name)
    }
}

/// Option keys in display order
pub const OPTION_KEYS: [&str; 5] = ["port", "baudrate", "address", "timeout", "verbose"];

/// Resolved options plus the layer each value came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOptions {
    pub options: Options,
    pub sources: Vec<(&'static str, OptionSource)>,
    pub home_file: Option<PathBuf>,
}

/// Default location of the per-user options file
pub fn home_options_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HOME_OPTIONS_FILE))
}

/// Merge the layers. A missing home file is skipped; a missing `--options`
/// file is an error.
pub fn load(
    home_file: Option<&Path>,
    options_file: Option<&Path>,
    command_line: PartialOptions,
) -> Result<LoadedOptions> {
    let home = match home_file {
        Some(path) if path.exists() => Some(PartialOptions::from_file(path)?),
        _ => None,
    };
    let file = match options_file {
        Some(path) if !path.exists() => {
            bail!("options file '{}' does not exist", path.display())
        }
        Some(path) => Some(PartialOptions::from_file(path)?),
        None => None,
    };

    let mut figment = Figment::from(Serialized::defaults(Options::default()));
    for layer in [&home, &file].into_iter().flatten() {
        figment = figment.merge(Serialized::defaults(layer));
    }
    figment = figment.merge(Serialized::defaults(&command_line));

    let options: Options = figment.extract().context("invalid options")?;
    validate(&options)?;

    let sources = OPTION_KEYS
        .iter()
        .map(|key| {
            let source = if command_line.has(key) {
                OptionSource::CommandLine
            } else if file.as_ref().is_some_and(|f| f.has(key)) {
                OptionSource::OptionsFile
            } else if home.as_ref().is_some_and(|h| h.has(key)) {
                OptionSource::HomeFile
            } else {
                OptionSource::Default
            };
            (*key, source)
        })
        .collect();

    Ok(LoadedOptions {
        options,
        sources,
        home_file: home_file.filter(|p| p.exists()).map(Path::to_path_buf),
    })
}

fn validate(options: &Options) -> Result<()> {
    options
        .address
        .parse::<Address>()
        .with_context(|| format!("invalid address '{}'", options.address))?;
    let allowed = ParameterRegistry::standard().allowed_baud_rates();
    if !allowed.contains(&options.baudrate) {
        bail!(
            "baudrate {} is not one the drive supports ({:?})",
            options.baudrate,
            allowed
        );
    }
    if !(options.timeout.is_finite() && options.timeout > 0.0) {
        bail!("timeout must be a positive number of seconds, got {}", options.timeout);
    }
    Ok(())
}

impl Options {
    /// Drive configuration for these options
    pub fn drive_config(&self) -> Result<DriveConfig> {
        Ok(DriveConfig {
            port_name: self.port.clone(),
            baud_rate: self.baudrate,
            timeout_ms: (self.timeout * 1000.0).round() as u64,
            address: self.address.parse()?,
            ..DriveConfig::default()
        })
    }

    /// Value of an option as text
    pub fn value_of(&self, key: &str) -> String {
        match key {
            "port" => self.port.clone(),
            "baudrate" => self.baudrate.to_string(),
            "address" => self.address.clone(),
            "timeout" => self.timeout.to_string(),
            "verbose" => self.verbose.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn source_of(loaded: &LoadedOptions, key: &str) -> OptionSource {
        loaded
            .sources
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, s)| *s)
            .unwrap()
    }

    #[test]
    fn test_defaults_only() {
        let loaded = load(None, None, PartialOptions::default()).unwrap();
        assert_eq!(loaded.options, Options::default());
        assert_eq!(loaded.options.baudrate, 9600);
        assert_eq!(loaded.options.address, "A");
        assert_eq!(loaded.options.timeout, 0.5);
        assert!(loaded
            .sources
            .iter()
            .all(|(_, s)| *s == OptionSource::Default));
    }

    #[test]
    fn test_layer_precedence() {
        let dir = tempdir().unwrap();
        let home = dir.path().join(HOME_OPTIONS_FILE);
        let file = dir.path().join("bench.toml");
        fs::write(&home, "port = \"/dev/ttyUSB0\"\nbaudrate = 19200\naddress = \"B\"\n").unwrap();
        fs::write(&file, "baudrate = 38400\n").unwrap();

        let cli = PartialOptions {
            address: Some("C".into()),
            ..PartialOptions::default()
        };
        let loaded = load(Some(&home), Some(&file), cli).unwrap();

        assert_eq!(loaded.options.port, "/dev/ttyUSB0");
        assert_eq!(loaded.options.baudrate, 38400);
        assert_eq!(loaded.options.address, "C");
        assert_eq!(source_of(&loaded, "port"), OptionSource::HomeFile);
        assert_eq!(source_of(&loaded, "baudrate"), OptionSource::OptionsFile);
        assert_eq!(source_of(&loaded, "address"), OptionSource::CommandLine);
        assert_eq!(source_of(&loaded, "timeout"), OptionSource::Default);
        assert_eq!(loaded.home_file.as_deref(), Some(home.as_path()));
    }

    #[test]
    fn test_missing_home_file_is_skipped() {
        let dir = tempdir().unwrap();
        let home = dir.path().join(HOME_OPTIONS_FILE);
        let loaded = load(Some(&home), None, PartialOptions::default()).unwrap();
        assert_eq!(loaded.home_file, None);
    }

    #[test]
    fn test_missing_options_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load(None, Some(&dir.path().join("nope.toml")), PartialOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("typo.toml");
        fs::write(&file, "baud = 19200\n").unwrap();
        assert!(load(None, Some(&file), PartialOptions::default()).is_err());
    }

    #[test]
    fn test_invalid_address_rejected() {
        let cli = PartialOptions {
            address: Some("AB".into()),
            ..PartialOptions::default()
        };
        assert!(load(None, None, cli).is_err());
    }

    #[test]
    fn test_unsupported_baudrate_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("odd.toml");
        fs::write(&file, "baudrate = 14400\n").unwrap();
        let err = load(None, Some(&file), PartialOptions::default()).unwrap_err();
        assert!(err.to_string().contains("14400"));

        let cli = PartialOptions {
            baudrate: Some(38400),
            ..PartialOptions::default()
        };
        assert_eq!(load(None, None, cli).unwrap().options.baudrate, 38400);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let cli = PartialOptions {
            timeout: Some(0.0),
            ..PartialOptions::default()
        };
        assert!(load(None, None, cli).is_err());
    }

    #[test]
    fn test_drive_config() {
        let options = Options {
            timeout: 1.25,
            address: "7".into(),
            ..Options::default()
        };
        let config = options.drive_config().unwrap();
        assert_eq!(config.timeout_ms, 1250);
        assert_eq!(config.address.as_char(), '7');
        assert_eq!(config.ack_polls, 20);
    }
}
