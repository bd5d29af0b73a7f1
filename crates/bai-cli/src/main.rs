//! `bai` - command line control of BA-Intellidrive servo controllers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bai_core::params::ParameterRegistry;

mod commands;
mod options;
mod output;

use options::PartialOptions;

#[derive(Parser)]
#[command(name = "bai")]
#[command(about = "Talk to BA-Intellidrive servo controllers over a serial line", long_about = None)]
#[command(version = bai_core::VERSION)]
struct Cli {
    /// Serial port device
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Line speed in baud
    #[arg(short, long, global = true)]
    baudrate: Option<u32>,

    /// Unit address on the daisy chain
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Read timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<f64>,

    /// Options file, overriding ~/.bai_options.toml
    #[arg(short, long = "options", global = true)]
    options_file: Option<PathBuf>,

    /// Show options, parameter details and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to every prompt
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Read and decode the status word
    Status,

    /// Read the motor position
    Position,

    /// Read a parameter by name or number, or `all`, `default`, `nondefault`
    ReadParam { param: String },

    /// Write a parameter; `write-param default` restores factory defaults.
    /// Prefix negative numbers with `n`, e.g. `n250`.
    WriteParam {
        param: String,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Restore factory defaults and save them to flash
    RestoreDefaults,

    /// Load parameters from a file into the drive
    ParamFromFile { file: PathBuf },

    /// Save the drive's parameters to a file
    ParamToFile { file: PathBuf },

    /// Write the factory defaults to a file
    DefaultToFile { file: PathBuf },

    /// Save parameters to flash
    SaveToFlash,

    /// Toggle every drive on the line between local and remote mode
    ToggleMode,

    /// Reset the drive
    Reset,

    /// Search the allowed baud rates for one the drive answers at
    FindBaudrate,

    /// Show the allowed baud rates
    PrintBaudrates,

    /// Change the drive's baud rate, save to flash and reset
    SetBaudrate { rate: u32 },

    /// List the parameter table
    ListParams {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available serial ports
    ListPorts,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = PartialOptions {
        port: cli.port,
        baudrate: cli.baudrate,
        address: cli.address,
        timeout: cli.timeout,
        verbose: cli.verbose.then_some(true),
    };
    let home = options::home_options_path();
    let loaded = options::load(home.as_deref(), cli.options_file.as_deref(), overrides)?;

    init_tracing(loaded.options.verbose);
    if loaded.options.verbose {
        print!("{}", output::options_table(&loaded));
    }

    let ctx = commands::Context {
        options: loaded.options,
        registry: Arc::new(ParameterRegistry::standard()),
        assume_yes: cli.yes,
    };
    commands::run(&ctx, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_value_with_hyphen() {
        let cli = Cli::try_parse_from(["bai", "write-param", "offset_to_marker", "-250"]).unwrap();
        match cli.command {
            Commands::WriteParam { param, value } => {
                assert_eq!(param, "offset_to_marker");
                assert_eq!(value.as_deref(), Some("-250"));
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bai", "status", "-a", "B", "-b", "19200", "-v"]).unwrap();
        assert_eq!(cli.address.as_deref(), Some("B"));
        assert_eq!(cli.baudrate, Some(19200));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status));
    }
}
