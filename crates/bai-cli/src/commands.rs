//! Subcommand handlers

use anyhow::{bail, Context as _, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use bai_core::paramfile::export_defaults;
use bai_core::params::{ParamKind, ParameterRegistry, ParameterSpec, Value, BAUD_RATE_PARAM_ID};
use bai_core::protocol::{list_ports, Drive};

use crate::options::Options;
use crate::output;
use crate::Commands;

/// Shared state for one invocation
pub struct Context {
    pub options: Options,
    pub registry: Arc<ParameterRegistry>,
    /// Answer yes to every prompt
    pub assume_yes: bool,
}

impl Context {
    fn open_drive(&self) -> Result<Drive> {
        let config = self.options.drive_config()?;
        let port = config.port_name.clone();
        Drive::open(config, Arc::clone(&self.registry))
            .with_context(|| format!("could not open serial port '{}'", port))
    }

    fn confirm(&self, prompt: &str, default_yes: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let hint = if default_yes { "(Y)/N" } else { "Y/(N)" };
        print!("{} {} ", prompt, hint);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(parse_answer(&line, default_yes))
    }

    fn confirm_overwrite(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(true);
        }
        self.confirm(&format!("'{}' exists, overwrite?", path.display()), true)
    }
}

/// Interpret a yes/no answer; an empty answer takes the default
pub fn parse_answer(line: &str, default_yes: bool) -> bool {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}

/// Normalise a value typed on the command line.
///
/// Numeric values may be written with a leading `n` for a minus sign, so
/// negative numbers are not mistaken for flags.
pub fn value_arg(spec: &ParameterSpec, raw: &str) -> Value {
    let numeric = matches!(spec.kind, ParamKind::Int { .. } | ParamKind::Float { .. });
    match raw.strip_prefix('n') {
        Some(rest) if numeric => Value::Str(format!("-{}", rest)),
        _ => Value::Str(raw.to_string()),
    }
}

const DAISY_CHAIN_WARNING: &str = "\
Warning: a drive restored to defaults answers at address A and 9600 baud.
On a daisy chain this can collide with another unit. Drives in local mode
must be toggled to remote mode first.";

const TOGGLE_WARNING: &str = "\
Toggling between local and remote mode. Every drive on the line toggles,
since the toggle command carries no address.";

const BAUD_WRITE_WARNING: &str = "\
Baud rate setting written. It takes effect after save-to-flash and reset;
use set-baudrate to do all three.";

/// Run one subcommand
pub fn run(ctx: &Context, command: Commands) -> Result<()> {
    let verbose = ctx.options.verbose;
    match command {
        Commands::Status => {
            let mut drive = ctx.open_drive()?;
            let status = drive.read_status(None).context("reading status")?;
            print!("{}", output::status_table(&status, verbose));
        }
        Commands::Position => {
            let mut drive = ctx.open_drive()?;
            let position = drive.read_position(None).context("reading position")?;
            println!("position = {}", position);
        }
        Commands::ReadParam { param } => read_param(ctx, &param)?,
        Commands::WriteParam { param, value } => {
            if param == "default" {
                return restore_defaults(ctx);
            }
            let Some(raw) = value else {
                bail!("write-param {} needs a value", param);
            };
            write_param(ctx, &param, &raw)?;
        }
        Commands::RestoreDefaults => restore_defaults(ctx)?,
        Commands::ParamFromFile { file } => {
            let mut drive = ctx.open_drive()?;
            let baud_changed = drive
                .import_parameters(&file, None)
                .with_context(|| format!("loading parameters from '{}'", file.display()))?;
            println!("parameters loaded from {}", file.display());
            if baud_changed {
                println!("{}", BAUD_WRITE_WARNING);
            }
        }
        Commands::ParamToFile { file } => {
            if !ctx.confirm_overwrite(&file)? {
                return Ok(());
            }
            let mut drive = ctx.open_drive()?;
            let values = drive
                .export_parameters(&file, None)
                .with_context(|| format!("writing parameters to '{}'", file.display()))?;
            if verbose {
                print!(
                    "{}",
                    output::param_table(values.iter().map(|(s, v)| (s, v)), false)
                );
            }
            println!("{} parameters written to {}", values.len(), file.display());
        }
        Commands::DefaultToFile { file } => {
            if !ctx.confirm_overwrite(&file)? {
                return Ok(());
            }
            export_defaults(&ctx.registry, &file)
                .with_context(|| format!("writing defaults to '{}'", file.display()))?;
            println!("defaults written to {}", file.display());
        }
        Commands::SaveToFlash => {
            let mut drive = ctx.open_drive()?;
            drive.save_to_flash(None).context("saving to flash")?;
            println!("parameters saved to flash");
        }
        Commands::ToggleMode => {
            println!("{}", TOGGLE_WARNING);
            let mut drive = ctx.open_drive()?;
            drive.toggle_mode().context("toggling mode")?;
        }
        Commands::Reset => {
            let mut drive = ctx.open_drive()?;
            drive.reset(None).context("resetting drive")?;
            println!("drive reset");
        }
        Commands::FindBaudrate => {
            println!("searching for the drive's baud rate, this may take a while");
            let mut drive = ctx.open_drive()?;
            match drive.discover_baud(None) {
                Some(rate) => println!("baudrate = {}", rate),
                None => {
                    println!("baud rate not found");
                    println!("the drive may be in local mode, try toggle-mode");
                }
            }
        }
        Commands::PrintBaudrates => {
            println!("{}", output::baud_rates_line(ctx.registry.allowed_baud_rates()));
        }
        Commands::SetBaudrate { rate } => {
            if !ctx.registry.allowed_baud_rates().contains(&rate) {
                bail!(
                    "{} is not a supported baud rate ({})",
                    rate,
                    output::baud_rates_line(ctx.registry.allowed_baud_rates())
                );
            }
            println!("The drive will be saved to flash and reset at {} baud.", rate);
            if !ctx.confirm("Continue?", true)? {
                return Ok(());
            }
            let mut drive = ctx.open_drive()?;
            drive
                .change_baud_rate(rate, None, true)
                .context("changing baud rate")?;
            println!("baudrate = {}", rate);
        }
        Commands::ListParams { json } => {
            let listing = ctx.registry.listing();
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", output::listing_table(&listing));
            }
        }
        Commands::ListPorts => print!("{}", output::ports_table(&list_ports())),
    }
    Ok(())
}

fn read_param(ctx: &Context, key: &str) -> Result<()> {
    let verbose = ctx.options.verbose;
    match key {
        "default" => {
            let rows = ctx.registry.iter().map(|spec| (spec, &spec.default));
            print!("{}", output::param_table(rows, verbose));
        }
        "all" => {
            let mut drive = ctx.open_drive()?;
            let values = drive.read_all(None).context("reading parameters")?;
            print!(
                "{}",
                output::param_table(values.iter().map(|(s, v)| (s, v)), verbose)
            );
        }
        "nondefault" => {
            let mut drive = ctx.open_drive()?;
            let changed = drive
                .nondefault_parameters(None)
                .context("reading parameters")?;
            print!("{}", output::nondefault_table(&changed));
        }
        _ => {
            let spec = ctx.registry.lookup(key)?;
            let mut drive = ctx.open_drive()?;
            let value = drive
                .read_parameter(spec, None)
                .with_context(|| format!("reading {}", spec))?;
            if verbose {
                print!("{}", output::param_block(spec, Some(&value)));
            } else {
                println!("{}", output::param_row(spec, &value));
            }
        }
    }
    Ok(())
}

fn write_param(ctx: &Context, key: &str, raw: &str) -> Result<()> {
    let spec = ctx.registry.lookup(key)?;
    let value = value_arg(spec, raw);
    // check before the port is touched
    let prepared = spec.prepare(&value)?;

    let mut drive = ctx.open_drive()?;
    if spec.id == BAUD_RATE_PARAM_ID {
        let rate = prepared
            .as_int()
            .and_then(|r| u32::try_from(r).ok())
            .with_context(|| format!("invalid baud rate '{}'", raw))?;
        drive
            .change_baud_rate(rate, None, false)
            .context("writing baud rate")?;
        println!("{}", BAUD_WRITE_WARNING);
        return Ok(());
    }

    drive
        .write_parameter(spec, &prepared, None, true)
        .with_context(|| format!("writing {}", spec))?;
    info!(param = %spec, value = %prepared, "parameter written");
    if ctx.options.verbose {
        println!("{}", output::param_row(spec, &prepared));
    }
    Ok(())
}

fn restore_defaults(ctx: &Context) -> Result<()> {
    println!("{}", DAISY_CHAIN_WARNING);
    if !ctx.confirm("Set to defaults?", false)? {
        return Ok(());
    }
    let mut drive = ctx.open_drive()?;
    let restored = drive
        .restore_defaults(None, true)
        .context("restoring defaults")?;
    if ctx.options.verbose {
        print!("{}", output::nondefault_table(&restored));
    }
    println!("{} parameters restored to defaults", restored.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("\n", true));
        assert!(!parse_answer("\n", false));
        assert!(parse_answer("Y\n", false));
        assert!(parse_answer(" yes ", false));
        assert!(!parse_answer("n", true));
        assert!(!parse_answer("maybe", true));
    }

    #[test]
    fn test_n_prefix_means_negative() {
        let registry = ParameterRegistry::standard();
        let offset = registry.lookup("offset to marker").unwrap();
        assert_eq!(value_arg(offset, "n250"), Value::Str("-250".into()));
        assert_eq!(
            offset.prepare(&value_arg(offset, "n250")).unwrap(),
            Value::Int(-250)
        );
        assert_eq!(value_arg(offset, "250"), Value::Str("250".into()));
    }

    #[test]
    fn test_n_prefix_is_literal_for_text() {
        let registry = ParameterRegistry::standard();
        let boot = registry.lookup("boot program").unwrap();
        assert_eq!(value_arg(boot, "nudge"), Value::Str("nudge".into()));
        let srq = registry.lookup("SRQ").unwrap();
        assert_eq!(value_arg(srq, "n"), Value::Str("n".into()));
    }
}
