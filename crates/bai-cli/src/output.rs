//! Text rendering for command output

use std::fmt::Write;

use bai_core::params::{ParameterListing, ParameterSpec, Value};
use bai_core::protocol::{NonDefault, PortInfo};
use bai_core::status::Status;

use crate::options::LoadedOptions;

const ID_WIDTH: usize = 8;
const NAME_WIDTH: usize = 25;
const VALUE_WIDTH: usize = 15;
const STATUS_WIDTH: usize = 31;

/// `PRM:n:` padded to the id column, always followed by a space
fn id_column(spec: &ParameterSpec) -> String {
    format!("{:<width$} ", format!("PRM:{}:", spec.id), width = ID_WIDTH - 1)
}

/// Name padded to the name column, always followed by a space
fn name_column(name: &str) -> String {
    format!("{:<width$} ", name, width = NAME_WIDTH - 1)
}

/// One `PRM:n: name value` row
pub fn param_row(spec: &ParameterSpec, value: &Value) -> String {
    format!("{}{}{}", id_column(spec), name_column(spec.name), value)
}

/// A parameter with its description, limits and (optionally) current value
pub fn param_block(spec: &ParameterSpec, current: Option<&Value>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", id_column(spec), spec.name);
    if !spec.doc.is_empty() {
        let _ = writeln!(out, "    {}", spec.doc);
    }
    let _ = write!(out, "    type: {}", spec.value_type());
    if let (Some(min), Some(max)) = (spec.min(), spec.max()) {
        let _ = write!(out, "  min: {}  max: {}", min, max);
    }
    if let Some(len) = spec.max_len() {
        let _ = write!(out, "  max length: {}", len);
    }
    let _ = write!(out, "  default: {}", spec.default);
    if let Some(units) = spec.units {
        let _ = write!(out, "  units: {}", units);
    }
    out.push('\n');
    if let Some(allowed) = spec.allowed_values() {
        let _ = writeln!(out, "    allowed: {}", join(allowed));
    }
    if let Some(value) = current {
        let _ = writeln!(out, "    value: {}", value);
    }
    out
}

/// Rows for a list of parameter values
pub fn param_table<'a, I>(rows: I, verbose: bool) -> String
where
    I: IntoIterator<Item = (&'a ParameterSpec, &'a Value)>,
{
    let mut out = String::new();
    for (spec, value) in rows {
        if verbose {
            out.push_str(&param_block(spec, Some(value)));
        } else {
            out.push_str(&param_row(spec, value));
            out.push('\n');
        }
    }
    out
}

/// Parameters that differ from their defaults
pub fn nondefault_table(changed: &[NonDefault]) -> String {
    if changed.is_empty() {
        return "all parameters are at their defaults\n".to_string();
    }
    let mut out = format!(
        "{:<id$}{:<name$}{:<value$}{}\n",
        "param",
        "name",
        "current",
        "default",
        id = ID_WIDTH,
        name = NAME_WIDTH,
        value = VALUE_WIDTH
    );
    for entry in changed {
        let _ = writeln!(
            out,
            "{}{}{:<value$}{}",
            id_column(&entry.spec),
            name_column(entry.spec.name),
            entry.current.to_string(),
            entry.default,
            value = VALUE_WIDTH
        );
    }
    out
}

/// Every status field and its state
pub fn status_table(status: &Status, verbose: bool) -> String {
    let mut out = String::new();
    if verbose {
        let _ = writeln!(out, "status word: {:#010x}", status.raw());
    }
    for (name, state) in status.iter() {
        let _ = writeln!(
            out,
            "{:<width$}{}",
            format!("{}:", name),
            state,
            width = STATUS_WIDTH
        );
    }
    out
}

/// The registry listing as a table
pub fn listing_table(listing: &[ParameterListing]) -> String {
    let mut out = format!(
        "{:<6}{:<name$}{:<8}{:<13}{:<13}{:<13}{}\n",
        "id",
        "name",
        "type",
        "min",
        "max",
        "default",
        "units",
        name = NAME_WIDTH
    );
    for row in listing {
        let _ = writeln!(
            out,
            "{:<6}{:<name$}{:<8}{:<13}{:<13}{:<13}{}",
            row.id,
            row.name,
            row.value_type.to_string(),
            row.min.as_deref().unwrap_or("-"),
            row.max.as_deref().unwrap_or("-"),
            row.default,
            row.units.as_deref().unwrap_or(""),
            name = NAME_WIDTH
        );
    }
    out
}

/// Detected serial ports
pub fn ports_table(ports: &[PortInfo]) -> String {
    if ports.is_empty() {
        return "no serial ports found\n".to_string();
    }
    let mut out = String::new();
    for port in ports {
        let _ = write!(out, "{}", port.name);
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            let _ = write!(out, "  [{:04x}:{:04x}]", vid, pid);
        }
        if let Some(product) = &port.product {
            let _ = write!(out, "  {}", product);
        }
        if let Some(manufacturer) = &port.manufacturer {
            let _ = write!(out, " ({})", manufacturer);
        }
        out.push('\n');
    }
    out
}

/// Resolved options and where each one came from
pub fn options_table(loaded: &LoadedOptions) -> String {
    let mut out = String::from("options:\n");
    if let Some(path) = &loaded.home_file {
        let _ = writeln!(out, "    read {}", path.display());
    }
    for (key, source) in &loaded.sources {
        let _ = writeln!(
            out,
            "    {:<10}{:<20}({})",
            key,
            loaded.options.value_of(key),
            source
        );
    }
    out
}

/// `allowed baud rates: 1200, 2400, ...`
pub fn baud_rates_line(rates: &[u32]) -> String {
    format!("allowed baud rates: {}", join(rates))
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bai_core::params::ParameterRegistry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_param_row_columns() {
        let registry = ParameterRegistry::standard();
        let kp = registry.lookup("KP").unwrap();
        assert_eq!(
            param_row(kp, &Value::Int(750_000)),
            "PRM:0:  KP                       750000"
        );
        let srq = registry.lookup("SRQ").unwrap();
        assert!(param_row(srq, &Value::Char(b'%')).starts_with("PRM:91: SRQ"));
        assert!(param_row(srq, &Value::Char(b'%')).ends_with(" %"));
    }

    #[test]
    fn test_long_id_keeps_a_separator() {
        let registry = ParameterRegistry::standard();
        let ramp = registry.lookup("201").unwrap();
        let row = param_row(ramp, &Value::Float(0.1));
        assert!(row.starts_with("PRM:201:"));
        assert!(row.ends_with(" 0.1"));
    }

    #[test]
    fn test_three_digit_id_keeps_columns_apart() {
        let registry = ParameterRegistry::standard();
        let scale = registry.lookup("200").unwrap();
        let row = param_row(scale, &Value::Int(1));
        assert_eq!(row, format!("PRM:200: {:<25}1", scale.name));
        assert!(param_block(scale, None).starts_with(&format!("PRM:200: {}\n", scale.name)));
    }

    #[test]
    fn test_long_name_keeps_a_separator() {
        let spec = ParameterSpec::int(3, "a name longer than the name column", 0, 9, 0);
        assert_eq!(
            param_row(&spec, &Value::Int(5)),
            "PRM:3:  a name longer than the name column 5"
        );
    }

    #[test]
    fn test_param_block_shows_limits() {
        let registry = ParameterRegistry::standard();
        let peak = registry.lookup("peak current limit").unwrap();
        let block = param_block(peak, Some(&Value::Int(80)));
        assert!(block.starts_with("PRM:7:  peak current limit\n"));
        assert!(block.contains("type: int  min: 0  max: 100  default: 100"));
        assert!(block.ends_with("    value: 80\n"));
    }

    #[test]
    fn test_param_block_baud_rate_lists_allowed() {
        let registry = ParameterRegistry::standard();
        let baud = registry.lookup("baud rate").unwrap();
        let block = param_block(baud, None);
        assert!(block.contains("allowed: 1200, 2400, 4800, 9600, 19200, 38400"));
        assert!(!block.contains("value:"));
    }

    #[test]
    fn test_nondefault_table() {
        let registry = ParameterRegistry::standard();
        let peak = registry.lookup("7").unwrap().clone();
        let changed = vec![NonDefault {
            default: peak.default.clone(),
            spec: peak,
            current: Value::Int(80),
        }];
        let table = nondefault_table(&changed);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("param   name"));
        assert_eq!(
            lines[1],
            "PRM:7:  peak current limit       80             100"
        );
        assert_eq!(nondefault_table(&[]), "all parameters are at their defaults\n");
    }

    #[test]
    fn test_status_table() {
        let status = Status::decode(1 << 31);
        let table = status_table(&status, true);
        assert!(table.starts_with("status word: 0x80000000\n"));
        assert!(table.contains(&format!("{:<31}true", "amp active:")));
        assert!(table.contains(&format!("{:<31}[false, false, false]", "hall:")));
    }

    #[test]
    fn test_baud_rates_line() {
        assert_eq!(
            baud_rates_line(&[1200, 9600]),
            "allowed baud rates: 1200, 9600"
        );
    }

    #[test]
    fn test_options_table_names_sources() {
        let cli = crate::options::PartialOptions {
            port: Some("/dev/ttyUSB1".into()),
            ..Default::default()
        };
        let loaded = crate::options::load(None, None, cli).unwrap();
        let table = options_table(&loaded);
        assert!(table.contains("port      /dev/ttyUSB1        (command line)"));
        assert!(table.contains("baudrate  9600                (default)"));
    }

    #[test]
    fn test_ports_table() {
        let ports = vec![PortInfo {
            name: "/dev/ttyUSB0".into(),
            vid: Some(0x0403),
            pid: Some(0x6001),
            manufacturer: Some("FTDI".into()),
            product: Some("USB Serial".into()),
        }];
        assert_eq!(
            ports_table(&ports),
            "/dev/ttyUSB0  [0403:6001]  USB Serial (FTDI)\n"
        );
        assert_eq!(ports_table(&[]), "no serial ports found\n");
    }
}
