//! Serial port handling
//!
//! Opening and configuring the RS-232 link to a drive, and enumerating the
//! ports it might be attached to.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;
use tracing::debug;

use super::{ProtocolError, DEFAULT_BAUD_RATE};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key putting USB adapters first, then on-board UARTs, then the rest.
/// Numbered ports sort numerically within their group.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in ["ttyUSB", "ttyACM", "ttyS"].iter().enumerate() {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank as u8, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // USB adapters that udev has not announced yet still show up in /dev
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyUSB") || fname.starts_with("ttyACM") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Open a serial port with the given read timeout
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
    timeout: Duration,
) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    debug!(port = name, baud, timeout_ms = timeout.as_millis() as u64, "opening serial port");

    serialport::new(name, baud)
        .timeout(timeout)
        .open()
        .map_err(|e| ProtocolError::SerialError(format!("{}: {}", name, e)))
}

/// Configure a serial port for drive communication (8N1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_ports_sorted_and_unique() {
        let ports = list_ports();
        let keys: Vec<_> = ports.iter().map(|p| port_sort_key(&p.name)).collect();
        assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));

        let mut names: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ports.len());
    }

    #[test]
    fn test_port_sorting() {
        let names = vec![
            "/dev/ttyS1",
            "/dev/ttyUSB10",
            "/dev/ttyACM0",
            "/dev/ttyS0",
            "/dev/rfcomm0",
            "/dev/ttyUSB2",
        ];
        let mut ports: Vec<PortInfo> = names
            .into_iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect();
        ports.sort_by_key(|p| port_sort_key(&p.name));
        let sorted: Vec<&str> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            sorted,
            vec![
                "/dev/ttyUSB2",
                "/dev/ttyUSB10",
                "/dev/ttyACM0",
                "/dev/ttyS0",
                "/dev/ttyS1",
                "/dev/rfcomm0",
            ]
        );
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = open_port("/dev/does-not-exist-bai", None, Duration::from_millis(10));
        assert!(matches!(result, Err(ProtocolError::SerialError(_))));
    }
}
