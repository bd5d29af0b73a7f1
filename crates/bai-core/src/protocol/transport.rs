//! Byte transport abstraction
//!
//! The engine only needs a handful of operations from the link. Keeping them
//! behind a trait lets tests drive the engine with a scripted transport.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::debug;

use super::serial::{clear_buffers, configure_port, open_port};
use super::{ProtocolError, STOP_MARKER};

/// A half-duplex byte link to one or more drives
pub trait Transport: Send {
    /// Write all bytes
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read up to and including the stop marker, or until the read timeout
    /// expires. A timeout is not an error: whatever arrived is returned and
    /// the caller decides whether the line is complete.
    fn read_line(&mut self) -> io::Result<Vec<u8>>;

    /// Number of bytes received but not yet read
    fn pending_byte_count(&mut self) -> io::Result<u32>;

    /// Read exactly `n` bytes
    fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Change the line speed
    fn set_baud_rate(&mut self, rate: u32) -> io::Result<()>;

    /// Current line speed
    fn baud_rate(&self) -> u32;

    /// Release the link. Later operations fail.
    fn close(&mut self);
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "serial port is closed")
}

/// [`Transport`] over a `serialport` port
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialTransport {
    /// Open and configure a port (8 data bits, no parity, one stop bit,
    /// no flow control)
    pub fn open(name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ProtocolError> {
        let mut port = open_port(name, Some(baud_rate), timeout)?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;
        Ok(Self::from_port(port, timeout))
    }

    /// Wrap an already opened port
    pub fn from_port(port: Box<dyn SerialPort>, timeout: Duration) -> Self {
        let name = port.name().unwrap_or_default();
        let baud_rate = port.baud_rate().unwrap_or(super::DEFAULT_BAUD_RATE);
        Self {
            port: Some(port),
            name,
            baud_rate,
            timeout,
        }
    }

    /// Name of the underlying port
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the port is still open
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or_else(closed)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;
        let port = self.port()?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        while Instant::now() < deadline {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == STOP_MARKER {
                        break;
                    }
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if line.last() != Some(&STOP_MARKER) {
            debug!(bytes = line.len(), "read_line: timed out before stop marker");
        }
        Ok(line)
    }

    fn pending_byte_count(&mut self) -> io::Result<u32> {
        self.port()?
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.port()?.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn set_baud_rate(&mut self, rate: u32) -> io::Result<()> {
        self.port()?
            .set_baud_rate(rate)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.baud_rate = rate;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "serial port closed");
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
