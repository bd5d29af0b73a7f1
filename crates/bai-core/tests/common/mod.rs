//! Simulated BA-Intellidrive for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

use bai_core::params::{ParameterRegistry, Value};
use bai_core::protocol::{Drive, DriveConfig, Transport};

/// Bytes a drive produces when the line speed is wrong
const GARBAGE: &[u8] = &[0xf8, 0x80, 0x3f, 0xfe];

/// Acknowledgment bytes after a parameter write
const ACK: &[u8] = b"\x06\x06\x06";

/// An in-memory drive that speaks the ASCII protocol
pub struct FakeDrive {
    /// Rate the drive is actually running at
    pub device_baud: u32,
    line_baud: u32,
    pub address: u8,
    /// Parameter values in wire form
    pub params: HashMap<u16, String>,
    pub status: u32,
    pub position: i64,
    /// Polls reporting nothing before the write acknowledgment shows up
    pub ack_delay_polls: u32,
    /// Whether writes are acknowledged at all
    pub ack_enabled: bool,
    /// Drive ignores the serial port (local mode)
    pub silent: bool,
    /// Leave a stray byte in the receive buffer on every speed change
    pub glitch_on_baud_change: bool,
    rx: VecDeque<u8>,
    ack_countdown: Option<u32>,
    pub frames: Vec<Vec<u8>>,
    pub baud_history: Vec<u32>,
    pub saves: u32,
    pub resets: u32,
    pub toggles: u32,
    pub closed: bool,
}

impl FakeDrive {
    pub fn new(registry: &ParameterRegistry) -> Self {
        let params = registry
            .iter()
            .map(|spec| (spec.id, spec.default.to_wire()))
            .collect();
        Self {
            device_baud: 9600,
            line_baud: 9600,
            address: b'A',
            params,
            status: 0,
            position: 0,
            ack_delay_polls: 0,
            ack_enabled: true,
            silent: false,
            glitch_on_baud_change: false,
            rx: VecDeque::new(),
            ack_countdown: None,
            frames: Vec::new(),
            baud_history: Vec::new(),
            saves: 0,
            resets: 0,
            toggles: 0,
            closed: false,
        }
    }

    pub fn set_param(&mut self, id: u16, value: &Value) {
        self.params.insert(id, value.to_wire());
    }

    pub fn written(&self) -> Vec<u8> {
        self.frames.concat()
    }

    fn reply(&mut self, addressed: bool, payload: &str) {
        self.rx.extend([0x03, 0x02]);
        if addressed {
            self.rx.push_back(self.address);
        }
        self.rx.extend(payload.bytes());
        self.rx.push_back(b'\n');
    }

    fn handle(&mut self, frame: &[u8]) {
        let Some(body) = frame
            .strip_prefix(&[0x03, 0x02])
            .and_then(|rest| rest.strip_suffix(b"\n"))
        else {
            return;
        };

        if body == [0x01] {
            self.toggles += 1;
            self.reply(false, "");
            return;
        }

        let Some((&address, command)) = body.split_first() else {
            return;
        };
        if address != self.address {
            return;
        }

        let text = String::from_utf8_lossy(command).into_owned();
        let mut parts = text.split(' ');
        let code = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (code, args.as_slice()) {
            ("PS", []) => {
                let status = self.status.to_string();
                self.reply(true, &status);
            }
            ("PX", []) => {
                let position = self.position.to_string();
                self.reply(true, &position);
            }
            ("RP", [id]) => {
                let value = id
                    .parse::<u16>()
                    .ok()
                    .and_then(|id| self.params.get(&id).cloned())
                    .unwrap_or_else(|| "?".to_string());
                self.reply(true, &value);
            }
            ("WP", [id, value]) => {
                if let Ok(id) = id.parse::<u16>() {
                    self.params.insert(id, value.to_string());
                    if id == 94 {
                        if let Ok(code) = value.parse::<u8>() {
                            self.address = code;
                        }
                    }
                }
                if self.ack_enabled {
                    self.ack_countdown = Some(self.ack_delay_polls);
                }
            }
            ("SP", []) => {
                self.saves += 1;
                self.reply(true, "");
            }
            ("RE", []) => {
                self.resets += 1;
                if let Some(rate) = self.params.get(&90).and_then(|b| b.parse().ok()) {
                    self.device_baud = rate;
                }
                self.reply(true, "");
            }
            _ => {}
        }
    }
}

impl Transport for FakeDrive {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        self.frames.push(bytes.to_vec());
        if self.silent {
            return Ok(());
        }
        if self.line_baud != self.device_baud {
            self.rx.extend(GARBAGE);
            return Ok(());
        }
        self.handle(bytes);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        let mut line = Vec::new();
        while let Some(b) = self.rx.pop_front() {
            line.push(b);
            if b == b'\n' {
                break;
            }
        }
        Ok(line)
    }

    fn pending_byte_count(&mut self) -> io::Result<u32> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        match self.ack_countdown {
            Some(0) => {
                self.rx.extend(ACK);
                self.ack_countdown = None;
            }
            Some(n) => self.ack_countdown = Some(n - 1),
            None => {}
        }
        Ok(self.rx.len() as u32)
    }

    fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if self.rx.len() < n {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "short read"));
        }
        Ok(self.rx.drain(..n).collect())
    }

    fn set_baud_rate(&mut self, rate: u32) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        self.line_baud = rate;
        self.baud_history.push(rate);
        if self.glitch_on_baud_change {
            self.rx.push_back(0xff);
        }
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.line_baud
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

pub fn registry() -> Arc<ParameterRegistry> {
    Arc::new(ParameterRegistry::standard())
}

/// Drive over a factory-fresh fake, with every delay disabled
pub fn fake_drive() -> Drive<FakeDrive> {
    let registry = registry();
    let fake = FakeDrive::new(&registry);
    Drive::new(fake, registry, DriveConfig::default().without_delays())
}

/// Drive over a customised fake
pub fn drive_with(setup: impl FnOnce(&mut FakeDrive)) -> Drive<FakeDrive> {
    let mut drive = fake_drive();
    setup(drive.transport_mut());
    drive
}
