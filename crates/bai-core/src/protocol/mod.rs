//! Serial Protocol Communication
//!
//! Implements the BA-Intellidrive ASCII command protocol: framing, the
//! write acknowledgment, transactions against one drive and baud rate
//! discovery.

mod ack;
mod baud;
pub mod commands;
mod drive;
mod error;
mod frame;
pub mod serial;
mod transport;

pub use ack::wait_for_ack;
pub use baud::probe_sequence;
pub use commands::Command;
pub use drive::{Drive, DriveConfig, NonDefault};
pub use error::ProtocolError;
pub use frame::{decode_payload, encode, framing_overhead, Address, CommandFrame};
pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo};
pub use transport::{SerialTransport, Transport};

/// Bytes that open every frame
pub const START_MARKER: [u8; 2] = [0x03, 0x02];

/// Byte that closes every frame
pub const STOP_MARKER: u8 = b'\n';

/// Length of the unterminated write acknowledgment
pub const ACK_LEN: usize = 3;

/// Default baud rate of a factory-fresh drive
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Default unit address of a factory-fresh drive
pub const DEFAULT_ADDRESS: u8 = b'A';

/// Delay between acknowledgment polls in milliseconds
pub const DEFAULT_ACK_POLL_MS: u64 = 50;

/// Number of acknowledgment polls before giving up
pub const DEFAULT_ACK_POLLS: u32 = 20;

/// Settle time after a reset in milliseconds
pub const RESET_DELAY_MS: u64 = 5000;

/// Settle time after saving to flash in milliseconds
pub const SAVE_DELAY_MS: u64 = 3000;

/// Settle time after a local/remote mode toggle in milliseconds
pub const TOGGLE_DELAY_MS: u64 = 5000;

/// Pause after a rejected baud rate candidate in milliseconds
pub const DISCOVERY_COOLDOWN_MS: u64 = 5000;
