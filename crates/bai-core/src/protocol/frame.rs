//! Frame encoding/decoding
//!
//! Command frame format:
//! - 2 bytes: start marker (`0x03 0x02`)
//! - 0 or 1 byte: unit address
//! - 1 or 2 bytes: command code
//! - per argument: a space followed by the argument text
//! - 1 byte: stop marker (`\n`)
//!
//! Replies use the same prefix and stop marker around an ASCII payload.
//! Write acknowledgments are the exception, see [`super::wait_for_ack`].

use std::fmt;
use std::str::FromStr;

use super::{Command, ProtocolError, DEFAULT_ADDRESS, START_MARKER, STOP_MARKER};

/// Unit address of a drive on a daisy chain
///
/// Always a single printable ASCII character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(u8);

impl Address {
    /// Create an address from a raw byte
    pub fn new(byte: u8) -> Result<Self, ProtocolError> {
        if byte.is_ascii_graphic() {
            Ok(Self(byte))
        } else {
            Err(ProtocolError::InvalidAddress(
                String::from_utf8_lossy(&[byte]).into_owned(),
            ))
        }
    }

    /// The address byte
    pub fn as_byte(&self) -> u8 {
        self.0
    }

    /// The address as a character
    pub fn as_char(&self) -> char {
        self.0 as char
    }
}

impl Default for Address {
    fn default() -> Self {
        Self(DEFAULT_ADDRESS)
    }
}

impl FromStr for Address {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = s.bytes();
        match (bytes.next(), bytes.next()) {
            (Some(b), None) => Self::new(b),
            _ => Err(ProtocolError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<char> for Address {
    type Error = ProtocolError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        u8::try_from(c)
            .map_err(|_| ProtocolError::InvalidAddress(c.to_string()))
            .and_then(Self::new)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Builder for a command frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: Command,
    address: Option<Address>,
    args: Vec<String>,
}

impl CommandFrame {
    /// Start a frame for the given command
    pub fn new(command: Command) -> Self {
        Self {
            command,
            address: None,
            args: Vec::new(),
        }
    }

    /// Address the frame to one unit. Ignored for unaddressed commands.
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Append an argument, rendered with `Display`
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Whether the encoded frame (and so its reply) carries an address byte
    pub fn is_addressed(&self) -> bool {
        self.address.is_some() && self.command.is_addressed()
    }

    /// The command this frame carries
    pub fn command(&self) -> Command {
        self.command
    }

    /// Encode to raw bytes
    pub fn encode(&self) -> Vec<u8> {
        let address = if self.command.is_addressed() {
            self.address
        } else {
            None
        };
        encode(address, self.command, &self.args)
    }
}

/// Encode a command with its arguments into a frame
pub fn encode<S: AsRef<str>>(address: Option<Address>, command: Command, args: &[S]) -> Vec<u8> {
    let args_len: usize = args.iter().map(|a| a.as_ref().len() + 1).sum();
    let mut bytes = Vec::with_capacity(START_MARKER.len() + 1 + 2 + args_len + 1);

    bytes.extend_from_slice(&START_MARKER);
    if let Some(address) = address {
        bytes.push(address.as_byte());
    }
    bytes.extend_from_slice(command.code());
    for arg in args {
        bytes.push(b' ');
        bytes.extend_from_slice(arg.as_ref().as_bytes());
    }
    bytes.push(STOP_MARKER);

    bytes
}

/// Bytes of framing around a reply payload
pub fn framing_overhead(addressed: bool) -> usize {
    START_MARKER.len() + usize::from(addressed) + 1
}

/// Extract the payload from a reply line
///
/// The payload sits at a fixed offset: after the start marker and, for
/// addressed commands, the echoed address byte, and before the stop marker.
pub fn decode_payload(line: &[u8], addressed: bool) -> Result<&[u8], ProtocolError> {
    if line.last() != Some(&STOP_MARKER) {
        return Err(ProtocolError::Unterminated(line.len()));
    }

    let needed = framing_overhead(addressed);
    if line.len() < needed {
        return Err(ProtocolError::ShortResponse {
            len: line.len(),
            needed,
        });
    }

    let start = START_MARKER.len() + usize::from(addressed);
    Ok(&line[start..line.len() - 1])
}
