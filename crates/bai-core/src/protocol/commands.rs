//! Drive command codes

/// Commands understood by the drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the status word (`PS`)
    Status,
    /// Print the axis position (`PX`)
    Position,
    /// Read a parameter (`RP <id>`)
    ReadParameter,
    /// Write a parameter (`WP <id> <value>`)
    WriteParameter,
    /// Save parameters to flash (`SP`)
    SaveParameters,
    /// Reset the unit (`RE`)
    Reset,
    /// Toggle between local and remote mode (`\x01`)
    ToggleMode,
}

impl Command {
    /// Command code as sent on the wire
    pub fn code(&self) -> &'static [u8] {
        match self {
            Command::Status => b"PS",
            Command::Position => b"PX",
            Command::ReadParameter => b"RP",
            Command::WriteParameter => b"WP",
            Command::SaveParameters => b"SP",
            Command::Reset => b"RE",
            Command::ToggleMode => b"\x01",
        }
    }

    /// Whether the command carries a unit address. The mode toggle reaches
    /// every unit on the chain.
    pub fn is_addressed(&self) -> bool {
        !matches!(self, Command::ToggleMode)
    }

    /// Human-readable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "print status",
            Command::Position => "print axis position",
            Command::ReadParameter => "read parameter",
            Command::WriteParameter => "write parameter",
            Command::SaveParameters => "save parameters",
            Command::Reset => "reset unit",
            Command::ToggleMode => "toggle mode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Command::Status.code(), b"PS");
        assert_eq!(Command::WriteParameter.code(), b"WP");
        assert_eq!(Command::ToggleMode.code(), &[0x01]);
    }

    #[test]
    fn test_only_toggle_is_unaddressed() {
        assert!(Command::ReadParameter.is_addressed());
        assert!(!Command::ToggleMode.is_addressed());
    }
}
