//! Protocol errors

use thiserror::Error;

use crate::params::ParamError;

/// Errors that can occur while talking to a drive
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid unit address '{0}': expected one printable ASCII character")]
    InvalidAddress(String),

    #[error("Response too short: {len} bytes, framing needs {needed}")]
    ShortResponse { len: usize, needed: usize },

    #[error("Response not terminated after {0} bytes (read timed out)")]
    Unterminated(usize),

    #[error("Malformed response '{payload}': {reason}")]
    MalformedResponse { payload: String, reason: String },

    #[error("No write acknowledgment after {attempts} polls")]
    AckTimeout { attempts: u32 },

    #[error("Baud rate {0} is not supported by the drive")]
    UnsupportedBaudRate(u32),

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl ProtocolError {
    /// True for failures of the serial link itself
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::SerialError(_) | ProtocolError::IoError(_))
    }

    /// True when the drive answered with something the codec could not use
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            ProtocolError::ShortResponse { .. }
                | ProtocolError::Unterminated(_)
                | ProtocolError::MalformedResponse { .. }
        )
    }

    pub(crate) fn malformed(payload: &[u8], reason: impl Into<String>) -> Self {
        ProtocolError::MalformedResponse {
            payload: String::from_utf8_lossy(payload).into_owned(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let io = ProtocolError::from(std::io::Error::new(std::io::ErrorKind::TimedOut, "t"));
        assert!(io.is_transport());
        assert!(!io.is_protocol());

        let short = ProtocolError::ShortResponse { len: 1, needed: 4 };
        assert!(short.is_protocol());
        assert!(!ProtocolError::AckTimeout { attempts: 20 }.is_protocol());
    }

    #[test]
    fn test_param_error_is_transparent() {
        let err = ProtocolError::from(ParamError::UnknownParameter("x".into()));
        assert_eq!(err.to_string(), "Unknown parameter 'x'");
    }
}
