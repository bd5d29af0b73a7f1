//! # BAI Core Library
//!
//! Serial control of Aerotech BA-Intellidrive servo controllers.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The drive's parameter table with type and range checking
//! - Framing of the drive's ASCII command protocol
//! - Status, position and parameter transactions over a serial link
//! - Write acknowledgment handling and baud rate discovery
//! - Parameter file import and export
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bai_core::prelude::*;
//!
//! let registry = Arc::new(ParameterRegistry::standard());
//! let config = DriveConfig {
//!     port_name: "/dev/ttyUSB0".into(),
//!     ..DriveConfig::default()
//! };
//! let mut drive = Drive::open(config, registry)?;
//!
//! let status = drive.read_status(None)?;
//! println!("amp active: {}", status.is_set("amp active"));
//!
//! drive.write_named("peak current limit", &Value::Int(80), None)?;
//! ```

pub mod paramfile;
pub mod params;
pub mod protocol;
pub mod status;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::paramfile::{export_defaults, ParamFileError};
    pub use crate::params::{ParamError, ParameterRegistry, ParameterSpec, Value, ValueType};
    pub use crate::protocol::{Address, Drive, DriveConfig, ProtocolError, SerialTransport, Transport};
    pub use crate::status::{FlagState, Status};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
