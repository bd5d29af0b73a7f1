//! Drive transactions
//!
//! [`Drive`] owns a transport and a shared parameter registry and runs one
//! request/response exchange at a time against a BA-Intellidrive.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use super::frame::{decode_payload, Address, CommandFrame};
use super::{
    ack, Command, ProtocolError, SerialTransport, Transport, DEFAULT_ACK_POLLS,
    DEFAULT_ACK_POLL_MS, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, DISCOVERY_COOLDOWN_MS,
    RESET_DELAY_MS, SAVE_DELAY_MS, TOGGLE_DELAY_MS,
};
use crate::params::{
    ParameterRegistry, ParameterSpec, Value, ValueType, BAUD_RATE_PARAM_ID,
    UNIT_ADDRESS_PARAM_ID,
};
use crate::status::Status;

/// Drive connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DriveConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Address used when a call does not name one
    pub address: Address,
    /// Delay between write acknowledgment polls in milliseconds
    pub ack_poll_ms: u64,
    /// Write acknowledgment polls before giving up
    pub ack_polls: u32,
    /// Pause after a rejected baud rate candidate in milliseconds
    pub discovery_cooldown_ms: u64,
    /// Settle time after a reset in milliseconds
    pub reset_delay_ms: u64,
    /// Settle time after saving to flash in milliseconds
    pub save_delay_ms: u64,
    /// Settle time after a mode toggle in milliseconds
    pub toggle_delay_ms: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port_name: String::from("/dev/ttyS0"),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            address: Address::default(),
            ack_poll_ms: DEFAULT_ACK_POLL_MS,
            ack_polls: DEFAULT_ACK_POLLS,
            discovery_cooldown_ms: DISCOVERY_COOLDOWN_MS,
            reset_delay_ms: RESET_DELAY_MS,
            save_delay_ms: SAVE_DELAY_MS,
            toggle_delay_ms: TOGGLE_DELAY_MS,
        }
    }
}

impl DriveConfig {
    /// Same configuration with every sleep set to zero. The acknowledgment
    /// poll budget is kept.
    pub fn without_delays(mut self) -> Self {
        self.ack_poll_ms = 0;
        self.discovery_cooldown_ms = 0;
        self.reset_delay_ms = 0;
        self.save_delay_ms = 0;
        self.toggle_delay_ms = 0;
        self
    }

    /// Read timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn ack_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ack_poll_ms)
    }

    pub(crate) fn discovery_cooldown(&self) -> Duration {
        Duration::from_millis(self.discovery_cooldown_ms)
    }
}

/// A parameter whose value on the drive differs from its factory default
#[derive(Debug, Clone, PartialEq)]
pub struct NonDefault {
    pub spec: ParameterSpec,
    pub current: Value,
    pub default: Value,
}

/// A BA-Intellidrive reached over a transport
pub struct Drive<T: Transport = SerialTransport> {
    transport: T,
    registry: Arc<ParameterRegistry>,
    config: DriveConfig,
}

impl Drive<SerialTransport> {
    /// Open the configured serial port
    pub fn open(config: DriveConfig, registry: Arc<ParameterRegistry>) -> Result<Self, ProtocolError> {
        let transport = SerialTransport::open(&config.port_name, config.baud_rate, config.timeout())?;
        info!(
            port = %config.port_name,
            baud = config.baud_rate,
            address = %config.address,
            "connected to drive"
        );
        Ok(Self::new(transport, registry, config))
    }
}

impl<T: Transport> Drive<T> {
    /// Create a drive over an already opened transport
    pub fn new(transport: T, registry: Arc<ParameterRegistry>, config: DriveConfig) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    /// The parameter registry
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    /// The active configuration
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give up the drive and return its transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Address used when a call does not name one
    pub fn default_address(&self) -> Address {
        self.config.address
    }

    /// Change the address used when a call does not name one
    pub fn set_default_address(&mut self, address: Address) {
        self.config.address = address;
    }

    /// Current line speed of the transport
    pub fn baud_rate(&self) -> u32 {
        self.transport.baud_rate()
    }

    /// Change the line speed of the transport only. The drive keeps its own
    /// setting; see [`Drive::change_baud_rate`].
    pub fn set_baud_rate(&mut self, rate: u32) -> Result<(), ProtocolError> {
        debug!(baud = rate, "setting line speed");
        self.transport.set_baud_rate(rate)?;
        self.config.baud_rate = rate;
        Ok(())
    }

    pub(crate) fn resolve(&self, address: Option<Address>) -> Address {
        address.unwrap_or(self.config.address)
    }

    /// Move `target` to the new unit address after a unit address write.
    /// The default address follows unless the caller named one.
    pub(crate) fn follow_unit_address(
        &mut self,
        spec: &ParameterSpec,
        value: &Value,
        explicit: Option<Address>,
        target: &mut Address,
    ) -> Result<(), ProtocolError> {
        if spec.id != UNIT_ADDRESS_PARAM_ID {
            return Ok(());
        }
        if let Value::Char(c) = spec.prepare(value)? {
            *target = Address::new(c)?;
            if explicit.is_none() {
                self.config.address = *target;
            }
            info!(address = %target, "unit address changed");
        }
        Ok(())
    }

    fn send(&mut self, frame: &CommandFrame) -> Result<(), ProtocolError> {
        let bytes = frame.encode();
        debug!(command = frame.command().name(), frame = ?String::from_utf8_lossy(&bytes), "send");
        self.transport.write(&bytes)?;
        Ok(())
    }

    /// Send a frame and return the payload of the reply line
    fn transact(&mut self, frame: &CommandFrame) -> Result<Vec<u8>, ProtocolError> {
        self.send(frame)?;
        let line = self.transport.read_line()?;
        debug!(reply = ?String::from_utf8_lossy(&line), "recv");
        let payload = decode_payload(&line, frame.is_addressed())?;
        Ok(payload.to_vec())
    }

    fn settle(&self, millis: u64) {
        if millis > 0 {
            thread::sleep(Duration::from_millis(millis));
        }
    }

    /// Read and decode the status word (`PS`)
    pub fn read_status(&mut self, address: Option<Address>) -> Result<Status, ProtocolError> {
        let frame = CommandFrame::new(Command::Status).address(self.resolve(address));
        let payload = self.transact(&frame)?;
        let raw = parse_status_word(&payload)?;
        Ok(Status::decode(raw))
    }

    /// Read the axis position in counts (`PX`)
    pub fn read_position(&mut self, address: Option<Address>) -> Result<i64, ProtocolError> {
        let frame = CommandFrame::new(Command::Position).address(self.resolve(address));
        let payload = self.transact(&frame)?;
        payload_text(&payload)?
            .trim()
            .parse::<i64>()
            .map_err(|e| ProtocolError::malformed(&payload, e.to_string()))
    }

    /// Read one parameter (`RP`) and convert the reply to its declared type
    pub fn read_parameter(
        &mut self,
        spec: &ParameterSpec,
        address: Option<Address>,
    ) -> Result<Value, ProtocolError> {
        let frame = CommandFrame::new(Command::ReadParameter)
            .address(self.resolve(address))
            .arg(spec.id);
        let payload = self.transact(&frame)?;
        parse_reply(spec, &payload)
    }

    /// Read a parameter given by name or number
    pub fn read_named(&mut self, key: &str, address: Option<Address>) -> Result<Value, ProtocolError> {
        let registry = Arc::clone(&self.registry);
        let spec = registry.lookup(key)?;
        self.read_parameter(spec, address)
    }

    /// Write one parameter (`WP`).
    ///
    /// The value is cast and range checked first; nothing is sent if that
    /// fails. With `expect_ack` the call waits for the drive's
    /// acknowledgment.
    pub fn write_parameter(
        &mut self,
        spec: &ParameterSpec,
        value: &Value,
        address: Option<Address>,
        expect_ack: bool,
    ) -> Result<(), ProtocolError> {
        let value = spec.prepare(value)?;
        let frame = CommandFrame::new(Command::WriteParameter)
            .address(self.resolve(address))
            .arg(spec.id)
            .arg(value.to_wire());
        self.send(&frame)?;
        if expect_ack {
            self.wait_for_ack()?;
        }
        debug!(param = %spec, value = %value, "parameter written");
        Ok(())
    }

    /// Write a parameter given by name or number and wait for the acknowledgment
    pub fn write_named(
        &mut self,
        key: &str,
        value: &Value,
        address: Option<Address>,
    ) -> Result<(), ProtocolError> {
        let registry = Arc::clone(&self.registry);
        let spec = registry.lookup(key)?;
        self.write_parameter(spec, value, address, true)
    }

    /// Wait for a write acknowledgment with the configured poll budget
    pub fn wait_for_ack(&mut self) -> Result<(), ProtocolError> {
        let interval = self.config.ack_poll_interval();
        ack::wait_for_ack(&mut self.transport, interval, self.config.ack_polls)
    }

    /// Save the current parameters to flash (`SP`)
    pub fn save_to_flash(&mut self, address: Option<Address>) -> Result<(), ProtocolError> {
        let frame = CommandFrame::new(Command::SaveParameters).address(self.resolve(address));
        self.send(&frame)?;
        self.transport.read_line()?;
        self.settle(self.config.save_delay_ms);
        info!("parameters saved to flash");
        Ok(())
    }

    /// Reset the unit (`RE`)
    pub fn reset(&mut self, address: Option<Address>) -> Result<(), ProtocolError> {
        let frame = CommandFrame::new(Command::Reset).address(self.resolve(address));
        self.send(&frame)?;
        self.transport.read_line()?;
        self.settle(self.config.reset_delay_ms);
        info!("drive reset");
        Ok(())
    }

    /// Toggle every unit on the link between local and remote mode.
    ///
    /// In local mode the drive ignores the serial port until toggled back.
    pub fn toggle_mode(&mut self) -> Result<(), ProtocolError> {
        let frame = CommandFrame::new(Command::ToggleMode);
        self.send(&frame)?;
        self.transport.read_line()?;
        self.settle(self.config.toggle_delay_ms);
        info!("mode toggled");
        Ok(())
    }

    /// Set the drive's baud rate.
    ///
    /// The drive only switches after a save and reset, so with
    /// `save_and_reset` the link speed follows; without it the link stays at
    /// the current rate and the new one applies after the next reset.
    pub fn change_baud_rate(
        &mut self,
        rate: u32,
        address: Option<Address>,
        save_and_reset: bool,
    ) -> Result<(), ProtocolError> {
        if !self.registry.allowed_baud_rates().contains(&rate) {
            return Err(ProtocolError::UnsupportedBaudRate(rate));
        }
        let registry = Arc::clone(&self.registry);
        let spec = registry
            .by_id(BAUD_RATE_PARAM_ID)
            .ok_or(ProtocolError::UnsupportedBaudRate(rate))?;

        self.write_parameter(spec, &Value::Int(i64::from(rate)), address, true)?;

        if save_and_reset {
            self.save_to_flash(address)?;
            self.reset(address)?;
            self.set_baud_rate(rate)?;
            info!(baud = rate, "drive baud rate changed");
        }
        Ok(())
    }

    /// Read every registry parameter in id order
    pub fn read_all(
        &mut self,
        address: Option<Address>,
    ) -> Result<Vec<(ParameterSpec, Value)>, ProtocolError> {
        let registry = Arc::clone(&self.registry);
        registry
            .iter()
            .map(|spec| Ok((spec.clone(), self.read_parameter(spec, address)?)))
            .collect()
    }

    /// Parameters whose current value differs from the factory default
    pub fn nondefault_parameters(
        &mut self,
        address: Option<Address>,
    ) -> Result<Vec<NonDefault>, ProtocolError> {
        Ok(self
            .read_all(address)?
            .into_iter()
            .filter(|(spec, current)| *current != spec.default)
            .map(|(spec, current)| NonDefault {
                default: spec.default.clone(),
                spec,
                current,
            })
            .collect())
    }

    /// Write the factory default to every parameter that differs from it.
    ///
    /// Restoring the unit address moves the remaining writes to the new
    /// address. With `save` the parameters are saved to flash and the link
    /// drops to the default baud rate. Returns what was rewritten.
    pub fn restore_defaults(
        &mut self,
        address: Option<Address>,
        save: bool,
    ) -> Result<Vec<NonDefault>, ProtocolError> {
        let changed = self.nondefault_parameters(address)?;
        let mut target = self.resolve(address);

        for entry in &changed {
            debug!(param = %entry.spec, value = %entry.default, "restoring default");
            self.write_parameter(&entry.spec, &entry.default, Some(target), true)?;
            self.follow_unit_address(&entry.spec, &entry.default, address, &mut target)?;
        }

        if save {
            self.save_to_flash(Some(target))?;
            let default_baud = self
                .registry
                .baud_rate()
                .and_then(|spec| spec.default.as_int())
                .and_then(|b| u32::try_from(b).ok())
                .unwrap_or(DEFAULT_BAUD_RATE);
            self.set_baud_rate(default_baud)?;
        }

        info!(count = changed.len(), "defaults restored");
        Ok(changed)
    }

    /// Release the transport. Later calls fail with a transport error.
    pub fn close(&mut self) {
        self.transport.close();
    }

    pub(crate) fn warm_up(&mut self, address: Option<Address>) {
        let registry = Arc::clone(&self.registry);
        if let Some(first) = registry.iter().next() {
            if let Err(e) = self.read_parameter(first, address) {
                debug!(error = %e, "warm-up parameter read failed");
            }
        }
        if let Err(e) = self.read_status(address) {
            debug!(error = %e, "warm-up status read failed");
        }
    }

    pub(crate) fn cooldown(&self) {
        let pause = self.config.discovery_cooldown();
        if !pause.is_zero() {
            debug!(seconds = pause.as_secs_f64(), "waiting before next baud rate");
            thread::sleep(pause);
        }
    }
}

fn payload_text(payload: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(payload).map_err(|_| ProtocolError::malformed(payload, "not ASCII"))
}

/// The drive prints the status word as a signed or unsigned decimal
fn parse_status_word(payload: &[u8]) -> Result<u32, ProtocolError> {
    let text = payload_text(payload)?.trim();
    let value = text
        .parse::<i64>()
        .map_err(|e| ProtocolError::malformed(payload, e.to_string()))?;
    if let Ok(word) = u32::try_from(value) {
        return Ok(word);
    }
    i32::try_from(value)
        .map(|v| v as u32)
        .map_err(|_| ProtocolError::malformed(payload, "status word out of 32-bit range"))
}

/// Convert a parameter reply to the parameter's declared type
fn parse_reply(spec: &ParameterSpec, payload: &[u8]) -> Result<Value, ProtocolError> {
    let text = payload_text(payload)?.trim();
    let bad = |reason: String| ProtocolError::malformed(payload, format!("{}: {}", spec, reason));

    match spec.value_type() {
        ValueType::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| bad(e.to_string())),
        ValueType::Float => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| bad(e.to_string())),
        // Characters come back as their decimal code
        ValueType::Char => match text.parse::<u8>() {
            Ok(code) => Ok(Value::Char(code)),
            Err(e) => match text.as_bytes() {
                [c] => Ok(Value::Char(*c)),
                _ => Err(bad(e.to_string())),
            },
        },
        ValueType::Str => Ok(Value::Str(text.to_string())),
    }
}
