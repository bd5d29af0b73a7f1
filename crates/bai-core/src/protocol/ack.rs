//! Write acknowledgment
//!
//! After a parameter write the drive answers with exactly `ACK_LEN` bytes
//! and no stop marker, so a line read would block until the timeout. The
//! waiter polls the receive queue instead.

use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ProtocolError, Transport, ACK_LEN};

/// Wait for the write acknowledgment and consume it.
///
/// Sleeps `poll_interval`, then checks the pending byte count, up to
/// `max_polls` times. Succeeds as soon as exactly `ACK_LEN` bytes are
/// waiting. Any other count, including more bytes, means "not yet".
pub fn wait_for_ack<T: Transport + ?Sized>(
    transport: &mut T,
    poll_interval: Duration,
    max_polls: u32,
) -> Result<(), ProtocolError> {
    for poll in 1..=max_polls {
        thread::sleep(poll_interval);
        let pending = transport.pending_byte_count()?;
        if pending as usize == ACK_LEN {
            let ack = transport.read_exact(ACK_LEN)?;
            debug!(poll, ack = ?ack, "write acknowledged");
            return Ok(());
        }
    }

    warn!(attempts = max_polls, "no write acknowledgment");
    Err(ProtocolError::AckTimeout {
        attempts: max_polls,
    })
}
