//! Baud rate discovery
//!
//! A drive at an unknown line speed answers garbage or nothing at all. The
//! only reliable test found is to read every parameter cleanly at a given
//! rate. The first exchanges after a speed change tend to fail even at the
//! right rate, so each candidate starts with two throwaway reads.

use std::sync::Arc;
use tracing::{info, warn};

use super::{Address, Drive, Transport};

/// Candidate rates in probe order: the allowed list, twice
pub fn probe_sequence(allowed: &[u32]) -> Vec<u32> {
    allowed.iter().chain(allowed.iter()).copied().collect()
}

impl<T: Transport> Drive<T> {
    /// Find the drive's baud rate by trial.
    ///
    /// On success the link is left at the discovered rate. On failure it is
    /// left at the last rate tried.
    pub fn discover_baud(&mut self, address: Option<Address>) -> Option<u32> {
        let candidates = probe_sequence(self.registry().allowed_baud_rates());
        let last = candidates.len().saturating_sub(1);

        for (i, rate) in candidates.into_iter().enumerate() {
            info!(baud = rate, attempt = i + 1, "trying baud rate");
            match self.probe(rate, address) {
                Ok(()) => {
                    info!(baud = rate, "baud rate found");
                    return Some(rate);
                }
                Err(e) => {
                    warn!(baud = rate, error = %e, "baud rate rejected");
                    if i < last {
                        self.cooldown();
                    }
                }
            }
        }

        warn!("no baud rate produced clean replies");
        None
    }

    fn probe(&mut self, rate: u32, address: Option<Address>) -> Result<(), super::ProtocolError> {
        self.set_baud_rate(rate)?;
        self.warm_up(address);
        let registry = Arc::clone(self.registry());
        for spec in registry.iter() {
            self.read_parameter(spec, address)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_sequence_is_two_passes() {
        let seq = probe_sequence(&[1200, 9600]);
        assert_eq!(seq, vec![1200, 9600, 1200, 9600]);
        assert!(probe_sequence(&[]).is_empty());
    }
}
