//! Drive status word decoding
//!
//! The `PS` command returns a 32-bit status word. Each field is either a
//! single bit or a group of bits (the three opto inputs, the three opto
//! outputs, the three Hall sensors).

use serde::Serialize;

/// Bits a status field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMask {
    /// A single flag
    Bit(u32),
    /// Several flags reported together, in this order
    Group(&'static [u32]),
}

/// One named field of the status word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusField {
    pub mask: StatusMask,
    pub name: &'static str,
}

const fn bit(n: u32, name: &'static str) -> StatusField {
    StatusField {
        mask: StatusMask::Bit(1 << n),
        name,
    }
}

const fn group(masks: &'static [u32], name: &'static str) -> StatusField {
    StatusField {
        mask: StatusMask::Group(masks),
        name,
    }
}

/// Status fields in reporting order
pub static STATUS_FIELDS: &[StatusField] = &[
    bit(0, "position error within limits"),
    bit(1, "running program"),
    bit(2, "program error"),
    bit(3, "illegal command"),
    bit(4, "axis fault"),
    bit(5, "command executing"),
    bit(6, "service request"),
    bit(7, "any error"),
    group(&[1 << 8, 1 << 9, 1 << 10], "opto input"),
    bit(11, "external enable"),
    group(&[1 << 12, 1 << 13, 1 << 14], "opto output"),
    bit(15, "fault out"),
    bit(16, "invalid hall state"),
    bit(17, "rms fault"),
    bit(18, "position error fault"),
    bit(19, "velocity error fault"),
    bit(20, "amplifier fault"),
    bit(21, "encoder fault"),
    bit(22, "flash memory fault"),
    bit(23, "estop fault"),
    bit(24, "thermistor fault"),
    group(&[1 << 25, 1 << 26, 1 << 27], "hall"),
    bit(28, "ccw limit"),
    bit(29, "cw limit"),
    bit(30, "home marker"),
    bit(31, "amp active"),
];

/// Decoded value of one status field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagState {
    Bit(bool),
    Group(Vec<bool>),
}

impl FlagState {
    /// True if any flag in the field is set
    pub fn any(&self) -> bool {
        match self {
            FlagState::Bit(b) => *b,
            FlagState::Group(bits) => bits.iter().any(|b| *b),
        }
    }
}

impl std::fmt::Display for FlagState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagState::Bit(b) => write!(f, "{}", b),
            FlagState::Group(bits) => {
                let parts: Vec<String> = bits.iter().map(|b| b.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// A decoded status word
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    raw: u32,
    flags: Vec<(&'static str, FlagState)>,
}

impl Status {
    /// Decode a raw status word against [`STATUS_FIELDS`]
    pub fn decode(raw: u32) -> Self {
        let flags = STATUS_FIELDS
            .iter()
            .map(|field| {
                let state = match field.mask {
                    StatusMask::Bit(mask) => FlagState::Bit(raw & mask != 0),
                    StatusMask::Group(masks) => {
                        FlagState::Group(masks.iter().map(|m| raw & m != 0).collect())
                    }
                };
                (field.name, state)
            })
            .collect();
        Self { raw, flags }
    }

    /// The undecoded status word
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FlagState> {
        self.flags
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, state)| state)
    }

    /// True if the named field has any flag set
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).map(FlagState::any).unwrap_or(false)
    }

    /// Fields in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FlagState)> {
        self.flags.iter().map(|(name, state)| (*name, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_bit_mapped_once() {
        let mut seen = 0u32;
        for field in STATUS_FIELDS {
            let masks: Vec<u32> = match field.mask {
                StatusMask::Bit(m) => vec![m],
                StatusMask::Group(ms) => ms.to_vec(),
            };
            for m in masks {
                assert_eq!(seen & m, 0, "bit {:#x} mapped twice", m);
                seen |= m;
            }
        }
        assert_eq!(seen, u32::MAX);
    }

    #[test]
    fn test_decode_single_bits() {
        let status = Status::decode(0b0100_0001);
        assert_eq!(status.get("position error within limits"), Some(&FlagState::Bit(true)));
        assert_eq!(status.get("service request"), Some(&FlagState::Bit(true)));
        assert_eq!(status.get("axis fault"), Some(&FlagState::Bit(false)));
        assert!(status.is_set("service request"));
        assert!(!status.is_set("amp active"));
    }

    #[test]
    fn test_decode_group_in_mask_order() {
        let status = Status::decode(0b101 << 8);
        assert_eq!(
            status.get("opto input"),
            Some(&FlagState::Group(vec![true, false, true]))
        );
        assert_eq!(
            status.get("opto output"),
            Some(&FlagState::Group(vec![false, false, false]))
        );
    }

    #[test]
    fn test_top_bit() {
        let status = Status::decode(1 << 31);
        assert!(status.is_set("amp active"));
        assert_eq!(status.raw(), 0x8000_0000);
    }

    #[test]
    fn test_iteration_order() {
        let status = Status::decode(0);
        let names: Vec<&str> = status.iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), STATUS_FIELDS.len());
        assert_eq!(names[0], "position error within limits");
        assert_eq!(names[names.len() - 1], "amp active");
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(Status::decode(u32::MAX).get("warp core"), None);
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(FlagState::Bit(true).to_string(), "true");
        assert_eq!(
            FlagState::Group(vec![true, false, true]).to_string(),
            "[true, false, true]"
        );
    }
}
