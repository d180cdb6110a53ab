//! CAN frame types for the monitoring pipeline

use std::fmt;

use serde::{Deserialize, Serialize};

use super::KernelTimestamp;

/// Extended frame format flag in a raw `can_id` word
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;
/// Remote transmission request flag in a raw `can_id` word
pub const CAN_RTR_FLAG: u32 = 0x4000_0000;
/// Error frame flag in a raw `can_id` word
pub const CAN_ERR_FLAG: u32 = 0x2000_0000;
/// Standard (11-bit) identifier mask
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;
/// Extended (29-bit) identifier mask
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;
/// Maximum classic CAN payload length
pub const CAN_MAX_DLEN: usize = 8;

/// Sender identifier on the bus.
///
/// Standard and extended identifiers share one numeric space in the registry;
/// the value is always masked to 11 or 29 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanId(u32);

impl CanId {
    /// Decode the identifier from a raw kernel `can_id` word.
    ///
    /// The mask is chosen by the extended-format flag; RTR and error flags are dropped.
    pub fn from_raw(raw: u32) -> Self {
        if raw & CAN_EFF_FLAG != 0 { Self(raw & CAN_EFF_MASK) } else { Self(raw & CAN_SFF_MASK) }
    }

    /// Build an identifier, masking to the requested format width.
    pub fn new(id: u32, extended: bool) -> Self {
        if extended { Self(id & CAN_EFF_MASK) } else { Self(id & CAN_SFF_MASK) }
    }

    /// Numeric identifier value
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03x}", self.0)
    }
}

/// One received CAN frame paired with its kernel arrival timestamp.
///
/// The timestamp comes from the same receive call as the frame. A frame whose
/// timestamp is [`KernelTimestamp::UNAVAILABLE`] must not advance any estimator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Masked sender identifier
    pub id: CanId,

    /// Extended (29-bit) frame format
    pub extended: bool,

    /// Remote transmission request
    pub remote: bool,

    /// Payload, truncated to the declared length
    pub data: Vec<u8>,

    /// Kernel arrival timestamp
    pub timestamp: KernelTimestamp,
}

impl CanFrame {
    /// Create a standard-format data frame.
    ///
    /// Payloads longer than eight bytes are truncated.
    pub fn new(id: u32, data: &[u8], timestamp: KernelTimestamp) -> Self {
        let len = data.len().min(CAN_MAX_DLEN);
        Self {
            id: CanId::new(id, false),
            extended: false,
            remote: false,
            data: data[..len].to_vec(),
            timestamp,
        }
    }

    /// Decode a frame from the kernel's raw `can_id`, declared length and payload buffer.
    pub fn from_raw(raw_id: u32, dlc: u8, payload: &[u8; CAN_MAX_DLEN], timestamp: KernelTimestamp) -> Self {
        let len = (dlc as usize).min(CAN_MAX_DLEN);
        Self {
            id: CanId::from_raw(raw_id),
            extended: raw_id & CAN_EFF_FLAG != 0,
            remote: raw_id & CAN_RTR_FLAG != 0,
            data: payload[..len].to_vec(),
            timestamp,
        }
    }

    /// Whether this frame carries a trustworthy arrival time
    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn raw_ids_are_masked_by_format(raw in any::<u32>()) {
            let id = CanId::from_raw(raw);
            if raw & CAN_EFF_FLAG != 0 {
                prop_assert!(id.value() <= CAN_EFF_MASK);
                prop_assert_eq!(id.value(), raw & CAN_EFF_MASK);
            } else {
                prop_assert!(id.value() <= CAN_SFF_MASK);
            }
        }

        #[test]
        fn payload_never_exceeds_declared_length(dlc in 0u8..=15, payload in any::<[u8; 8]>()) {
            let frame = CanFrame::from_raw(0x123, dlc, &payload, KernelTimestamp::UNAVAILABLE);
            prop_assert_eq!(frame.data.len(), (dlc as usize).min(CAN_MAX_DLEN));
            prop_assert_eq!(&frame.data[..], &payload[..frame.data.len()]);
        }
    }

    #[test]
    fn extended_frame_flags_decode() {
        let raw = CAN_EFF_FLAG | CAN_RTR_FLAG | 0x18DA_F110;
        let frame = CanFrame::from_raw(raw, 0, &[0; 8], KernelTimestamp::from_nanos(1));
        assert!(frame.extended);
        assert!(frame.remote);
        assert_eq!(frame.id.value(), 0x18DA_F110);
        assert!(frame.data.is_empty());
    }

    #[test]
    fn standard_id_drops_high_bits() {
        assert_eq!(CanId::from_raw(0x1234_5678 & !CAN_EFF_FLAG).value(), 0x678);
        assert_eq!(CanId::new(0xFFFF, false).value(), 0x7FF);
        assert_eq!(CanId::new(0xFFFF_FFFF, true).value(), CAN_EFF_MASK);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(CanId::new(0x1A, false).to_string(), "0x01a");
    }

    #[test]
    fn new_truncates_long_payloads() {
        let frame = CanFrame::new(0x100, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], KernelTimestamp::UNAVAILABLE);
        assert_eq!(frame.data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(!frame.has_timestamp());
    }
}
