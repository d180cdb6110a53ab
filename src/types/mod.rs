//! Core types for frames, timestamps and verdicts.
//!
//! ## Architecture
//!
//! - [`CanFrame`] is one received frame paired with its kernel arrival time
//! - [`CanId`] is the masked 11- or 29-bit sender identifier that keys the registry
//! - [`KernelTimestamp`] is fixed-point nanoseconds with a zero "unavailable" sentinel
//! - [`ClassificationRecord`] is what the monitor emits per estimator update
//!
//! ## Usage Example
//!
//! ```rust
//! use sentinel::types::{CanFrame, KernelTimestamp};
//!
//! let earlier = CanFrame::new(0x123, &[0xDE, 0xAD], KernelTimestamp::from_secs_nanos(10, 0));
//! let later = CanFrame::new(0x123, &[0xBE, 0xEF], KernelTimestamp::from_secs_nanos(10, 10_000_000));
//!
//! let interval = later.timestamp.seconds_since(earlier.timestamp);
//! assert!((interval - 0.010).abs() < 1e-12);
//! assert!(!CanFrame::new(0x123, &[], KernelTimestamp::UNAVAILABLE).has_timestamp());
//! ```

mod frame;
mod record;
mod timestamp;

// Re-export all public types
pub use frame::{
    CAN_EFF_FLAG, CAN_EFF_MASK, CAN_ERR_FLAG, CAN_MAX_DLEN, CAN_RTR_FLAG, CAN_SFF_MASK, CanFrame,
    CanId,
};
pub use record::{ClassificationRecord, Verdict};
pub use timestamp::KernelTimestamp;
