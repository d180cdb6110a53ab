//! Kernel arrival timestamps

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Arrival time recorded by the kernel at packet reception.
///
/// Fixed-point nanoseconds since the Unix epoch. Zero is the sentinel for
/// "no ancillary timestamp was attached to this read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct KernelTimestamp(u64);

impl KernelTimestamp {
    /// No trustworthy timestamp available
    pub const UNAVAILABLE: Self = Self(0);

    /// Create a timestamp from nanoseconds since the epoch
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from a `timespec`-style pair
    pub fn from_secs_nanos(secs: i64, nanos: i64) -> Self {
        if secs < 0 || nanos < 0 {
            return Self::UNAVAILABLE;
        }
        Self((secs as u64).saturating_mul(1_000_000_000).saturating_add(nanos as u64))
    }

    /// Create a timestamp from a `timeval`-style pair
    pub fn from_secs_micros(secs: i64, micros: i64) -> Self {
        Self::from_secs_nanos(secs, micros.saturating_mul(1_000))
    }

    /// Create a timestamp from floating-point seconds (rounded to the nanosecond)
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::UNAVAILABLE;
        }
        Self((secs * 1e9).round() as u64)
    }

    /// Nanoseconds since the epoch
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Seconds since the epoch as floating point
    pub fn as_secs_f64(self) -> f64 {
        Duration::from_nanos(self.0).as_secs_f64()
    }

    /// Whether this is a real timestamp rather than the sentinel
    pub fn is_available(self) -> bool {
        self.0 != 0
    }

    /// Signed seconds elapsed since `earlier`.
    ///
    /// Computed in integer nanoseconds first so that large epoch values do not
    /// swallow sub-microsecond differences.
    pub fn seconds_since(self, earlier: KernelTimestamp) -> f64 {
        let delta = self.0 as i128 - earlier.0 as i128;
        delta as f64 / 1e9
    }
}
