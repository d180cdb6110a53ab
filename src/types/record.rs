//! Verdicts and classification records emitted by the monitor

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CanId, KernelTimestamp};

/// Live verdict for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Not enough samples yet for the estimate to be trusted
    Warmup,

    /// Timing is consistent with the sender's physical clock
    Nominal,

    /// Residual exceeds the physical jitter envelope
    Anomaly,
}

impl Verdict {
    /// Upper-case label used by log and console sinks
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Warmup => "WARMUP",
            Verdict::Nominal => "NOMINAL",
            Verdict::Anomaly => "ANOMALY",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one monitor step for one sender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Sender identifier
    pub id: CanId,

    /// Kernel arrival time of the frame that produced this record
    pub timestamp: KernelTimestamp,

    /// Smoothed frequency drift estimate
    pub drift: f64,

    /// Absolute residual in seconds
    pub residual: f64,

    /// Estimator sample count after this observation
    pub sample_count: u64,

    /// Verdict for this observation
    pub verdict: Verdict,
}

impl ClassificationRecord {
    /// Residual magnitude in microseconds
    pub fn residual_us(&self) -> f64 {
        self.residual * 1e6
    }

    /// Whether this record flags the sender as anomalous
    pub fn is_anomaly(&self) -> bool {
        self.verdict == Verdict::Anomaly
    }
}

impl fmt::Display for ClassificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | drift {:+.3e} | residual {:8.2}us | {}",
            self.id,
            self.drift,
            self.residual_us(),
            self.verdict
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_labels() {
        assert_eq!(Verdict::Warmup.to_string(), "WARMUP");
        assert_eq!(Verdict::Nominal.to_string(), "NOMINAL");
        assert_eq!(Verdict::Anomaly.to_string(), "ANOMALY");
    }

    #[test]
    fn record_display_contains_id_and_verdict() {
        let record = ClassificationRecord {
            id: CanId::new(0x1A0, false),
            timestamp: KernelTimestamp::from_nanos(5),
            drift: 1.5e-9,
            residual: 250e-6,
            sample_count: 12,
            verdict: Verdict::Anomaly,
        };

        let line = record.to_string();
        assert!(line.starts_with("0x1a0"));
        assert!(line.contains("ANOMALY"));
        assert!(line.contains("250.00us"));
        assert!(record.is_anomaly());
        assert!((record.residual_us() - 250.0).abs() < 1e-9);
    }
}
