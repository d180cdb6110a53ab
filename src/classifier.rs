//! Stateless verdict rules

use crate::config::DetectorConfig;
use crate::types::Verdict;

/// Maps `(sample count, residual)` to a [`Verdict`].
///
/// Every observation is judged on its own; there is no hysteresis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    warmup_threshold: u64,
    anomaly_threshold: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl Classifier {
    /// Create a classifier from the detector thresholds
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            warmup_threshold: config.warmup_threshold,
            anomaly_threshold: config.anomaly_threshold,
        }
    }

    /// Classify one observation.
    pub fn classify(&self, sample_count: u64, residual: f64) -> Verdict {
        if sample_count < self.warmup_threshold {
            Verdict::Warmup
        } else if residual.abs() < self.anomaly_threshold {
            Verdict::Nominal
        } else {
            Verdict::Anomaly
        }
    }
}
