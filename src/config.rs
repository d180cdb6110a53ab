//! Detector and monitor configuration
//!
//! Configuration can be built in code or loaded from YAML:
//!
//! ```rust
//! use sentinel::MonitorConfig;
//!
//! let config = MonitorConfig::from_yaml_str(
//!     "interface: can0\ndetector:\n  measurement_noise: 2.5e-9\n",
//! ).unwrap();
//! assert_eq!(config.interface, "can0");
//! assert_eq!(config.detector.warmup_threshold, 10);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, SentinelError};

/// Expected steady-state gap between messages (10ms, 100Hz)
pub const DEFAULT_NOMINAL_INTERVAL: f64 = 0.010;
/// Allowed per-step change of the physical drift
pub const DEFAULT_PROCESS_NOISE: f64 = 1e-12;
/// Trust placed in a single observed interval
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 1e-10;
/// Samples required before verdicts are trusted
pub const DEFAULT_WARMUP_THRESHOLD: u64 = 10;
/// Residual magnitude above which a sample is anomalous (200us)
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 200e-6;
/// Capacity of the record channel between the monitor and its sink
pub const DEFAULT_RECORD_BUFFER: usize = 1024;

/// Filter and classifier parameters shared by every sender in a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected inter-message interval in seconds
    pub nominal_interval: f64,

    /// Process noise (smaller means a stiffer physical drift assumption)
    pub process_noise: f64,

    /// Measurement noise (larger means more jitter tolerance, less responsiveness)
    pub measurement_noise: f64,

    /// Minimum samples before verdicts leave warm-up
    pub warmup_threshold: u64,

    /// Residual magnitude in seconds above which a sample is flagged
    pub anomaly_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            nominal_interval: DEFAULT_NOMINAL_INTERVAL,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            warmup_threshold: DEFAULT_WARMUP_THRESHOLD,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    /// Calibrate measurement noise to a receiver's OS jitter floor.
    ///
    /// `jitter_std` is the standard deviation of receive-side jitter in seconds;
    /// measurement noise becomes its square.
    pub fn calibrated_for_jitter(mut self, jitter_std: f64) -> Self {
        self.measurement_noise = jitter_std * jitter_std;
        self
    }

    /// Set the nominal interval
    pub fn with_nominal_interval(mut self, seconds: f64) -> Self {
        self.nominal_interval = seconds;
        self
    }

    /// Check every value is usable by the filter and classifier.
    pub fn validate(&self) -> Result<()> {
        if !self.nominal_interval.is_finite() || self.nominal_interval <= 0.0 {
            return Err(SentinelError::config_invalid(
                "nominal_interval",
                format!("must be a positive number of seconds, got {}", self.nominal_interval),
            ));
        }
        if !self.process_noise.is_finite() || self.process_noise < 0.0 {
            return Err(SentinelError::config_invalid(
                "process_noise",
                format!("must be finite and non-negative, got {}", self.process_noise),
            ));
        }
        if !self.measurement_noise.is_finite() || self.measurement_noise <= 0.0 {
            return Err(SentinelError::config_invalid(
                "measurement_noise",
                format!("must be finite and positive, got {}", self.measurement_noise),
            ));
        }
        if !self.anomaly_threshold.is_finite() || self.anomaly_threshold <= 0.0 {
            return Err(SentinelError::config_invalid(
                "anomaly_threshold",
                format!("must be a positive number of seconds, got {}", self.anomaly_threshold),
            ));
        }
        Ok(())
    }
}

/// Settings for one monitoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// SocketCAN interface name
    pub interface: String,

    /// Capacity of the record channel
    pub record_buffer: usize,

    /// Filter and classifier parameters
    pub detector: DetectorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interface: "vcan0".to_string(),
            record_buffer: DEFAULT_RECORD_BUFFER,
            detector: DetectorConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Default configuration for the named interface
    pub fn for_interface(interface: impl Into<String>) -> Self {
        Self { interface: interface.into(), ..Self::default() }
    }

    /// Parse and validate a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: MonitorConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading monitor configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SentinelError::io_error(format!("reading {}", path.display()), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the session settings and the detector parameters
    pub fn validate(&self) -> Result<()> {
        if self.interface.is_empty() {
            return Err(SentinelError::config_invalid("interface", "must not be empty"));
        }
        if self.record_buffer == 0 {
            return Err(SentinelError::config_invalid("record_buffer", "must be at least 1"));
        }
        self.detector.validate()
    }
}
