//! Two-state clock drift estimator.
//!
//! Each sender gets one [`ClockState`]: a fixed two-dimensional linear
//! recursive filter over the state `(phase offset, frequency drift)` with one
//! scalar observation per step, the measured inter-arrival interval minus the
//! nominal interval.
//!
//! The state transition is constant-drift propagation over one message
//! interval:
//!
//! ```text
//! F = | 1  1 |     H = | 1  0 |     Q = q * I     R = r
//!     | 0  1 |
//! ```
//!
//! With a single observed dimension the gain is a closed-form 2x1 vector, so
//! the whole update is a handful of scalar operations.
//!
//! Measurement noise is the central tuning knob. Set it too low and the filter
//! chases single-sample OS jitter instead of the slow physical trend.

use tracing::trace;

use crate::config::DetectorConfig;
use crate::types::KernelTimestamp;
use crate::{Result, SentinelError};

/// Diagonal of the covariance before the first observation
const INITIAL_VARIANCE: f64 = 0.1;

/// Output of one filter step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    /// Observed offset minus predicted phase offset (seconds)
    pub residual: f64,

    /// Updated frequency drift estimate
    pub drift: f64,
}

/// Filter state for one sender identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockState {
    nominal_interval: f64,
    process_noise: f64,
    measurement_noise: f64,

    /// Accumulated timing error against the nominal interval
    phase: f64,
    /// Dimensionless rate error
    drift: f64,
    /// Row-major 2x2 estimate covariance
    covariance: [[f64; 2]; 2],

    last_timestamp: Option<KernelTimestamp>,
    sample_count: u64,
}

impl ClockState {
    /// Create a filter with the given detector parameters.
    ///
    /// Parameters are taken as-is; an invalid measurement noise surfaces as
    /// [`SentinelError::SingularMatrix`] on the first update that hits it.
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            nominal_interval: config.nominal_interval,
            process_noise: config.process_noise,
            measurement_noise: config.measurement_noise,
            phase: 0.0,
            drift: 0.0,
            covariance: [[INITIAL_VARIANCE, 0.0], [0.0, INITIAL_VARIANCE]],
            last_timestamp: None,
            sample_count: 0,
        }
    }

    /// Feed one observed inter-arrival interval (seconds).
    ///
    /// State is only committed when the step succeeds; a singular innovation
    /// leaves the filter untouched.
    pub fn update(&mut self, observed_interval: f64) -> Result<Estimate> {
        let [[p00, p01], [p10, p11]] = self.covariance;
        let q = self.process_noise;

        // Predict: x = F x, P = F P F^T + Q
        let phase_pred = self.phase + self.drift;
        let drift_pred = self.drift;
        let a = p00 + p01 + p10 + p11 + q;
        let b = p01 + p11;
        let c = p10 + p11;
        let d = p11 + q;

        let residual = (observed_interval - self.nominal_interval) - phase_pred;

        let innovation_variance = a + self.measurement_noise;
        if innovation_variance <= 0.0 || innovation_variance.is_nan() {
            return Err(SentinelError::SingularMatrix { innovation_variance });
        }

        let k0 = a / innovation_variance;
        let k1 = c / innovation_variance;

        self.phase = phase_pred + k0 * residual;
        self.drift = drift_pred + k1 * residual;

        // P = (I - K H) P_pred
        self.covariance = [[(1.0 - k0) * a, (1.0 - k0) * b], [c - k1 * a, d - k1 * b]];

        self.sample_count += 1;

        trace!(
            sample = self.sample_count,
            residual,
            drift = self.drift,
            "Clock state updated"
        );

        Ok(Estimate { residual, drift: self.drift })
    }

    /// Feed a kernel arrival timestamp.
    ///
    /// The first timestamp only becomes the baseline: it returns a zero
    /// estimate and does not count as a sample. Every later timestamp is turned
    /// into an interval against the previous one and passed to [`update`](Self::update).
    pub fn update_from_timestamp(&mut self, timestamp: KernelTimestamp) -> Result<Estimate> {
        let Some(last) = self.last_timestamp else {
            self.last_timestamp = Some(timestamp);
            return Ok(Estimate::default());
        };

        let interval = timestamp.seconds_since(last);
        let estimate = self.update(interval)?;
        self.last_timestamp = Some(timestamp);
        Ok(estimate)
    }

    /// Run a batch of intervals, returning the residual and drift histories.
    pub fn process_stream<I>(&mut self, intervals: I) -> Result<(Vec<f64>, Vec<f64>)>
    where
        I: IntoIterator<Item = f64>,
    {
        let intervals = intervals.into_iter();
        let (lower, _) = intervals.size_hint();
        let mut residuals = Vec::with_capacity(lower);
        let mut drifts = Vec::with_capacity(lower);

        for interval in intervals {
            let estimate = self.update(interval)?;
            residuals.push(estimate.residual);
            drifts.push(estimate.drift);
        }

        Ok((residuals, drifts))
    }

    /// Number of completed filter updates
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Current phase offset estimate (seconds)
    pub fn phase_offset(&self) -> f64 {
        self.phase
    }

    /// Current frequency drift estimate
    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// Current 2x2 estimate covariance
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        self.covariance
    }

    /// Last timestamp seen, if any
    pub fn last_timestamp(&self) -> Option<KernelTimestamp> {
        self.last_timestamp
    }

    /// Nominal interval this filter measures against
    pub fn nominal_interval(&self) -> f64 {
        self.nominal_interval
    }
}
