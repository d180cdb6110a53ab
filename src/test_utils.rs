//! Synthetic CAN traffic for tests and benchmarks
//!
//! Interval generators for the three sender models the detector is meant to
//! tell apart. All generators draw from one
//! seeded RNG so test runs are reproducible.

#![cfg(any(test, feature = "benchmark"))]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DEFAULT_NOMINAL_INTERVAL;
use crate::types::{CanFrame, KernelTimestamp};

/// Mean reversion rate of the oscillator jitter process
const OU_THETA: f64 = 0.15;
/// Step noise of the oscillator jitter process (seconds)
const OU_SIGMA: f64 = 1e-5;
/// Peak thermal drift of a physical clock (seconds)
const THERMAL_AMPLITUDE: f64 = 2e-5;
/// Phase swept by the thermal drift over the whole sequence (radians)
const THERMAL_SWEEP: f64 = 4.0;

/// Seeded generator of inter-arrival interval sequences.
#[derive(Debug, Clone)]
pub struct SyntheticTraffic {
    samples: usize,
    nominal_interval: f64,
    rng: StdRng,
}

impl SyntheticTraffic {
    /// Generator for `samples` intervals at the default 10 ms period
    pub fn seeded(samples: usize, seed: u64) -> Self {
        Self { samples, nominal_interval: DEFAULT_NOMINAL_INTERVAL, rng: StdRng::seed_from_u64(seed) }
    }

    /// Use a different nominal period (seconds)
    pub fn with_nominal_interval(mut self, seconds: f64) -> Self {
        self.nominal_interval = seconds;
        self
    }

    /// Perfectly periodic sender: every interval is exactly nominal
    pub fn perfect_attacker(&mut self) -> Vec<f64> {
        vec![self.nominal_interval; self.samples]
    }

    /// Memoryless sender: nominal plus independent Gaussian noise
    pub fn smart_attacker(&mut self, noise_std: f64) -> Vec<f64> {
        (0..self.samples).map(|_| self.nominal_interval + noise_std * self.gaussian()).collect()
    }

    /// Physical oscillator: slow sinusoidal thermal drift plus mean-reverting jitter.
    pub fn real_ecu(&mut self) -> Vec<f64> {
        let span = self.samples.saturating_sub(1).max(1) as f64;
        let mut jitter = 0.0;

        (0..self.samples)
            .map(|i| {
                jitter += -OU_THETA * jitter + OU_SIGMA * self.gaussian();
                let thermal = (THERMAL_SWEEP * i as f64 / span).sin() * THERMAL_AMPLITUDE;
                self.nominal_interval + jitter + thermal
            })
            .collect()
    }

    /// Add uncorrelated receive-side OS jitter to an interval sequence
    pub fn with_receiver_jitter(&mut self, mut intervals: Vec<f64>, jitter_std: f64) -> Vec<f64> {
        if jitter_std > 0.0 {
            for interval in &mut intervals {
                *interval += jitter_std * self.gaussian();
            }
        }
        intervals
    }

    /// Standard normal sample (Box-Muller)
    fn gaussian(&mut self) -> f64 {
        // 1 - [0, 1) keeps the log argument away from zero
        let u1: f64 = 1.0 - self.rng.gen_range(0.0..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Turn intervals (seconds) into timestamped frames for one sender.
///
/// The first frame lands at `start_ns`; each interval advances the clock in
/// whole nanoseconds.
pub fn frames_from_intervals(id: u32, start_ns: u64, intervals: &[f64]) -> Vec<CanFrame> {
    let mut now = start_ns;
    let mut frames = Vec::with_capacity(intervals.len() + 1);
    frames.push(CanFrame::new(id, &[], KernelTimestamp::from_nanos(now)));
    for interval in intervals {
        now = now.saturating_add_signed((interval * 1e9).round() as i64);
        frames.push(CanFrame::new(id, &[], KernelTimestamp::from_nanos(now)));
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::statistics::{Data, Distribution};

    #[test]
    fn same_seed_same_sequence() {
        let a = SyntheticTraffic::seeded(100, 7).smart_attacker(50e-6);
        let b = SyntheticTraffic::seeded(100, 7).smart_attacker(50e-6);
        assert_eq!(a, b);
    }

    #[test]
    fn smart_attacker_noise_has_requested_spread() {
        let intervals = Data::new(SyntheticTraffic::seeded(20_000, 11).smart_attacker(50e-6));
        assert!((intervals.mean().unwrap() - 0.010).abs() < 2e-6);
        assert!((intervals.std_dev().unwrap() - 50e-6).abs() < 3e-6);
    }

    #[test]
    fn perfect_attacker_is_flat() {
        let intervals = SyntheticTraffic::seeded(10, 1).perfect_attacker();
        assert_eq!(intervals, vec![0.010; 10]);
    }

    #[test]
    fn real_ecu_stays_near_nominal() {
        let intervals = SyntheticTraffic::seeded(5000, 3).real_ecu();
        assert_eq!(intervals.len(), 5000);
        assert!(intervals.iter().all(|i| (i - 0.010).abs() < 2e-4));
    }

    #[test]
    fn receiver_jitter_zero_is_identity() {
        let mut traffic = SyntheticTraffic::seeded(10, 1);
        let flat = traffic.perfect_attacker();
        assert_eq!(traffic.with_receiver_jitter(flat.clone(), 0.0), flat);
    }

    #[test]
    fn frames_follow_intervals() {
        let frames = frames_from_intervals(0x55, 1_000, &[0.001, 0.002]);
        let nanos: Vec<u64> = frames.iter().map(|f| f.timestamp.as_nanos()).collect();
        assert_eq!(nanos, vec![1_000, 1_001_000, 3_001_000]);
    }
}
