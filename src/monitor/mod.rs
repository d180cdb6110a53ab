//! Monitor loop: frame in, classification record out.
//!
//! [`Monitor`] is the synchronous core. It owns the identity registry and the
//! classifier and processes one frame completely before the next.
//! [`Driver`] runs that core as a tokio task over a [`FrameSource`](crate::FrameSource),
//! and [`MonitorSession`] is the handle callers hold.

mod driver;
mod session;


pub use driver::{Driver, DriverChannels};
pub use session::MonitorSession;

use std::fmt;

use serde::Serialize;
use tracing::{trace, warn};

use crate::Result;
use crate::classifier::Classifier;
use crate::config::DetectorConfig;
use crate::registry::IdentityRegistry;
use crate::types::{CanFrame, ClassificationRecord};

/// Why the monitor loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The stop signal fired
    Cancelled,

    /// The frame source reported end of stream
    SourceEnded,

    /// The record receiver was dropped
    SinkClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::SourceEnded => f.write_str("source ended"),
            StopReason::SinkClosed => f.write_str("record sink closed"),
        }
    }
}

/// Summary of a finished monitoring run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    /// Frames read from the source
    pub frames_received: u64,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Frames skipped because they carried no kernel timestamp
    pub skipped_untimestamped: u64,

    /// Frames skipped because their timestamp went backwards for that sender
    pub skipped_out_of_order: u64,

    /// Distinct sender identifiers seen
    pub identifiers: usize,

    /// Why the loop ended
    pub stop_reason: StopReason,
}

/// Sequential monitoring core.
#[derive(Debug, Clone)]
pub struct Monitor {
    registry: IdentityRegistry,
    classifier: Classifier,

    frames_received: u64,
    records_emitted: u64,
    skipped_untimestamped: u64,
    skipped_out_of_order: u64,
}

impl Monitor {
    /// Create a monitor whose senders all use `config`
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            registry: IdentityRegistry::new(config),
            classifier: Classifier::new(&config),
            frames_received: 0,
            records_emitted: 0,
            skipped_untimestamped: 0,
            skipped_out_of_order: 0,
        }
    }

    /// Process one frame.
    ///
    /// Returns `Ok(None)` for frames that are skipped without touching any
    /// estimator: those without a kernel timestamp, and those older than the
    /// sender's last timestamp. Every frame that reaches the estimator yields
    /// exactly one record, including the first frame of a sender, which only
    /// sets its baseline and is reported as warm-up.
    ///
    /// A filter failure is returned as-is and ends monitoring.
    pub fn observe(&mut self, frame: &CanFrame) -> Result<Option<ClassificationRecord>> {
        self.frames_received += 1;

        if !frame.has_timestamp() {
            self.skipped_untimestamped += 1;
            trace!(can_id = %frame.id, "Skipping frame without kernel timestamp");
            return Ok(None);
        }

        let state = self.registry.resolve(frame.id);

        if let Some(last) = state.last_timestamp()
            && frame.timestamp < last
        {
            self.skipped_out_of_order += 1;
            warn!(
                can_id = %frame.id,
                timestamp = frame.timestamp.as_nanos(),
                last = last.as_nanos(),
                "Skipping out-of-order frame"
            );
            return Ok(None);
        }

        let estimate = state.update_from_timestamp(frame.timestamp)?;
        let sample_count = state.sample_count();
        let verdict = self.classifier.classify(sample_count, estimate.residual);

        self.records_emitted += 1;

        Ok(Some(ClassificationRecord {
            id: frame.id,
            timestamp: frame.timestamp,
            drift: estimate.drift,
            residual: estimate.residual.abs(),
            sample_count,
            verdict,
        }))
    }

    /// Per-sender states seen so far
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Frames passed to [`observe`](Self::observe)
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Build the run summary as of now
    pub fn report(&self, stop_reason: StopReason) -> MonitorReport {
        MonitorReport {
            frames_received: self.frames_received,
            records_emitted: self.records_emitted,
            skipped_untimestamped: self.skipped_untimestamped,
            skipped_out_of_order: self.skipped_out_of_order,
            identifiers: self.registry.len(),
            stop_reason,
        }
    }
}
