//! Replay source for recorded or synthetic traffic

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::Result;
use crate::source::FrameSource;
use crate::types::{CanFrame, KernelTimestamp};

/// Source that replays an in-memory frame sequence.
///
/// Stands in for the live transport in test mode. Frames are yielded
/// immediately, without pacing; their timestamps already carry the timing.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    name: String,
    frames: VecDeque<CanFrame>,
    delivered: usize,
    closed: bool,
}

impl ReplaySource {
    /// Create a replay source from frames in arrival order
    pub fn new(frames: impl IntoIterator<Item = CanFrame>) -> Self {
        Self {
            name: "replay".to_string(),
            frames: frames.into_iter().collect(),
            delivered: 0,
            closed: false,
        }
    }

    /// Build a single-sender stream from inter-arrival intervals (seconds).
    ///
    /// The first frame lands at `start`; each interval advances the clock.
    pub fn from_intervals(
        id: u32,
        start: KernelTimestamp,
        intervals: impl IntoIterator<Item = f64>,
    ) -> Self {
        let mut now = start.as_nanos();
        let mut frames = vec![CanFrame::new(id, &[], start)];
        for interval in intervals {
            // Step in whole nanoseconds so epoch-scale starts keep full precision
            now = now.saturating_add_signed((interval * 1e9).round() as i64);
            frames.push(CanFrame::new(id, &[], KernelTimestamp::from_nanos(now)));
        }
        Self::new(frames)
    }

    /// Set the label reported by [`FrameSource::name`]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Frames not yet delivered
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Whether [`FrameSource::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait::async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<Option<CanFrame>> {
        if self.closed {
            return Ok(None);
        }

        let Some(frame) = self.frames.pop_front() else {
            debug!("Reached end of replay after {} frames", self.delivered);
            return Ok(None);
        };

        self.delivered += 1;
        trace!(can_id = %frame.id, timestamp = frame.timestamp.as_nanos(), "Replay frame");

        // Let other tasks run between frames, as a socket read would
        tokio::task::yield_now().await;

        Ok(Some(frame))
    }

    fn close(&mut self) {
        if !self.closed {
            debug!("Closing replay source '{}'", self.name);
            self.closed = true;
            self.frames.clear();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
