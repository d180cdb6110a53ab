//! Driver spawns and manages the monitor task

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::{Monitor, MonitorReport, StopReason};
use crate::Result;
use crate::config::DetectorConfig;
use crate::source::FrameSource;
use crate::types::ClassificationRecord;

/// Result of spawning the monitor task
pub struct DriverChannels {
    /// Receiver for classification records
    pub records: mpsc::Receiver<ClassificationRecord>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Monitor task; resolves to the run report or the fatal error
    pub task: JoinHandle<Result<MonitorReport>>,
}

/// Driver spawns the task that owns the frame source and the monitor state.
///
/// The task reads, estimates, classifies and emits one frame at a time. Reads
/// and blocked record sends both race the cancellation token, so a stop request
/// is honoured even while the bus is idle or the sink is slow. A record already
/// computed is still delivered when the channel has room.
pub struct Driver;

impl Driver {
    /// Spawn the monitor task for the given source.
    ///
    /// `record_buffer` bounds the record channel. When it is full the task
    /// waits for the sink instead of dropping records.
    pub fn spawn<S>(source: S, detector: DetectorConfig, record_buffer: usize) -> DriverChannels
    where
        S: FrameSource,
    {
        let (record_tx, record_rx) = mpsc::channel(record_buffer.max(1));
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        let task = tokio::spawn(async move {
            Self::monitor_task(source, Monitor::new(detector), record_tx, cancel_task).await
        });

        DriverChannels { records: record_rx, cancel, task }
    }

    /// Monitor task - reads frames until stopped, the source ends, or a read fails
    pub(super) async fn monitor_task<S>(
        mut source: S,
        mut monitor: Monitor,
        record_tx: mpsc::Sender<ClassificationRecord>,
        cancel: CancellationToken,
    ) -> Result<MonitorReport>
    where
        S: FrameSource,
    {
        info!(source = source.name(), "Monitor task started");
        let mut sent = 0u64;

        let stop_reason = loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Monitor cancelled during read");
                    break StopReason::Cancelled;
                }
                result = source.next_frame() => result,
            };

            let frame = match result {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Source '{}' ended after {} frames", source.name(), monitor.frames_received());
                    break StopReason::SourceEnded;
                }
                Err(e) => {
                    error!(error = %e, frames = monitor.frames_received(), "Frame read failed, stopping monitor");
                    source.close();
                    return Err(e);
                }
            };

            let record = match monitor.observe(&frame) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    error!(can_id = %frame.id, error = %e, "Estimator update failed, stopping monitor");
                    source.close();
                    return Err(e);
                }
            };

            trace!(can_id = %record.id, sample = record.sample_count, verdict = %record.verdict, "Record");

            // A record that fits in the channel is delivered even if cancellation
            // has already fired; only a full channel races the token.
            let record = match record_tx.try_send(record) {
                Ok(()) => {
                    sent += 1;
                    continue;
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Record receiver dropped, shutting down");
                    break StopReason::SinkClosed;
                }
                Err(TrySendError::Full(record)) => record,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Monitor cancelled while emitting");
                    break StopReason::Cancelled;
                }
                delivered = record_tx.send(record) => {
                    if delivered.is_err() {
                        debug!("Record receiver dropped, shutting down");
                        break StopReason::SinkClosed;
                    }
                    sent += 1;
                }
            }
        };

        source.close();

        let report = MonitorReport { records_emitted: sent, ..monitor.report(stop_reason) };
        info!(
            frames = report.frames_received,
            records = report.records_emitted,
            identifiers = report.identifiers,
            reason = %report.stop_reason,
            "Monitor task ended"
        );
        Ok(report)
    }
}
