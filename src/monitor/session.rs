//! Monitoring session handle

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Driver, MonitorReport};
use crate::config::MonitorConfig;
use crate::source::FrameSource;
use crate::sources::{LiveSource, ReplaySource};
use crate::types::ClassificationRecord;
use crate::{Result, SentinelError};

/// Handle to a running monitor task.
///
/// Records are read with [`next_record`](Self::next_record) or
/// [`records`](Self::records). Dropping the session stops the task.
pub struct MonitorSession {
    /// Source label (interface name or replay name)
    source: String,

    /// Record channel receiver
    records: mpsc::Receiver<ClassificationRecord>,

    /// Cancellation token for stopping the task
    cancel: CancellationToken,

    /// Monitor task; taken when joined
    task: Option<JoinHandle<Result<MonitorReport>>>,
}

impl MonitorSession {
    /// Start monitoring the configured SocketCAN interface.
    ///
    /// Configuration and interface problems are reported here, before any
    /// frame is read.
    pub async fn connect(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        info!(interface = %config.interface, "Connecting to CAN interface");

        let source = LiveSource::open(&config.interface)?;
        Ok(Self::start(source, &config))
    }

    /// Run the monitor over recorded or synthetic frames.
    pub fn replay(source: ReplaySource, config: MonitorConfig) -> Result<Self> {
        Self::with_source(source, config)
    }

    /// Run the monitor over any frame source.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_source<S: FrameSource>(source: S, config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::start(source, &config))
    }

    fn start<S: FrameSource>(source: S, config: &MonitorConfig) -> Self {
        let name = source.name().to_string();
        let channels = Driver::spawn(source, config.detector, config.record_buffer);
        debug!(source = %name, buffer = config.record_buffer, "Monitor session started");

        Self {
            source: name,
            records: channels.records,
            cancel: channels.cancel,
            task: Some(channels.task),
        }
    }

    /// Name of the frame source
    pub fn source_name(&self) -> &str {
        &self.source
    }

    /// Next classification record, or `None` once the task has stopped
    pub async fn next_record(&mut self) -> Option<ClassificationRecord> {
        self.records.recv().await
    }

    /// Records as a stream; ends when the task stops
    pub fn records(&mut self) -> impl Stream<Item = ClassificationRecord> + '_ {
        futures::stream::poll_fn(move |cx| self.records.poll_recv(cx))
    }

    /// Token that stops the task when cancelled.
    ///
    /// Useful for wiring the stop signal to Ctrl-C while the session is
    /// borrowed by a record stream.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signal the task to stop without waiting for it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for its report.
    ///
    /// A read failure that ended the task earlier is returned here.
    pub async fn stop(mut self) -> Result<MonitorReport> {
        self.cancel.cancel();
        self.join().await
    }

    /// Drain every remaining record and wait for the task to finish on its own.
    ///
    /// Intended for finite sources such as replays.
    pub async fn collect(mut self) -> Result<(Vec<ClassificationRecord>, MonitorReport)> {
        let mut records = Vec::new();
        while let Some(record) = self.records.recv().await {
            records.push(record);
        }
        let report = self.join().await?;
        Ok((records, report))
    }

    async fn join(&mut self) -> Result<MonitorReport> {
        let Some(task) = self.task.take() else {
            return Err(SentinelError::Task { reason: "session already joined".to_string() });
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(SentinelError::Task { reason: e.to_string() }),
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
