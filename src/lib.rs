//! CAN bus spoofing detection by physical clock fingerprinting.
//!
//! Every electronic control unit derives its transmit schedule from its own
//! crystal oscillator, and every oscillator drifts slowly and smoothly with
//! temperature and age. Sentinel tracks that drift per sender identifier from
//! kernel arrival timestamps and flags frames whose timing does not fit the
//! sender's learned clock.
//!
//! # Features
//!
//! - **Kernel timestamps**: arrival times come from `SO_TIMESTAMPNS`, not from a user-space clock
//! - **Per-sender filters**: one two-state drift estimator per identifier
//! - **Live verdicts**: `WARMUP`, `NOMINAL` or `ANOMALY` for every update
//! - **Replay**: the same pipeline over recorded or synthetic frames on any platform
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sentinel::{MonitorConfig, Sentinel};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> sentinel::Result<()> {
//!     let mut session = Sentinel::monitor(MonitorConfig::for_interface("vcan0")).await?;
//!     let mut records = session.records();
//!
//!     while let Some(record) = records.next().await {
//!         println!("{}", record);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Detection pipeline
pub mod classifier;
pub mod estimator;
pub mod registry;

// Stream-based monitoring architecture
pub mod monitor;
pub mod source;
pub mod sources;

// Platform-specific modules
#[cfg(target_os = "linux")]
pub mod linux;

// Core exports
pub use error::*;
pub use types::*;

pub use classifier::Classifier;
pub use config::{DetectorConfig, MonitorConfig};
pub use estimator::{ClockState, Estimate};
pub use registry::{IdentityRegistry, SharedRegistry};

// Main API exports
pub use monitor::{Monitor, MonitorReport, MonitorSession, StopReason};
pub use source::FrameSource;
pub use sources::{LiveSource, ReplaySource};

/// Unified entry point for monitoring sessions.
///
/// Live capture and replay produce the same [`MonitorSession`], so consumers
/// of classification records do not care where frames come from.
///
/// # Examples
///
/// ## Live capture (Linux)
/// ```rust,no_run
/// use sentinel::{MonitorConfig, Sentinel};
///
/// #[tokio::main]
/// async fn main() -> sentinel::Result<()> {
///     let session = Sentinel::monitor(MonitorConfig::for_interface("can0")).await?;
///     // Read records...
///     let report = session.stop().await?;
///     println!("{} frames", report.frames_received);
///     Ok(())
/// }
/// ```
///
/// ## Replay (cross-platform)
/// ```rust
/// use sentinel::{KernelTimestamp, MonitorConfig, ReplaySource, Sentinel};
///
/// #[tokio::main]
/// async fn main() -> sentinel::Result<()> {
///     let source = ReplaySource::from_intervals(0x123, KernelTimestamp::from_secs_nanos(1, 0), [0.010; 20]);
///     let session = Sentinel::replay(source)?;
///     let (records, report) = session.collect().await?;
///     assert_eq!(records.len(), 21);
///     assert_eq!(report.identifiers, 1);
///     Ok(())
/// }
/// ```
pub struct Sentinel;

impl Sentinel {
    /// Start monitoring a live SocketCAN interface.
    ///
    /// # Platform
    ///
    /// Live capture needs Linux SocketCAN. On other platforms this returns an
    /// `UnsupportedPlatform` error.
    ///
    /// # Errors
    ///
    /// Returns an error before any frame is read if:
    /// - The configuration is invalid
    /// - The interface does not exist or is down
    /// - The raw socket cannot be created or bound
    pub async fn monitor(config: MonitorConfig) -> Result<MonitorSession> {
        MonitorSession::connect(config).await
    }

    /// Run the monitor over a replay source with default detector settings.
    ///
    /// Must be called from within a tokio runtime.
    pub fn replay(source: ReplaySource) -> Result<MonitorSession> {
        MonitorSession::replay(source, MonitorConfig::default())
    }
}
