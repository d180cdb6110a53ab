//! Frame source trait

use crate::Result;
use crate::types::CanFrame;

/// Trait for CAN frame sources
///
/// Sources yield one frame at a time, each paired with the arrival timestamp
/// obtained by the same receive call. One source instance serves one reader.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next frame
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - Frame received (its timestamp may be the unavailable sentinel)
    /// - `Ok(None)` - Source ended (normal termination, e.g. end of a replay)
    /// - `Err(e)` - Read failure; fatal to the monitor loop
    async fn next_frame(&mut self) -> Result<Option<CanFrame>>;

    /// Release the underlying transport resource.
    ///
    /// Must be idempotent; the monitor calls it on every exit path.
    fn close(&mut self) {}

    /// Human-readable name of the source (interface name, replay label)
    fn name(&self) -> &str;
}
