//! Live SocketCAN source for Linux

use crate::Result;
use crate::source::FrameSource;
use crate::types::CanFrame;

#[cfg(target_os = "linux")]
use {
    crate::SentinelError,
    crate::linux::CanSocket,
    crate::types::CAN_ERR_FLAG,
    std::io,
    tokio::io::unix::AsyncFd,
    tracing::{debug, info, trace, warn},
};

/// Live source reading one SocketCAN interface
#[cfg(target_os = "linux")]
pub struct LiveSource {
    /// Interface name
    interface: String,

    /// Socket registered with the tokio reactor; `None` once closed
    socket: Option<AsyncFd<CanSocket>>,

    /// Frames that arrived without a kernel timestamp
    untimestamped: u64,
}

#[cfg(target_os = "linux")]
impl LiveSource {
    /// Open `interface` for monitoring.
    ///
    /// Must be called from within a tokio runtime: the socket is registered
    /// with the reactor so reads can be awaited and cancelled.
    pub fn open(interface: &str) -> Result<Self> {
        let socket = CanSocket::open(interface)?;
        let socket = AsyncFd::new(socket).map_err(|e| {
            SentinelError::connection_failed_with_source(
                interface,
                "could not register socket with the runtime",
                Box::new(e),
            )
        })?;

        info!(interface, "Listening for CAN frames with kernel timestamps");

        Ok(Self { interface: interface.to_string(), socket: Some(socket), untimestamped: 0 })
    }

    /// Interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Number of frames received without a kernel timestamp
    pub fn untimestamped_frames(&self) -> u64 {
        self.untimestamped
    }
}

#[cfg(target_os = "linux")]
#[async_trait::async_trait]
impl FrameSource for LiveSource {
    async fn next_frame(&mut self) -> Result<Option<CanFrame>> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(None);
        };

        loop {
            let mut guard = socket.readable().await.map_err(|e| {
                SentinelError::io_error(format!("waiting for frames on {}", self.interface), e)
            })?;

            let (raw, timestamp) = match guard.try_io(|inner| inner.get_ref().recv()) {
                Ok(Ok(received)) => received,
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => {
                    return Err(SentinelError::io_error(
                        format!("receiving from {}", self.interface),
                        e,
                    ));
                }
                // Readiness was stale; wait again
                Err(_would_block) => continue,
            };

            if raw.can_id & CAN_ERR_FLAG != 0 {
                debug!(can_id = raw.can_id, "Ignoring CAN error frame");
                continue;
            }

            if !timestamp.is_available() {
                self.untimestamped += 1;
                if self.untimestamped == 1 {
                    warn!(interface = %self.interface, "Frame arrived without a kernel timestamp");
                }
            }

            let frame = CanFrame::from_raw(raw.can_id, raw.len, &raw.data, timestamp);
            trace!(can_id = %frame.id, len = frame.data.len(), timestamp = timestamp.as_nanos(), "Frame");
            return Ok(Some(frame));
        }
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!(interface = %self.interface, "Closing CAN socket");
            drop(socket.into_inner());
        }
    }

    fn name(&self) -> &str {
        &self.interface
    }
}

#[cfg(target_os = "linux")]
impl Drop for LiveSource {
    fn drop(&mut self) {
        self.close();
    }
}

// Non-Linux stub implementation
#[cfg(not(target_os = "linux"))]
pub struct LiveSource {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl LiveSource {
    /// Attempt to open a live source on non-Linux platforms.
    ///
    /// This always returns an error as SocketCAN is only available on Linux.
    /// Use [`ReplaySource`](crate::sources::ReplaySource) for offline evaluation.
    pub fn open(_interface: &str) -> Result<Self> {
        Err(crate::SentinelError::unsupported_platform("Live CAN capture", "Linux"))
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait::async_trait]
impl FrameSource for LiveSource {
    async fn next_frame(&mut self) -> Result<Option<CanFrame>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}
