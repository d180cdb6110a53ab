//! Frame source implementations
//!
//! - [`LiveSource`]: SocketCAN interface with kernel timestamps (Linux)
//! - [`ReplaySource`]: in-memory frames for offline evaluation and tests

pub mod live;
pub mod replay;

pub use live::LiveSource;
pub use replay::ReplaySource;
