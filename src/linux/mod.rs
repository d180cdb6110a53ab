//! Linux SocketCAN access
//!
//! Raw CAN sockets with kernel receive timestamps. Timestamps are taken from
//! the `recvmsg` ancillary data of the same call that returns the frame, so
//! the monitor's own scheduling delay never enters the timing signal.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sentinel::linux::CanSocket;
//!
//! let socket = CanSocket::open("vcan0")?;
//! let (frame, timestamp) = socket.recv()?;
//! ```

mod socket;

pub use socket::{CanSocket, RawCanFrame};
