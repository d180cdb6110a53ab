//! Raw SocketCAN socket with kernel receive timestamps
//!
//! The socket asks the kernel for `SO_TIMESTAMPNS` ancillary data so every
//! `recvmsg` returns the frame together with the time the kernel received it.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;

use libc::{c_int, c_void};
use tracing::{debug, trace};

use crate::types::{CAN_MAX_DLEN, KernelTimestamp};
use crate::{Result, SentinelError};

/// Raw CAN protocol number for `socket(PF_CAN, SOCK_RAW, CAN_RAW)`
const CAN_RAW: c_int = 1;
/// Microsecond timestamp control message type (same value as `SO_TIMESTAMP`)
const SCM_TIMESTAMP: c_int = libc::SO_TIMESTAMP;
/// Room for one timestamp control message of either resolution
const CONTROL_BUFFER_WORDS: usize = 16;

/// Kernel `struct can_frame` (classic CAN, 16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCanFrame {
    pub can_id: u32, // 32 bit CAN_ID + EFF/RTR/ERR flags
    pub len: u8,     // Payload length 0..8
    pub pad: u8,
    pub res0: u8,
    pub len8_dlc: u8,
    pub data: [u8; CAN_MAX_DLEN],
}

/// Kernel `struct sockaddr_can`, truncated to the fields a raw bind reads
#[repr(C)]
#[allow(dead_code)]
struct SockAddrCan {
    can_family: libc::sa_family_t,
    can_ifindex: c_int,
    rx_id: u32,
    tx_id: u32,
}

/// Non-blocking raw CAN socket bound to one interface.
///
/// The descriptor is owned and closed on drop, including on every setup error path.
#[derive(Debug)]
pub struct CanSocket {
    fd: OwnedFd,
    interface: String,
}

impl CanSocket {
    /// Open a raw CAN socket on `interface` with kernel timestamps enabled.
    ///
    /// Fails with [`SentinelError::Connection`] if the interface does not exist,
    /// is administratively down, or the socket cannot be set up.
    pub fn open(interface: &str) -> Result<Self> {
        trace!(interface, "Opening raw CAN socket");

        let c_name = CString::new(interface).map_err(|_| {
            SentinelError::connection_failed(interface, "interface name contains a null byte")
        })?;

        let if_index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if if_index == 0 {
            return Err(SentinelError::connection_failed_with_source(
                interface,
                "interface does not exist",
                Box::new(io::Error::last_os_error()),
            ));
        }

        if !interface_is_up(interface) {
            return Err(SentinelError::connection_failed(
                interface,
                "interface is administratively down",
            ));
        }

        let raw = unsafe {
            libc::socket(libc::PF_CAN, libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC, CAN_RAW)
        };
        if raw < 0 {
            return Err(SentinelError::connection_failed_with_source(
                interface,
                "socket(PF_CAN, SOCK_RAW, CAN_RAW) failed",
                Box::new(io::Error::last_os_error()),
            ));
        }
        // Owned from here on so every early return closes it
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let enable: c_int = 1;
        let ret = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_TIMESTAMPNS,
                &enable as *const c_int as *const c_void,
                mem::size_of::<c_int>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            return Err(SentinelError::connection_failed_with_source(
                interface,
                "could not enable SO_TIMESTAMPNS",
                Box::new(io::Error::last_os_error()),
            ));
        }

        let addr = SockAddrCan {
            can_family: libc::AF_CAN as libc::sa_family_t,
            can_ifindex: if_index as c_int,
            rx_id: 0,
            tx_id: 0,
        };
        let ret = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const SockAddrCan as *const libc::sockaddr,
                mem::size_of::<SockAddrCan>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            return Err(SentinelError::connection_failed_with_source(
                interface,
                "bind failed",
                Box::new(io::Error::last_os_error()),
            ));
        }

        debug!(interface, if_index, "Raw CAN socket bound with kernel timestamps");
        Ok(Self { fd, interface: interface.to_string() })
    }

    /// Receive one frame and the kernel timestamp attached to the same call.
    ///
    /// Returns [`KernelTimestamp::UNAVAILABLE`] when no timestamp control
    /// message came with the frame. Returns `WouldBlock` when nothing is queued.
    pub fn recv(&self) -> io::Result<(RawCanFrame, KernelTimestamp)> {
        let mut frame = RawCanFrame::default();
        let mut iov = libc::iovec {
            iov_base: &mut frame as *mut RawCanFrame as *mut c_void,
            iov_len: mem::size_of::<RawCanFrame>(),
        };
        // u64 words keep the control buffer aligned for cmsghdr
        let mut control = [0u64; CONTROL_BUFFER_WORDS];

        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr() as *mut c_void;
        msg.msg_controllen = mem::size_of_val(&control) as _;

        let received = unsafe { libc::recvmsg(self.fd.as_raw_fd(), &mut msg, 0) };
        if received < 0 {
            return Err(io::Error::last_os_error());
        }
        if (received as usize) < mem::size_of::<RawCanFrame>() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("short CAN frame read: {} bytes", received),
            ));
        }

        Ok((frame, control_timestamp(&msg)))
    }

    /// Interface this socket is bound to
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl AsRawFd for CanSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Walk the control messages of a completed `recvmsg` for a receive timestamp.
fn control_timestamp(msg: &libc::msghdr) -> KernelTimestamp {
    let mut cmsg = unsafe { libc::CMSG_FIRSTHDR(msg) };
    while !cmsg.is_null() {
        let header = unsafe { &*cmsg };
        if header.cmsg_level == libc::SOL_SOCKET {
            let data = unsafe { libc::CMSG_DATA(cmsg) };
            if header.cmsg_type == libc::SCM_TIMESTAMPNS {
                let ts = unsafe { ptr::read_unaligned(data as *const libc::timespec) };
                return KernelTimestamp::from_secs_nanos(ts.tv_sec as i64, ts.tv_nsec as i64);
            }
            if header.cmsg_type == SCM_TIMESTAMP {
                let tv = unsafe { ptr::read_unaligned(data as *const libc::timeval) };
                return KernelTimestamp::from_secs_micros(tv.tv_sec as i64, tv.tv_usec as i64);
            }
        }
        cmsg = unsafe { libc::CMSG_NXTHDR(msg, cmsg) };
    }
    KernelTimestamp::UNAVAILABLE
}

/// Read the administrative state from sysfs.
///
/// When the flags cannot be read the interface is assumed up and `bind`
/// reports any real problem.
fn interface_is_up(interface: &str) -> bool {
    let path = format!("/sys/class/net/{}/flags", interface);
    match std::fs::read_to_string(&path) {
        Ok(contents) => match parse_interface_flags(&contents) {
            Some(flags) => flags & libc::IFF_UP as u32 != 0,
            None => {
                debug!(path = %path, "Unrecognised interface flags, skipping admin state check");
                true
            }
        },
        Err(e) => {
            debug!(path = %path, error = %e, "Interface flags unreadable, skipping admin state check");
            true
        }
    }
}

/// Parse the hex flags word exposed by `/sys/class/net/<if>/flags`
fn parse_interface_flags(contents: &str) -> Option<u32> {
    let trimmed = contents.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    u32::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_matches_kernel_layout() {
        assert_eq!(mem::size_of::<RawCanFrame>(), 16);
        assert_eq!(mem::offset_of!(RawCanFrame, data), 8);
        assert_eq!(mem::offset_of!(SockAddrCan, can_ifindex), 4);
    }

    #[test]
    fn sysfs_flags_parse() {
        assert_eq!(parse_interface_flags("0x40c1\n"), Some(0x40c1));
        assert_eq!(parse_interface_flags("0x1002"), Some(0x1002));
        assert_eq!(parse_interface_flags("garbage"), None);
    }

    #[test]
    fn missing_interface_is_connection_error() {
        let err = CanSocket::open("nosuchcan9").unwrap_err();
        assert!(matches!(err, SentinelError::Connection { ref interface, .. } if interface == "nosuchcan9"));
    }

    #[test]
    fn null_byte_in_name_is_connection_error() {
        let err = CanSocket::open("vcan\0").unwrap_err();
        assert!(matches!(err, SentinelError::Connection { .. }));
    }
}
