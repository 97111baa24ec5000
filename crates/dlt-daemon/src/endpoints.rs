//! Opening the OS endpoints the daemon monitors.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::time::Duration;

use nix::fcntl::OFlag;
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{ClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use tracing::{debug, info};

use crate::error::DaemonError;

pub fn open_tcp_listener(addr: SocketAddr) -> Result<TcpListener, DaemonError> {
    let socket_error = |e: io::Error| DaemonError::Socket {
        addr: addr.to_string(),
        error: e.to_string(),
    };
    let listener = TcpListener::bind(addr).map_err(socket_error)?;
    listener.set_nonblocking(true).map_err(socket_error)?;
    info!(%addr, "Listening for clients");
    Ok(listener)
}

/// Bind a non-blocking Unix listener, replacing a stale socket file.
pub fn open_unix_listener(path: &Path) -> Result<UnixListener, DaemonError> {
    let socket_error = |e: io::Error| DaemonError::Socket {
        addr: path.display().to_string(),
        error: e.to_string(),
    };
    remove_socket(path).map_err(socket_error)?;
    let listener = UnixListener::bind(path).map_err(socket_error)?;
    listener.set_nonblocking(true).map_err(socket_error)?;
    debug!(path = %path.display(), "Listening on unix socket");
    Ok(listener)
}

/// Remove a socket file. A missing file is not an error.
pub fn remove_socket(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Non-blocking monotonic timer expiring every `period`.
pub fn periodic_timer(period: Duration) -> Result<TimerFd, DaemonError> {
    let timer = TimerFd::new(ClockId::CLOCK_MONOTONIC, TimerFlags::TFD_NONBLOCK)
        .map_err(|e| DaemonError::Io(format!("timerfd_create: {e}")))?;
    timer
        .set(
            Expiration::Interval(TimeSpec::from_duration(period)),
            TimerSetTimeFlags::empty(),
        )
        .map_err(|e| DaemonError::Io(format!("timerfd_settime: {e}")))?;
    Ok(timer)
}

/// Open the serial device for non-blocking reads and writes.
pub fn open_serial(path: &Path) -> Result<File, DaemonError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)
        .map_err(|e| DaemonError::Io(format!("{}: {e}", path.display())))
}
