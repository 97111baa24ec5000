//! Endpoint ownership and read buffering.
//!
//! A [`Receiver`] owns at most one [`Endpoint`]. Dropping or releasing the
//! endpoint closes its descriptor.

use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::os::unix::net::{UnixListener, UnixStream};

use bytes::{Buf, BytesMut};
use nix::sys::timerfd::TimerFd;

/// Bytes requested from the endpoint per read.
pub const READ_CHUNK: usize = 4096;

/// An OS endpoint the daemon monitors.
#[derive(Debug)]
pub enum Endpoint {
    TcpListener(TcpListener),
    TcpStream(TcpStream),
    UnixListener(UnixListener),
    UnixStream(UnixStream),
    Timer(TimerFd),
    /// Plain file such as a serial device.
    File(File),
}

impl Endpoint {
    /// Accept one pending peer on a listening endpoint.
    ///
    /// The accepted stream is switched to non-blocking mode.
    pub fn accept(&self) -> io::Result<Endpoint> {
        match self {
            Self::TcpListener(listener) => {
                let (stream, _) = listener.accept()?;
                stream.set_nonblocking(true)?;
                Ok(Self::TcpStream(stream))
            }
            Self::UnixListener(listener) => {
                let (stream, _) = listener.accept()?;
                stream.set_nonblocking(true)?;
                Ok(Self::UnixStream(stream))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "endpoint is not a listener",
            )),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::TcpStream(s) => s.read(buf),
            Self::UnixStream(s) => s.read(buf),
            Self::File(f) => f.read(buf),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "endpoint cannot be read",
            )),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::TcpStream(s) => s.write_all(bytes),
            Self::UnixStream(s) => s.write_all(bytes),
            Self::File(f) => f.write_all(bytes),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "endpoint cannot be written",
            )),
        }
    }
}

impl AsFd for Endpoint {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::TcpListener(l) => l.as_fd(),
            Self::TcpStream(s) => s.as_fd(),
            Self::UnixListener(l) => l.as_fd(),
            Self::UnixStream(s) => s.as_fd(),
            Self::Timer(t) => t.as_fd(),
            Self::File(f) => f.as_fd(),
        }
    }
}

/// Result of one [`Receiver::fill`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Bytes were appended to the buffer.
    Data(usize),
    /// Nothing available right now.
    WouldBlock,
    /// The peer closed its side.
    Closed,
}

/// Owned endpoint plus its pending input.
#[derive(Debug, Default)]
pub struct Receiver {
    endpoint: Option<Endpoint>,
    buffer: BytesMut,
}

impl Receiver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            buffer: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Receiver without an endpoint.
    pub fn released() -> Self {
        Self::default()
    }

    pub fn raw_fd(&self) -> Option<RawFd> {
        self.endpoint.as_ref().map(|e| e.as_fd().as_raw_fd())
    }

    pub fn is_released(&self) -> bool {
        self.endpoint.is_none()
    }

    /// Drop the endpoint, closing its descriptor. Buffered input is discarded.
    pub fn release(&mut self) {
        self.endpoint = None;
        self.buffer.clear();
    }

    /// Attach a new endpoint, closing any previous one.
    pub fn assign(&mut self, endpoint: Endpoint) {
        self.buffer.clear();
        self.endpoint = Some(endpoint);
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn endpoint_mut(&mut self) -> Option<&mut Endpoint> {
        self.endpoint.as_mut()
    }

    /// Read whatever the endpoint has into the buffer.
    pub fn fill(&mut self) -> io::Result<ReadStatus> {
        let endpoint = self
            .endpoint
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "receiver is released"))?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match endpoint.read(&mut chunk) {
                Ok(0) => return Ok(ReadStatus::Closed),
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(ReadStatus::Data(n));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::WouldBlock),
                Err(e) => return Err(e),
            }
        }
    }

    /// Pending input.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop `n` bytes from the front of the buffer.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.advance(n);
    }

    /// Write all of `bytes` to the endpoint.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.endpoint
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "receiver is released"))?
            .write_all(bytes)
    }
}
