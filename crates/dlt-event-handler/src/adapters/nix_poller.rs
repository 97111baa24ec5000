//! `poll(2)` backed [`Poller`].

use std::os::fd::BorrowedFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::trace;

use crate::domain::PollEntry;
use crate::error::EventHandlerError;
use crate::ports::Poller;

#[derive(Debug, Default, Clone, Copy)]
pub struct NixPoller;

impl NixPoller {
    pub fn new() -> Self {
        Self
    }
}

impl Poller for NixPoller {
    fn poll(
        &mut self,
        entries: &mut [PollEntry],
        timeout: Duration,
    ) -> Result<usize, EventHandlerError> {
        let timeout = PollTimeout::try_from(timeout)
            .map_err(|e| EventHandlerError::Poll(format!("timeout {timeout:?}: {e}")))?;

        let mut fds: Vec<PollFd<'_>> = entries
            .iter()
            .map(|entry| {
                // SAFETY: occupied entries are removed before their connection
                // drops its receiver, so every fd stays open across this call.
                let fd = unsafe { BorrowedFd::borrow_raw(entry.fd) };
                PollFd::new(fd, entry.events)
            })
            .collect();

        match poll(&mut fds, timeout) {
            Ok(ready) => {
                for (entry, pfd) in entries.iter_mut().zip(&fds) {
                    entry.revents = pfd.revents().unwrap_or(PollFlags::empty());
                }
                Ok(usize::try_from(ready).unwrap_or(0))
            }
            Err(Errno::EINTR) => {
                trace!("Readiness wait interrupted");
                for entry in entries.iter_mut() {
                    entry.revents = PollFlags::empty();
                }
                Ok(0)
            }
            Err(e) => Err(EventHandlerError::Poll(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_poll_reports_readable_stream() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let mut entries = [PollEntry {
            fd: a.as_raw_fd(),
            events: PollFlags::POLLIN,
            revents: PollFlags::empty(),
        }];

        let mut poller = NixPoller::new();
        assert_eq!(poller.poll(&mut entries, Duration::ZERO).unwrap(), 0);
        assert!(entries[0].revents.is_empty());

        b.write_all(b"x").unwrap();
        assert_eq!(poller.poll(&mut entries, Duration::from_millis(100)).unwrap(), 1);
        assert!(entries[0].revents.contains(PollFlags::POLLIN));
    }

    #[test]
    fn test_out_of_range_timeout_is_rejected() {
        let (a, _b) = UnixStream::pair().unwrap();
        let mut entries = [PollEntry {
            fd: a.as_raw_fd(),
            events: PollFlags::POLLIN,
            revents: PollFlags::empty(),
        }];
        let too_long = Duration::from_millis(u64::from(u32::MAX));
        assert!(matches!(
            NixPoller::new().poll(&mut entries, too_long),
            Err(EventHandlerError::Poll(_))
        ));
    }
}
