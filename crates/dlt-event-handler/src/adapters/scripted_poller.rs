//! Deterministic [`Poller`] for tests.

use std::collections::VecDeque;
use std::os::fd::RawFd;
use std::time::Duration;

use nix::poll::PollFlags;

use crate::domain::PollEntry;
use crate::error::EventHandlerError;
use crate::ports::Poller;

/// Replays one scripted round of readiness results per call.
///
/// Fds in a round that are not in the table are ignored. Once the script is
/// exhausted every call reports a timeout.
#[derive(Debug, Default)]
pub struct ScriptedPoller {
    rounds: VecDeque<Vec<(RawFd, PollFlags)>>,
    calls: usize,
}

impl ScriptedPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a round of results.
    pub fn push_round(&mut self, round: Vec<(RawFd, PollFlags)>) -> &mut Self {
        self.rounds.push_back(round);
        self
    }

    /// Queue a round that reports nothing, like an interrupted wait.
    pub fn push_idle(&mut self) -> &mut Self {
        self.rounds.push_back(Vec::new());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.rounds.len()
    }
}

impl Poller for ScriptedPoller {
    fn poll(
        &mut self,
        entries: &mut [PollEntry],
        _timeout: Duration,
    ) -> Result<usize, EventHandlerError> {
        self.calls += 1;
        let round = self.rounds.pop_front().unwrap_or_default();

        let mut ready = 0;
        for entry in entries.iter_mut() {
            entry.revents = round
                .iter()
                .filter(|(fd, _)| *fd == entry.fd)
                .fold(PollFlags::empty(), |acc, (_, flags)| acc | *flags);
            if !entry.revents.is_empty() {
                ready += 1;
            }
        }
        Ok(ready)
    }
}
