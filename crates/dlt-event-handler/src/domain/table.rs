//! Readiness table handed to `poll(2)`.
//!
//! INVARIANTS:
//! - Occupied entries are exactly the first `nfds` slots, with no gaps.
//! - Slots at or past `nfds` hold the unused marker `fd = -1`.
//! - Capacity starts at [`BASE_FD`] and doubles when full.

use std::os::fd::RawFd;

use nix::poll::PollFlags;

use crate::error::EventHandlerError;

/// Initial capacity of the table.
pub const BASE_FD: usize = 8;

/// Marker for an unused slot.
pub const UNUSED_FD: RawFd = -1;

/// One `(fd, interest, result)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEntry {
    pub fd: RawFd,
    pub events: PollFlags,
    pub revents: PollFlags,
}

impl PollEntry {
    const UNUSED: PollEntry = PollEntry {
        fd: UNUSED_FD,
        events: PollFlags::empty(),
        revents: PollFlags::empty(),
    };

    pub fn is_used(&self) -> bool {
        self.fd != UNUSED_FD
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessTable {
    slots: Vec<PollEntry>,
    nfds: usize,
}

impl Default for ReadinessTable {
    fn default() -> Self {
        Self {
            slots: vec![PollEntry::UNUSED; BASE_FD],
            nfds: 0,
        }
    }
}

impl ReadinessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in use.
    pub fn nfds(&self) -> usize {
        self.nfds
    }

    /// Allocated slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, fd: RawFd) -> bool {
        self.occupied().iter().any(|e| e.fd == fd)
    }

    /// Append an entry, doubling capacity first when full.
    pub fn enable(&mut self, fd: RawFd, events: PollFlags) -> Result<(), EventHandlerError> {
        if fd < 0 {
            return Err(EventHandlerError::InvalidParameter(format!(
                "cannot poll descriptor {fd}"
            )));
        }
        if self.contains(fd) {
            return Err(EventHandlerError::InvalidParameter(format!(
                "descriptor {fd} is already polled"
            )));
        }

        if self.nfds == self.slots.len() {
            let grow_by = self.slots.len().max(1);
            self.slots.try_reserve_exact(grow_by).map_err(|e| {
                EventHandlerError::ResourceExhausted(format!("readiness table growth: {e}"))
            })?;
            self.slots
                .resize(self.slots.len() + grow_by, PollEntry::UNUSED);
        }

        self.slots[self.nfds] = PollEntry {
            fd,
            events,
            revents: PollFlags::empty(),
        };
        self.nfds += 1;
        Ok(())
    }

    /// Remove the entry for `fd` and shift later entries left.
    ///
    /// Returns `false` when `fd` was not in the table.
    pub fn disable(&mut self, fd: RawFd) -> bool {
        let Some(idx) = self.occupied().iter().position(|e| e.fd == fd) else {
            return false;
        };
        self.slots.copy_within(idx + 1..self.nfds, idx);
        self.nfds -= 1;
        self.slots[self.nfds] = PollEntry::UNUSED;
        true
    }

    pub fn occupied(&self) -> &[PollEntry] {
        &self.slots[..self.nfds]
    }

    pub fn occupied_mut(&mut self) -> &mut [PollEntry] {
        &mut self.slots[..self.nfds]
    }

    /// Snapshot of every entry with a non-empty result.
    pub fn ready(&self) -> Vec<(RawFd, PollFlags)> {
        self.occupied()
            .iter()
            .filter(|e| !e.revents.is_empty())
            .map(|e| (e.fd, e.revents))
            .collect()
    }

    pub fn clear_revents(&mut self) {
        for entry in self.occupied_mut() {
            entry.revents = PollFlags::empty();
        }
    }

    pub(crate) fn slots(&self) -> &[PollEntry] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_compact(table: &ReadinessTable) {
        let used = table.slots().iter().filter(|e| e.is_used()).count();
        assert_eq!(used, table.nfds());
        assert!(table.occupied().iter().all(PollEntry::is_used));
        assert!(table.slots()[table.nfds()..].iter().all(|e| !e.is_used()));
    }

    #[test]
    fn test_new_table_is_empty_with_base_capacity() {
        let table = ReadinessTable::new();
        assert_eq!(table.nfds(), 0);
        assert_eq!(table.capacity(), BASE_FD);
        assert_compact(&table);
    }

    #[test]
    fn test_capacity_doubles_when_full() {
        let mut table = ReadinessTable::new();
        for fd in 0..BASE_FD as RawFd {
            table.enable(fd, PollFlags::POLLIN).unwrap();
        }
        assert_eq!(table.capacity(), BASE_FD);

        table.enable(100, PollFlags::POLLIN).unwrap();
        assert_eq!(table.capacity(), BASE_FD * 2);
        assert_eq!(table.nfds(), BASE_FD + 1);
        assert_compact(&table);
    }

    #[test]
    fn test_disable_compacts_preserving_order() {
        let mut table = ReadinessTable::new();
        for fd in [10, 11, 12, 13] {
            table.enable(fd, PollFlags::POLLIN).unwrap();
        }
        assert!(table.disable(11));
        let fds: Vec<_> = table.occupied().iter().map(|e| e.fd).collect();
        assert_eq!(fds, vec![10, 12, 13]);
        assert!(!table.disable(11));
        assert_compact(&table);
    }

    #[test]
    fn test_invalid_and_duplicate_fds_are_rejected() {
        let mut table = ReadinessTable::new();
        assert!(table.enable(-1, PollFlags::POLLIN).is_err());
        table.enable(3, PollFlags::POLLIN).unwrap();
        assert!(table.enable(3, PollFlags::POLLOUT).is_err());
        assert_eq!(table.nfds(), 1);
    }

    #[test]
    fn test_ready_snapshot_only_reports_results() {
        let mut table = ReadinessTable::new();
        table.enable(4, PollFlags::POLLIN).unwrap();
        table.enable(5, PollFlags::POLLIN).unwrap();
        table.occupied_mut()[1].revents = PollFlags::POLLIN;
        assert_eq!(table.ready(), vec![(5, PollFlags::POLLIN)]);
        table.clear_revents();
        assert!(table.ready().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Enable(RawFd),
        Disable(RawFd),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..40 as RawFd).prop_map(Op::Enable),
            (0..40 as RawFd).prop_map(Op::Disable),
        ]
    }

    proptest! {
        #[test]
        fn prop_any_sequence_keeps_table_compact(ops in prop::collection::vec(op(), 0..200)) {
            let mut table = ReadinessTable::new();
            let mut model = std::collections::BTreeSet::new();
            for op in ops {
                match op {
                    Op::Enable(fd) => {
                        let inserted = model.insert(fd);
                        prop_assert_eq!(table.enable(fd, PollFlags::POLLIN).is_ok(), inserted);
                    }
                    Op::Disable(fd) => {
                        prop_assert_eq!(table.disable(fd), model.remove(&fd));
                    }
                }
                prop_assert_eq!(table.nfds(), model.len());
                let used = table.slots().iter().filter(|e| e.is_used()).count();
                prop_assert_eq!(used, table.nfds());
                prop_assert!(table.slots()[table.nfds()..].iter().all(|e| !e.is_used()));
            }
        }
    }
}
