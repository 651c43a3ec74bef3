//! MemoryHost - keeps the snapshot in memory between scope instances.

use std::cell::RefCell;

use crate::ports::ScopeHost;
use crate::retain::Snapshot;

/// In-memory [`ScopeHost`], for tests and for hosts without a framework slot.
#[derive(Debug, Default)]
pub struct MemoryHost {
    kept: RefCell<Option<Snapshot>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a snapshot waiting for the next scope instance?
    pub fn has_snapshot(&self) -> bool {
        self.kept.borrow().is_some()
    }
}

impl ScopeHost for MemoryHost {
    fn take_snapshot(&self) -> Option<Snapshot> {
        self.kept.borrow_mut().take()
    }

    fn keep_snapshot(&self, snapshot: Snapshot) {
        *self.kept.borrow_mut() = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retain::RetainState;

    #[test]
    fn take_leaves_nothing_behind() {
        let host = MemoryHost::new();
        let state = RetainState::new();
        state.retain_or_create(0, || 1u8).unwrap();

        host.keep_snapshot(state.snapshot());
        assert!(host.has_snapshot());

        let snapshot = host.take_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(host.take_snapshot().is_none());
    }
}
