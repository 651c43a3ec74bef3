//! Receiver - the capability a strategy uses to report progress.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::machine::{Notice, Shared};
use crate::error::LoaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Active,
    Completed,
    Cancelled,
}

/// One `start()`-to-`cancel()` cycle of a loader.
#[derive(Debug)]
pub(crate) struct Session {
    state: Cell<SessionState>,
    /// Set while the strategy's `on_start` is on the stack.
    synchronous: Cell<bool>,
}

impl Session {
    pub(crate) fn starting() -> Self {
        Self {
            state: Cell::new(SessionState::Active),
            synchronous: Cell::new(true),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state.get()
    }

    pub(crate) fn cancel(&self) {
        self.state.set(SessionState::Cancelled);
    }

    pub(crate) fn is_synchronous(&self) -> bool {
        self.synchronous.get()
    }

    pub(crate) fn end_synchronous(&self) {
        self.synchronous.set(false);
    }
}

/// Receives results for one loader session.
///
/// Cloning is cheap; all clones share the session. After the loader is
/// cancelled (or restarted) every call on this receiver becomes a no-op, so a
/// slow producer never needs to check whether anyone still cares.
pub struct Receiver<T: 'static> {
    shared: Weak<Shared<T>>,
    session: Rc<Session>,
}

impl<T: 'static> Receiver<T> {
    pub(crate) fn new(shared: Weak<Shared<T>>, session: Rc<Session>) -> Self {
        Self { shared, session }
    }

    /// Caches `value` as the loader's result and forwards it to the observer.
    ///
    /// # Errors
    /// [`LoaderError::AlreadyCompleted`] if `complete()` was already called on
    /// this session. A cancelled session drops the value and returns `Ok`.
    pub fn deliver_result(&self, value: T) -> Result<(), LoaderError> {
        if !self.check_live("deliver_result")? {
            return Ok(());
        }
        let Some(shared) = self.shared.upgrade() else {
            trace!("dropping result for a loader that no longer exists");
            return Ok(());
        };

        let value = Rc::new(value);
        {
            let mut core = shared.core.borrow_mut();
            let state = std::mem::take(&mut core.state);
            core.state = state.with_result(Rc::clone(&value));
        }
        Shared::notify(&shared, &self.session, Notice::Result(value));
        Ok(())
    }

    /// Marks the loader completed; no more results may be delivered.
    ///
    /// # Errors
    /// [`LoaderError::AlreadyCompleted`] on a second call. A cancelled session
    /// ignores the call.
    pub fn complete(&self) -> Result<(), LoaderError> {
        if !self.check_live("complete")? {
            return Ok(());
        }
        self.session.state.set(SessionState::Completed);
        let Some(shared) = self.shared.upgrade() else {
            return Ok(());
        };

        {
            let mut core = shared.core.borrow_mut();
            let state = std::mem::take(&mut core.state);
            core.state = state.into_completed();
        }
        Shared::notify(&shared, &self.session, Notice::Complete);
        Ok(())
    }

    /// True until the session is cancelled or completed.
    pub fn is_active(&self) -> bool {
        self.session.state() == SessionState::Active
    }

    /// True once the loader cancelled this session.
    pub fn is_cancelled(&self) -> bool {
        self.session.state() == SessionState::Cancelled
    }

    /// Ok(true) to proceed, Ok(false) to drop silently.
    fn check_live(&self, op: &'static str) -> Result<bool, LoaderError> {
        match self.session.state() {
            SessionState::Active => Ok(true),
            SessionState::Cancelled => {
                trace!(op, "session cancelled; ignoring");
                Ok(false)
            }
            SessionState::Completed => {
                let err = LoaderError::AlreadyCompleted { op };
                warn!(label = err.as_label(), op, "receiver used after complete()");
                Err(err)
            }
        }
    }
}

impl<T: 'static> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
            session: Rc::clone(&self.session),
        }
    }
}

impl<T: 'static> std::fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("session", &self.session.state())
            .finish()
    }
}
