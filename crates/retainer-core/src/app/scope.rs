//! Scope - one live instance of a host scope.
//!
//! A scope is created from whatever the host kept for it and ends in exactly
//! one [`Teardown`]:
//!
//! ```text
//!   host.take_snapshot() ──> RetainState::from_snapshot ──> Scope
//!                                                            │
//!          Teardown::Transient                 Teardown::Permanent
//!   begin_retaining, managers detach     managers destroy, store destroyed
//!   host.keep_snapshot(snapshot)         nothing kept
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::error::BuildError;
use crate::manager::LoaderManager;
use crate::ports::{Dispatcher, ScopeHost};
use crate::retain::RetainState;

/// How a scope ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The scope is recreated soon; loaders keep running, observers detach.
    Transient,
    /// The scope never returns; every loader is destroyed.
    Permanent,
}

/// ScopeBuilder wires a [`Scope`] to its host.
///
/// # Example
/// ```ignore
/// let scope = ScopeBuilder::new()
///     .host(host.clone())
///     .dispatcher(Rc::new(TokioDispatcher::new()))
///     .build()?;
/// ```
///
/// `build()` fails fast when the host or dispatcher is missing, and when the
/// restored snapshot holds something other than a [`LoaderManager`] under the
/// manager key.
pub struct ScopeBuilder {
    host: Option<Rc<dyn ScopeHost>>,
    dispatcher: Option<Rc<dyn Dispatcher>>,
    loader_manager_key: u32,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            dispatcher: None,
            loader_manager_key: 0,
        }
    }

    pub fn host(mut self, host: Rc<dyn ScopeHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Used by a freshly created loader manager. A manager restored from the
    /// snapshot keeps the dispatcher it was created with.
    pub fn dispatcher(mut self, dispatcher: Rc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Store key of the scope's loader manager. Defaults to `0`.
    pub fn loader_manager_key(mut self, key: u32) -> Self {
        self.loader_manager_key = key;
        self
    }

    pub fn build(self) -> Result<Scope, BuildError> {
        let host = self.host.ok_or(BuildError::MissingHost)?;
        let dispatcher = self.dispatcher.ok_or(BuildError::MissingDispatcher)?;

        let previous = host.take_snapshot();
        let restored = previous.is_some();
        let state = RetainState::from_snapshot(previous);
        let manager = state.retain_or_create(self.loader_manager_key, || {
            LoaderManager::new(dispatcher)
        })?;

        debug!(restored, loaders = manager.len(), "scope created");
        Ok(Scope {
            host,
            state,
            manager,
        })
    }
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope owns the retained store of one host scope instance.
pub struct Scope {
    host: Rc<dyn ScopeHost>,
    state: RetainState,
    manager: Rc<LoaderManager>,
}

impl Scope {
    pub fn retain_state(&self) -> &RetainState {
        &self.state
    }

    /// The scope's own loader manager, kept in [`retain_state`](Self::retain_state).
    pub fn loader_manager(&self) -> Rc<LoaderManager> {
        Rc::clone(&self.manager)
    }

    /// End this scope instance.
    ///
    /// Every [`LoaderManager`] held in the store, including those in nested
    /// stores, is torn down with it.
    pub fn finish(self, teardown: Teardown) {
        match teardown {
            Teardown::Transient => {
                self.state.begin_retaining();
                end_managers(&self.state);
                self.host.keep_snapshot(self.state.snapshot());
            }
            Teardown::Permanent => {
                end_managers(&self.state);
                self.state.destroy();
            }
        }
        info!(?teardown, "scope finished");
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("state", &self.state)
            .field("loaders", &self.manager.len())
            .finish()
    }
}

fn end_managers(state: &RetainState) {
    for value in state.values() {
        if let Some(manager) = value.downcast_ref::<LoaderManager>() {
            manager.on_scope_destroy(state);
        } else if let Some(nested) = value.downcast_ref::<RetainState>() {
            end_managers(nested);
        }
    }
}
