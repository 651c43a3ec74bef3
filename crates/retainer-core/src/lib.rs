//! retainer-core
//!
//! Loaders whose work and cached results survive the recreation of the scope
//! that owns them.
//!
//! # Modules
//! - **loader**: the loader state machine, its `Receiver` and `Subscription`
//! - **retain**: `RetainState`, the keyed store that outlives a transient teardown
//! - **manager**: `LoaderManager`, the keyed loaders of one scope
//! - **domain**: loader states and serializable status views
//! - **ports**: `Load`, `Observer`, `Dispatcher`, `ScopeHost`
//! - **impls**: dispatchers, an in-memory host, concrete loaders
//! - **app**: `Scope` and `ScopeBuilder`, the scope lifecycle glue
//! - **error**: error types
//!
//! Everything runs on one coordination thread; the handles are `!Send`.

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod loader;
pub mod manager;
pub mod ports;
pub mod retain;

#[cfg(test)]
pub(crate) mod testing;

pub use self::app::{Scope, ScopeBuilder, Teardown};
pub use self::error::{BuildError, LoaderError, RetainError};
pub use self::loader::{Loader, Receiver, Subscription};
pub use self::manager::LoaderManager;
pub use self::retain::{RetainState, Snapshot};
