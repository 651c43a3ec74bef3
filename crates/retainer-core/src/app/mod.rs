//! App - wiring a retained store and its loaders to a host scope.
//!
//! # Components
//! - **ScopeBuilder**: validates the wiring and restores the previous snapshot
//! - **Scope**: one live instance of a host scope
//! - **Teardown**: whether the scope comes back

pub mod scope;

pub use self::scope::{Scope, ScopeBuilder, Teardown};
