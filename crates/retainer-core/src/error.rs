//! Error types for loaders, the retained store and scope construction.
//!
//! Programming errors (touching a destroyed loader, completing a session
//! twice, attaching a second observer) come back as `Err` at the call site.
//! Late results racing a cancellation are not errors and never show up here.

use thiserror::Error;

/// Errors raised by [`Loader`](crate::loader::Loader), its
/// [`Receiver`](crate::loader::Receiver) and [`LoaderManager`](crate::manager::LoaderManager).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The loader was already destroyed.
    #[error("cannot call {op}() after destroy()")]
    Destroyed { op: &'static str },

    /// `deliver_result` or `complete` after the session already completed.
    #[error("cannot call {op}() after complete()")]
    AlreadyCompleted { op: &'static str },

    /// Two call sites asked the registry for the same loader.
    #[error(
        "loader {key} already has an observer; use unique keys and detach or destroy the manager when the scope goes away"
    )]
    AlreadyObserved { key: u32 },

    /// The registry key holds a loader with a different result type.
    #[error("loader {key} has a different result type")]
    TypeMismatch { key: u32 },
}

impl LoaderError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoaderError::Destroyed { .. } => "loader_destroyed",
            LoaderError::AlreadyCompleted { .. } => "loader_already_completed",
            LoaderError::AlreadyObserved { .. } => "loader_already_observed",
            LoaderError::TypeMismatch { .. } => "loader_type_mismatch",
        }
    }
}

/// Errors raised by [`RetainState`](crate::retain::RetainState).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetainError {
    #[error("retained value {key} has a different type")]
    TypeMismatch { key: u32 },
}

impl RetainError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RetainError::TypeMismatch { .. } => "retain_type_mismatch",
        }
    }
}

/// BuildError is returned by [`ScopeBuilder::build`](crate::app::ScopeBuilder::build).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("scope has no host; call ScopeBuilder::host() before build()")]
    MissingHost,

    #[error("scope has no dispatcher; call ScopeBuilder::dispatcher() before build()")]
    MissingDispatcher,

    #[error(transparent)]
    Retain(#[from] RetainError),
}

impl BuildError {
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::MissingHost => "build_missing_host",
            BuildError::MissingDispatcher => "build_missing_dispatcher",
            BuildError::Retain(e) => e.as_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::destroyed(LoaderError::Destroyed { op: "start" }, "loader_destroyed")]
    #[case::completed(LoaderError::AlreadyCompleted { op: "complete" }, "loader_already_completed")]
    #[case::observed(LoaderError::AlreadyObserved { key: 3 }, "loader_already_observed")]
    #[case::mismatch(LoaderError::TypeMismatch { key: 3 }, "loader_type_mismatch")]
    fn loader_error_labels(#[case] err: LoaderError, #[case] label: &str) {
        assert_eq!(err.as_label(), label);
    }

    #[test]
    fn destroyed_message_names_operation() {
        let err = LoaderError::Destroyed { op: "cancel" };
        assert_eq!(err.to_string(), "cannot call cancel() after destroy()");
    }

    #[test]
    fn build_error_wraps_retain_error() {
        let err: BuildError = RetainError::TypeMismatch { key: 0 }.into();
        assert_eq!(err.as_label(), "retain_type_mismatch");
        assert_eq!(err.to_string(), "retained value 0 has a different type");
    }
}
