//! ScopeHost port - the framework that owns a scope.

use crate::retain::Snapshot;

/// ScopeHost keeps the opaque snapshot across a transient teardown.
///
/// The host hands back exactly what it was given; it never inspects or
/// serializes the snapshot.
pub trait ScopeHost {
    /// The snapshot kept by the previous instance of this scope, if any.
    /// Taking it leaves nothing behind.
    fn take_snapshot(&self) -> Option<Snapshot>;

    /// Keep `snapshot` for the next instance of this scope.
    fn keep_snapshot(&self, snapshot: Snapshot);
}
