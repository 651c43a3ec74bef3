//! Serializable loader status for logs and diagnostics.

use serde::{Deserialize, Serialize};

use super::LoaderPhase;

/// Snapshot of a loader's observable state.
///
/// This is a view only; it never carries the cached result itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderStatus {
    pub phase: LoaderPhase,
    pub has_result: bool,
    pub attached: bool,
}
