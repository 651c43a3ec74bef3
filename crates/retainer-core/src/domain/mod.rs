//! Domain model for loaders: the state machine and its read-only views.

pub mod state;
pub mod status;

pub use self::state::{LoaderPhase, LoaderState};
pub use self::status::LoaderStatus;
