//! Loader state machine.

use std::rc::Rc;

/// Loader state.
///
/// State transitions:
/// - Idle -> Running (start)
/// - Running -> Running with result (deliver_result, any number of times)
/// - Running -> Completed (complete; keeps the last result if any)
/// - Running | Completed -> Idle (cancel; drops the result)
/// - any non-destroyed state -> Destroyed (destroy)
///
/// The cached result lives inside the variant, so "has a result while idle"
/// or "completed while destroyed" cannot be expressed.
#[derive(Debug)]
pub enum LoaderState<T> {
    /// Not started, or cancelled.
    Idle,

    /// Started; more results may arrive.
    Running { result: Option<Rc<T>> },

    /// Finished; no more results will arrive on this session.
    Completed { result: Option<Rc<T>> },

    /// Terminal.
    Destroyed,
}

impl<T> LoaderState<T> {
    pub fn phase(&self) -> LoaderPhase {
        match self {
            LoaderState::Idle => LoaderPhase::Idle,
            LoaderState::Running { .. } => LoaderPhase::Running,
            LoaderState::Completed { .. } => LoaderPhase::Completed,
            LoaderState::Destroyed => LoaderPhase::Destroyed,
        }
    }

    pub fn result(&self) -> Option<&Rc<T>> {
        match self {
            LoaderState::Running { result } | LoaderState::Completed { result } => result.as_ref(),
            LoaderState::Idle | LoaderState::Destroyed => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LoaderState::Running { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, LoaderState::Completed { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, LoaderState::Destroyed)
    }

    pub fn has_result(&self) -> bool {
        self.result().is_some()
    }

    /// Caches a result. Only a running loader accepts one.
    pub fn with_result(self, value: Rc<T>) -> Self {
        match self {
            LoaderState::Running { .. } => LoaderState::Running {
                result: Some(value),
            },
            other => other,
        }
    }

    /// Running -> Completed, carrying the cached result over.
    pub fn into_completed(self) -> Self {
        match self {
            LoaderState::Running { result } => LoaderState::Completed { result },
            other => other,
        }
    }
}

impl<T> Default for LoaderState<T> {
    fn default() -> Self {
        LoaderState::Idle
    }
}

/// Coarse phase of a loader, without the cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    Idle,
    Running,
    Completed,
    Destroyed,
}

impl LoaderPhase {
    /// Is this a terminal phase (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, LoaderPhase::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_idle_without_result() {
        let state = LoaderState::<String>::default();
        assert_eq!(state.phase(), LoaderPhase::Idle);
        assert!(!state.has_result());
    }

    #[test]
    fn running_keeps_latest_result() {
        let state = LoaderState::Running { result: None }
            .with_result(Rc::new(1))
            .with_result(Rc::new(2));
        assert!(state.is_running());
        assert_eq!(state.result().map(|r| **r), Some(2));
    }

    #[test]
    fn completing_carries_result() {
        let state = LoaderState::Running { result: None }
            .with_result(Rc::new("a"))
            .into_completed();
        assert!(state.is_completed());
        assert!(!state.is_running());
        assert_eq!(state.result().map(|r| **r), Some("a"));
    }

    #[rstest]
    #[case::idle(LoaderState::Idle)]
    #[case::completed(LoaderState::Completed { result: None })]
    #[case::destroyed(LoaderState::Destroyed)]
    fn only_running_accepts_results(#[case] state: LoaderState<u8>) {
        let phase = state.phase();
        let next = state.with_result(Rc::new(7));
        assert_eq!(next.phase(), phase);
        assert!(!next.has_result());
    }

    #[rstest]
    #[case::idle(LoaderPhase::Idle, false)]
    #[case::running(LoaderPhase::Running, false)]
    #[case::completed(LoaderPhase::Completed, false)]
    #[case::destroyed(LoaderPhase::Destroyed, true)]
    fn terminal_phases(#[case] phase: LoaderPhase, #[case] terminal: bool) {
        assert_eq!(phase.is_terminal(), terminal);
    }
}
