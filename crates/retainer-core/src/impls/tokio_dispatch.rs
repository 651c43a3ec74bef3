//! TokioDispatcher - deferred jobs as tasks on the current `LocalSet`.

use crate::ports::{Dispatcher, Job};

/// Posts each job with [`tokio::task::spawn_local`].
///
/// The coordination thread is the thread driving the `LocalSet`; `post`
/// panics if called outside one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDispatcher;

impl TokioDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for TokioDispatcher {
    fn post(&self, job: Job) {
        tokio::task::spawn_local(async move { job() });
    }
}
