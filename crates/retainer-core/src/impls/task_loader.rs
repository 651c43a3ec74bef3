//! TaskLoad - run a blocking closure off the coordination thread.
//!
//! Each session spawns a driver task on the current `LocalSet`. The driver
//! hands the closure to tokio's blocking pool, waits for it on the
//! coordination thread, then delivers the value and completes.
//!
//! Cancellation is cooperative: the closure receives a [`CancellationToken`]
//! and should return early once it is cancelled. Whatever it returns after
//! that is dropped by the cancelled session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::loader::Receiver;
use crate::ports::Load;

type Work<T> = Arc<dyn Fn(CancellationToken) -> T + Send + Sync>;

/// Loader strategy backed by `tokio::task::spawn_blocking`.
///
/// # Example
/// ```ignore
/// let load = TaskLoad::new(|token: CancellationToken| {
///     if token.is_cancelled() {
///         return String::new();
///     }
///     expensive_lookup()
/// });
/// let loader = Loader::new(load, Rc::new(TokioDispatcher::new()));
/// ```
pub struct TaskLoad<T> {
    work: Work<T>,
    session: Option<(CancellationToken, JoinHandle<()>)>,
}

impl<T: Send + 'static> TaskLoad<T> {
    pub fn new<F>(work: F) -> Self
    where
        F: Fn(CancellationToken) -> T + Send + Sync + 'static,
    {
        Self {
            work: Arc::new(work),
            session: None,
        }
    }
}

impl<T: Send + 'static> Load<T> for TaskLoad<T> {
    fn on_start(&mut self, receiver: Receiver<T>) {
        let token = CancellationToken::new();
        let work = Arc::clone(&self.work);
        let worker_token = token.clone();

        let driver = tokio::task::spawn_local(async move {
            let joined = tokio::task::spawn_blocking(move || work(worker_token)).await;
            let value = match joined {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "background work did not finish");
                    return;
                }
            };
            if let Err(e) = receiver.deliver_result(value) {
                warn!(label = e.as_label(), error = %e, "could not deliver result");
            }
            if let Err(e) = receiver.complete() {
                warn!(label = e.as_label(), error = %e, "could not complete");
            }
        });
        self.session = Some((token, driver));
    }

    fn on_cancel(&mut self) {
        if let Some((token, driver)) = self.session.take() {
            token.cancel();
            driver.abort();
        }
    }

    fn on_destroy(&mut self) {
        self.on_cancel();
    }
}
