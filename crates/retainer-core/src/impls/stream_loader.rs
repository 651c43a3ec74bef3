//! StreamLoad - one loader session per stream subscription.

use futures::StreamExt;
use futures::stream::{LocalBoxStream, Stream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::loader::Receiver;
use crate::ports::Load;

type Factory<T, E> = Box<dyn Fn() -> LocalBoxStream<'static, Result<T, E>>>;

/// Loader strategy that drives a fresh stream on every `start()`.
///
/// Each `Ok` item is delivered as it arrives. An `Err` item is delivered and
/// then the session completes; nothing after it is polled. End of stream
/// completes the session. The stream is polled on the current `LocalSet`, so
/// heavy work belongs in the stream itself (e.g. behind `spawn_blocking`).
pub struct StreamLoad<T, E> {
    factory: Factory<T, E>,
    driver: Option<JoinHandle<()>>,
}

impl<T: 'static, E: 'static> StreamLoad<T, E> {
    /// `factory` must produce a cold stream; it is called once per session.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + 'static,
        S: Stream<Item = Result<T, E>> + 'static,
    {
        Self {
            factory: Box::new(move || factory().boxed_local()),
            driver: None,
        }
    }
}

impl<T: 'static, E: 'static> Load<Result<T, E>> for StreamLoad<T, E> {
    fn on_start(&mut self, receiver: Receiver<Result<T, E>>) {
        let mut stream = (self.factory)();
        self.driver = Some(tokio::task::spawn_local(async move {
            while let Some(item) = stream.next().await {
                let failed = item.is_err();
                if let Err(e) = receiver.deliver_result(item) {
                    warn!(label = e.as_label(), error = %e, "could not deliver stream item");
                    return;
                }
                if failed {
                    debug!("stream yielded an error; completing");
                    break;
                }
                if receiver.is_cancelled() {
                    return;
                }
            }
            if let Err(e) = receiver.complete() {
                warn!(label = e.as_label(), error = %e, "could not complete");
            }
        }));
    }

    fn on_cancel(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }

    fn on_destroy(&mut self) {
        self.on_cancel();
    }
}
