//! Load port - the work a loader performs.

use crate::loader::Receiver;

/// Load is implemented by concrete loaders.
///
/// `on_start` runs on the coordination thread once per `start()` or
/// `restart()`. It may hand work off to other threads, but results must come
/// back to the coordination thread before calling
/// [`Receiver::deliver_result`] or [`Receiver::complete`].
///
/// # Example
/// ```ignore
/// struct Hello;
///
/// impl Load<String> for Hello {
///     fn on_start(&mut self, receiver: Receiver<String>) {
///         let _ = receiver.deliver_result("hello".to_string());
///         let _ = receiver.complete();
///     }
/// }
/// ```
pub trait Load<T> {
    /// Begin work. Call `deliver_result` zero or more times, then `complete`
    /// at most once.
    fn on_start(&mut self, receiver: Receiver<T>);

    /// Best-effort cancellation. Only called while the loader is running.
    fn on_cancel(&mut self) {}

    /// Release resources. Called exactly once, after the final cancel; a
    /// `destroy()` issued from inside another hook runs it when that hook
    /// returns.
    fn on_destroy(&mut self) {}
}
