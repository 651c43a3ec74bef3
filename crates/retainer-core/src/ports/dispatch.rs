//! Dispatcher port - "run this on the next turn of the coordination thread".

/// A unit of deferred work. Never crosses threads.
pub type Job = Box<dyn FnOnce() + 'static>;

/// Dispatcher queues jobs for a later turn of the coordination thread.
///
/// Loaders use it so an observer never receives a callback while its own call
/// to `start()` is still on the stack.
///
/// Implementations must run jobs in FIFO order and never run a job inline
/// from `post`.
pub trait Dispatcher {
    fn post(&self, job: Job);
}
