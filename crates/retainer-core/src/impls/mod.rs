//! Impls - implementations of the ports.
//!
//! # Included
//! - **LocalQueue**: manually drained turn queue (tests, hosts with their own loop)
//! - **TokioDispatcher**: turn queue on a tokio `LocalSet`
//! - **MemoryHost**: in-memory `ScopeHost`
//! - **TaskLoad**: blocking work on tokio's blocking pool
//! - **StreamLoad**: one loader session per stream subscription

pub mod local_queue;
pub mod memory_host;
pub mod stream_loader;
pub mod task_loader;
pub mod tokio_dispatch;

pub use self::local_queue::LocalQueue;
pub use self::memory_host::MemoryHost;
pub use self::stream_loader::StreamLoad;
pub use self::task_loader::TaskLoad;
pub use self::tokio_dispatch::TokioDispatcher;
