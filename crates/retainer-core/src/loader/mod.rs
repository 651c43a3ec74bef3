//! Loader: a long-lived unit of asynchronous work with a cached result.
//!
//! A [`Loader`] wraps a [`Load`](crate::ports::Load) strategy. Each `start()`
//! opens a new session and hands the strategy a [`Receiver`] for it. The
//! session is what decides whether a late result still matters: once the
//! loader is cancelled, the old receiver silently drops whatever it is given.
//!
//! ```text
//!            start()               deliver_result()*        complete()
//!   Idle ───────────► Running ─────────────────► Running ───────────► Completed
//!    ▲                   │  (result cached)                               │
//!    └──── cancel() ─────┴────────────────────────────────────────────────┘
//!
//!   destroy() from any non-destroyed state ─► Destroyed (terminal)
//! ```

mod machine;
mod receiver;
mod subscription;

pub use self::machine::Loader;
pub use self::receiver::Receiver;
pub use self::subscription::Subscription;
