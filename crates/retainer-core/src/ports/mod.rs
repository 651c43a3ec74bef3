//! Ports - the seams between the core and its host.
//!
//! Each trait is implemented outside the state machines: observers by UI
//! code, `Load` by concrete loaders, `Dispatcher` by the coordination
//! thread's event loop, `ScopeHost` by the framework that owns a scope.

pub mod dispatch;
pub mod load;
pub mod observer;
pub mod scope_host;

pub use self::dispatch::{Dispatcher, Job};
pub use self::load::Load;
pub use self::observer::{FnObserver, Observer};
pub use self::scope_host::ScopeHost;
