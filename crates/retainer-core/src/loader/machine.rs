//! Loader handle and the shared state behind it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::receiver::{Receiver, Session};
use super::subscription::Subscription;
use crate::domain::{LoaderPhase, LoaderState, LoaderStatus};
use crate::error::LoaderError;
use crate::ports::{Dispatcher, Load, Observer};

/// A notification on its way to an observer.
pub(crate) enum Notice<T> {
    Start,
    Result(Rc<T>),
    Complete,
}

impl<T> Notice<T> {
    fn deliver(&self, observer: &dyn Observer<T>) {
        match self {
            Notice::Start => observer.on_start(),
            Notice::Result(value) => observer.on_result(value),
            Notice::Complete => observer.on_complete(),
        }
    }
}

struct Attached<T> {
    id: u64,
    observer: Rc<dyn Observer<T>>,
}

/// Mutable part of a loader. Never borrowed across a call into user code.
pub(crate) struct Core<T> {
    pub(crate) state: LoaderState<T>,
    observer: Option<Attached<T>>,
    session: Option<Rc<Session>>,
    /// Bumped whenever queued callbacks must be dropped.
    epoch: u64,
    /// Callbacks of the current epoch still sitting in the dispatcher.
    deferred: usize,
    next_observer_id: u64,
}

impl<T> Core<T> {
    fn new() -> Self {
        Self {
            state: LoaderState::Idle,
            observer: None,
            session: None,
            epoch: 0,
            deferred: 0,
            next_observer_id: 1,
        }
    }

    /// Drop every callback still queued in the dispatcher.
    fn invalidate_deferred(&mut self) {
        self.epoch += 1;
        self.deferred = 0;
    }

    fn check_destroyed(&self, op: &'static str) -> Result<(), LoaderError> {
        if self.state.is_destroyed() {
            let err = LoaderError::Destroyed { op };
            warn!(label = err.as_label(), op, "loader used after destroy()");
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn observer_id(&self) -> Option<u64> {
        self.observer.as_ref().map(|a| a.id)
    }

    fn observer(&self) -> Option<Rc<dyn Observer<T>>> {
        self.observer.as_ref().map(|a| Rc::clone(&a.observer))
    }

    /// What a freshly attached observer has missed: result or start, then
    /// complete.
    fn replay(&self) -> Vec<Notice<T>> {
        let mut notices = Vec::with_capacity(2);
        if let Some(result) = self.state.result() {
            notices.push(Notice::Result(Rc::clone(result)));
        } else if self.state.is_running() {
            notices.push(Notice::Start);
        }
        if self.state.is_completed() {
            notices.push(Notice::Complete);
        }
        notices
    }
}

pub(crate) struct Shared<T: 'static> {
    pub(crate) core: RefCell<Core<T>>,
    load: RefCell<Box<dyn Load<T>>>,
    /// `destroy()` ran while a strategy hook was on the stack.
    destroy_pending: Cell<bool>,
    dispatcher: Rc<dyn Dispatcher>,
}

impl<T: 'static> Shared<T> {
    /// Forward a receiver notification to the observer, deferring it to the
    /// next turn when the strategy is still inside `on_start`.
    ///
    /// Once one notification is deferred, later ones queue behind it until
    /// the queue drains, so the observer sees them in delivery order.
    pub(crate) fn notify(this: &Rc<Self>, session: &Session, notice: Notice<T>) {
        let (observer, epoch) = {
            let mut core = this.core.borrow_mut();
            let Some(observer) = core.observer() else {
                return;
            };
            if !session.is_synchronous() && core.deferred == 0 {
                drop(core);
                notice.deliver(observer.as_ref());
                return;
            }
            core.deferred += 1;
            (observer, core.epoch)
        };

        let weak = Rc::downgrade(this);
        this.dispatcher.post(Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            {
                let mut core = shared.core.borrow_mut();
                if core.epoch != epoch {
                    trace!("dropping deferred loader callback");
                    return;
                }
                core.deferred -= 1;
            }
            notice.deliver(observer.as_ref());
        }));
    }

    pub(crate) fn detach_if_current(&self, id: u64) {
        // A subscription dropped from inside a callback may find the core busy.
        let Ok(mut core) = self.core.try_borrow_mut() else {
            return;
        };
        if core.observer_id() == Some(id) {
            core.observer = None;
            core.invalidate_deferred();
        }
    }

    /// Run a strategy hook. Returns false, without running it, if the
    /// strategy is already on the stack (a hook that re-enters the loader).
    ///
    /// An `on_destroy` requested meanwhile runs as soon as the outer hook
    /// returns.
    fn with_load(&self, hook: &'static str, f: impl FnOnce(&mut dyn Load<T>)) -> bool {
        let Ok(mut load) = self.load.try_borrow_mut() else {
            trace!(hook, "strategy busy; skipping re-entrant hook");
            return false;
        };
        f(&mut **load);
        if self.destroy_pending.take() {
            trace!("running on_destroy requested from inside {hook}");
            load.on_destroy();
        }
        true
    }
}

/// Handle to a loader. Clones share the same loader.
///
/// All methods must be called on the coordination thread; the type is `!Send`.
pub struct Loader<T: 'static> {
    shared: Rc<Shared<T>>,
}

impl<T: 'static> Loader<T> {
    /// Create an idle loader around `load`. Callbacks that must be deferred
    /// are posted to `dispatcher`.
    pub fn new(load: impl Load<T> + 'static, dispatcher: Rc<dyn Dispatcher>) -> Self {
        Self {
            shared: Rc::new(Shared {
                core: RefCell::new(Core::new()),
                load: RefCell::new(Box::new(load)),
                destroy_pending: Cell::new(false),
                dispatcher,
            }),
        }
    }

    /// Start the loader unless it is already running or completed.
    ///
    /// Notifies the observer's `on_start`, then calls the strategy's
    /// `on_start` with a fresh [`Receiver`]. Anything the strategy delivers
    /// before returning reaches the observer on the next dispatcher turn.
    pub fn start(&self) -> Result<(), LoaderError> {
        let observer = {
            let mut core = self.shared.core.borrow_mut();
            core.check_destroyed("start")?;
            if core.state.is_running() || core.state.is_completed() {
                return Ok(());
            }
            core.state = LoaderState::Running { result: None };
            core.observer()
        };
        debug!("loader started");
        if let Some(observer) = observer {
            observer.on_start();
        }

        let session = {
            let mut core = self.shared.core.borrow_mut();
            // The observer may have cancelled or restarted us.
            if !core.state.is_running() || core.session.is_some() {
                return Ok(());
            }
            let session = Rc::new(Session::starting());
            core.session = Some(Rc::clone(&session));
            session
        };

        let receiver = Receiver::new(Rc::downgrade(&self.shared), Rc::clone(&session));
        self.shared.with_load("on_start", |load| load.on_start(receiver));
        session.end_synchronous();
        Ok(())
    }

    /// Cancel the loader: drop the cached result, invalidate the current
    /// receiver, and call the strategy's `on_cancel` if it was running.
    pub fn cancel(&self) -> Result<(), LoaderError> {
        let was_running = {
            let mut core = self.shared.core.borrow_mut();
            core.check_destroyed("cancel")?;
            if let Some(session) = core.session.take() {
                session.cancel();
            }
            core.invalidate_deferred();
            let was_running = core.state.is_running();
            core.state = LoaderState::Idle;
            was_running
        };
        debug!(was_running, "loader cancelled");
        if was_running {
            self.shared.with_load("on_cancel", |load| load.on_cancel());
        }
        Ok(())
    }

    /// `cancel()` followed by `start()`.
    pub fn restart(&self) -> Result<(), LoaderError> {
        self.cancel()?;
        self.start()
    }

    /// Cancel, detach the observer and release the strategy. Terminal.
    pub fn destroy(&self) -> Result<(), LoaderError> {
        self.shared.core.borrow().check_destroyed("destroy")?;
        self.cancel()?;
        {
            let mut core = self.shared.core.borrow_mut();
            // `on_cancel` may have destroyed the loader itself.
            if core.state.is_destroyed() {
                return Ok(());
            }
            core.observer = None;
            core.state = LoaderState::Destroyed;
        }
        debug!("loader destroyed");
        if !self.shared.with_load("on_destroy", |load| load.on_destroy()) {
            self.shared.destroy_pending.set(true);
        }
        Ok(())
    }

    /// Replace the observer. `None` detaches.
    ///
    /// A new observer immediately receives what it missed: the cached result
    /// (or `on_start` if running without one), then `on_complete` if
    /// completed. Queued callbacks meant for the previous observer are
    /// dropped.
    ///
    /// # Errors
    /// [`LoaderError::Destroyed`] when attaching to a destroyed loader.
    /// Detaching always succeeds.
    pub fn set_observer(&self, observer: Option<Rc<dyn Observer<T>>>) -> Result<(), LoaderError> {
        match observer {
            Some(observer) => self.attach(observer).map(|_| ()),
            None => {
                let mut core = self.shared.core.borrow_mut();
                core.observer = None;
                core.invalidate_deferred();
                Ok(())
            }
        }
    }

    /// Attach `observer` for as long as the returned [`Subscription`] lives.
    pub fn observe(&self, observer: Rc<dyn Observer<T>>) -> Result<Subscription<T>, LoaderError> {
        let id = self.attach(observer)?;
        Ok(Subscription::new(Rc::downgrade(&self.shared), id))
    }

    fn attach(&self, observer: Rc<dyn Observer<T>>) -> Result<u64, LoaderError> {
        let (id, replay) = {
            let mut core = self.shared.core.borrow_mut();
            core.check_destroyed("set_observer")?;
            core.invalidate_deferred();
            let id = core.next_observer_id;
            core.next_observer_id += 1;
            core.observer = Some(Attached {
                id,
                observer: Rc::clone(&observer),
            });
            (id, core.replay())
        };
        trace!(replayed = replay.len(), "observer attached");
        for notice in &replay {
            notice.deliver(observer.as_ref());
        }
        Ok(id)
    }

    /// Running: started, not completed, not cancelled.
    pub fn is_running(&self) -> bool {
        self.shared.core.borrow().state.is_running()
    }

    pub fn has_result(&self) -> bool {
        self.shared.core.borrow().state.has_result()
    }

    pub fn is_completed(&self) -> bool {
        self.shared.core.borrow().state.is_completed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.core.borrow().state.is_destroyed()
    }

    /// Has an observer attached.
    pub fn is_attached(&self) -> bool {
        self.shared.core.borrow().observer.is_some()
    }

    pub fn phase(&self) -> LoaderPhase {
        self.shared.core.borrow().state.phase()
    }

    /// The cached result, if any.
    pub fn result(&self) -> Option<Rc<T>> {
        self.shared.core.borrow().state.result().cloned()
    }

    pub fn status(&self) -> LoaderStatus {
        let core = self.shared.core.borrow();
        LoaderStatus {
            phase: core.state.phase(),
            has_result: core.state.has_result(),
            attached: core.observer.is_some(),
        }
    }

    /// Do both handles refer to the same loader?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T: 'static> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: 'static> fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.core.try_borrow() {
            Ok(core) => f
                .debug_struct("Loader")
                .field("phase", &core.state.phase())
                .field("has_result", &core.state.has_result())
                .field("attached", &core.observer.is_some())
                .finish(),
            Err(_) => f.debug_struct("Loader").finish_non_exhaustive(),
        }
    }
}
