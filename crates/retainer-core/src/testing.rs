//! Test doubles shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::LoaderError;
use crate::loader::Receiver;
use crate::ports::{Load, Observer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event<T> {
    Start,
    Result(T),
    Complete,
}

/// Records every callback in order.
pub(crate) struct RecordingObserver<T> {
    events: RefCell<Vec<Event<T>>>,
}

impl<T: Clone> RecordingObserver<T> {
    pub(crate) fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }

    /// Drain what was recorded so far.
    pub(crate) fn take(&self) -> Vec<Event<T>> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl<T: Clone> Observer<T> for RecordingObserver<T> {
    fn on_start(&self) {
        self.events.borrow_mut().push(Event::Start);
    }

    fn on_result(&self, result: &T) {
        self.events.borrow_mut().push(Event::Result(result.clone()));
    }

    fn on_complete(&self) {
        self.events.borrow_mut().push(Event::Complete);
    }
}

/// Test side of a [`ManualLoad`].
pub(crate) struct ManualHandle<T: 'static> {
    receiver: RefCell<Option<Receiver<T>>>,
    starts: Cell<u32>,
    cancels: Cell<u32>,
    destroys: Cell<u32>,
}

impl<T: 'static> ManualHandle<T> {
    pub(crate) fn receiver(&self) -> Receiver<T> {
        self.receiver
            .borrow()
            .clone()
            .expect("loader was never started")
    }

    pub(crate) fn deliver(&self, value: T) -> Result<(), LoaderError> {
        self.receiver().deliver_result(value)
    }

    pub(crate) fn complete(&self) -> Result<(), LoaderError> {
        self.receiver().complete()
    }

    pub(crate) fn starts(&self) -> u32 {
        self.starts.get()
    }

    pub(crate) fn cancels(&self) -> u32 {
        self.cancels.get()
    }

    pub(crate) fn destroys(&self) -> u32 {
        self.destroys.get()
    }
}

/// Strategy driven by the test through its [`ManualHandle`].
pub(crate) struct ManualLoad<T: 'static> {
    handle: Rc<ManualHandle<T>>,
    /// Delivered from inside `on_start`, then completed if the flag is set.
    immediate: Option<(T, bool)>,
}

impl<T: Clone + 'static> ManualLoad<T> {
    pub(crate) fn new() -> (Self, Rc<ManualHandle<T>>) {
        let handle = Rc::new(ManualHandle {
            receiver: RefCell::new(None),
            starts: Cell::new(0),
            cancels: Cell::new(0),
            destroys: Cell::new(0),
        });
        let load = Self {
            handle: Rc::clone(&handle),
            immediate: None,
        };
        (load, handle)
    }

    pub(crate) fn immediate(value: T) -> (Self, Rc<ManualHandle<T>>) {
        let (mut load, handle) = Self::new();
        load.immediate = Some((value, true));
        (load, handle)
    }

    /// Delivers `value` inside `on_start` but leaves the session open.
    pub(crate) fn primed(value: T) -> (Self, Rc<ManualHandle<T>>) {
        let (mut load, handle) = Self::new();
        load.immediate = Some((value, false));
        (load, handle)
    }
}

impl<T: Clone + 'static> Load<T> for ManualLoad<T> {
    fn on_start(&mut self, receiver: Receiver<T>) {
        self.handle.starts.set(self.handle.starts.get() + 1);
        if let Some((value, complete)) = self.immediate.clone() {
            receiver.deliver_result(value).unwrap();
            if complete {
                receiver.complete().unwrap();
            }
        }
        *self.handle.receiver.borrow_mut() = Some(receiver);
    }

    fn on_cancel(&mut self) {
        self.handle.cancels.set(self.handle.cancels.get() + 1);
    }

    fn on_destroy(&mut self) {
        self.handle.destroys.set(self.handle.destroys.get() + 1);
    }
}
