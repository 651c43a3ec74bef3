//! Observer port - the consumer of a loader's notifications.

/// Observer receives loader notifications.
///
/// Ordering per session: `on_start`, then any number of `on_result`, then at
/// most one `on_complete`. An observer attached late gets a replay of what it
/// missed: the cached result (or `on_start` if there is none yet), then
/// `on_complete` if the loader already completed.
pub trait Observer<T> {
    /// The loader started, or was already running without a result when the
    /// observer attached.
    fn on_start(&self) {}

    /// A new result, or the cached one on attach.
    fn on_result(&self, _result: &T) {}

    /// No more results will arrive.
    fn on_complete(&self) {}
}

/// Observer built from closures; unset callbacks do nothing.
///
/// ```ignore
/// let observer = FnObserver::new().with_result(|s: &String| println!("{s}"));
/// ```
pub struct FnObserver<T> {
    start: Option<Box<dyn Fn()>>,
    result: Option<Box<dyn Fn(&T)>>,
    complete: Option<Box<dyn Fn()>>,
}

impl<T> FnObserver<T> {
    pub fn new() -> Self {
        Self {
            start: None,
            result: None,
            complete: None,
        }
    }

    pub fn with_start(mut self, f: impl Fn() + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    pub fn with_result(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.result = Some(Box::new(f));
        self
    }

    pub fn with_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T> Default for FnObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observer<T> for FnObserver<T> {
    fn on_start(&self) {
        if let Some(f) = &self.start {
            f();
        }
    }

    fn on_result(&self, result: &T) {
        if let Some(f) = &self.result {
            f(result);
        }
    }

    fn on_complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fn_observer_forwards_set_callbacks_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let observer = {
            let seen = Rc::clone(&seen);
            FnObserver::new().with_result(move |v: &i32| seen.borrow_mut().push(*v))
        };

        observer.on_start();
        observer.on_result(&4);
        observer.on_complete();

        assert_eq!(*seen.borrow(), vec![4]);
    }

    #[test]
    fn builders_chain_and_trait_calls_reach_them() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let observer: FnObserver<i32> = {
            let (start, result, complete) = (Rc::clone(&seen), Rc::clone(&seen), Rc::clone(&seen));
            FnObserver::new()
                .with_start(move || start.borrow_mut().push("start".to_string()))
                .with_result(move |v: &i32| result.borrow_mut().push(format!("result {v}")))
                .with_complete(move || complete.borrow_mut().push("complete".to_string()))
        };

        let observer: &dyn Observer<i32> = &observer;
        observer.on_start();
        observer.on_result(&7);
        observer.on_complete();

        assert_eq!(*seen.borrow(), vec!["start", "result 7", "complete"]);
    }
}
