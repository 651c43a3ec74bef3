//! LocalQueue - a turn queue drained by hand.
//!
//! # Usage
//! ```ignore
//! let queue = Rc::new(LocalQueue::new());
//! let loader = Loader::new(load, queue.clone());
//! loader.start()?;
//! queue.run_pending(); // deferred callbacks run here
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::trace;

use crate::ports::{Dispatcher, Job};

/// FIFO of deferred jobs. Nothing runs until [`run_pending`](Self::run_pending).
#[derive(Default)]
pub struct LocalQueue {
    jobs: RefCell<VecDeque<Job>>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self {
            jobs: RefCell::new(VecDeque::new()),
        }
    }

    /// Run jobs until the queue is empty, including jobs posted by jobs.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop before running: a job may post more jobs.
            let Some(job) = self.jobs.borrow_mut().pop_front() else {
                break;
            };
            job();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "ran pending jobs");
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }
}

impl Dispatcher for LocalQueue {
    fn post(&self, job: Job) {
        self.jobs.borrow_mut().push_back(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn post_does_not_run_inline() {
        let queue = LocalQueue::new();
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        queue.post(Box::new(move || *flag.borrow_mut() = true));

        assert!(!*ran.borrow());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn runs_in_fifo_order() {
        let queue = LocalQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let seen = Rc::clone(&seen);
            queue.post(Box::new(move || seen.borrow_mut().push(i)));
        }

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn jobs_posted_while_running_also_run() {
        let queue = Rc::new(LocalQueue::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let inner_queue = Rc::clone(&queue);
            let seen = Rc::clone(&seen);
            queue.post(Box::new(move || {
                seen.borrow_mut().push("outer");
                let seen = Rc::clone(&seen);
                inner_queue.post(Box::new(move || seen.borrow_mut().push("inner")));
            }));
        }

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(*seen.borrow(), vec!["outer", "inner"]);
    }
}
