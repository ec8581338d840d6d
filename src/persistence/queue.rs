//! Deferred completion queue for emulated hosts
//!
//! Host completions must never run inside the call that issued them. The
//! emulated backends push callbacks here and the host loop drains them later.

use std::cell::RefCell;
use std::collections::VecDeque;

type Deferred = Box<dyn FnOnce()>;

/// FIFO of completions waiting for the host's next turn
#[derive(Default)]
pub struct CompletionQueue {
    pending: RefCell<VecDeque<Deferred>>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, completion: impl FnOnce() + 'static) {
        self.pending.borrow_mut().push_back(Box::new(completion));
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run the oldest completion only. Returns false if nothing was queued.
    pub fn run_one(&self) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(completion) => {
                completion();
                true
            }
            None => false,
        }
    }

    /// Run everything queued so far, including completions queued by the
    /// callbacks themselves. Returns the number run.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        // run_one releases the borrow before running so callbacks can push.
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_runs_in_fifo_order() {
        let queue = CompletionQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let seen = seen.clone();
            queue.push(move || seen.borrow_mut().push(i));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), 3);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_run_one_steps_single_completion() {
        let queue = CompletionQueue::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for i in 0..2 {
            let seen = seen.clone();
            queue.push(move || seen.borrow_mut().push(i));
        }
        assert!(queue.run_one());
        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(queue.len(), 1);
        assert!(queue.run_one());
        assert!(!queue.run_one());
    }

    #[test]
    fn test_callbacks_may_enqueue() {
        let queue = Rc::new(CompletionQueue::new());
        let hits = Rc::new(RefCell::new(0));
        {
            let q = queue.clone();
            let hits = hits.clone();
            queue.push(move || {
                *hits.borrow_mut() += 1;
                let hits = hits.clone();
                q.push(move || *hits.borrow_mut() += 10);
            });
        }
        assert_eq!(queue.drain(), 2);
        assert_eq!(*hits.borrow(), 11);
    }
}
