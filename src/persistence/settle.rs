//! One-shot request completion
//!
//! A host request often has several completion paths (success, error,
//! abort) of which exactly one runs. [`Settle`] is shared between them: the
//! first `finish` delivers the result, later ones are ignored. It also owns
//! whatever the request attached to the host (event listeners) and hands
//! those back on `finish` so the caller can release them.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

struct Held<R> {
    items: Vec<R>,
    detach: Vec<Box<dyn FnOnce()>>,
}

impl<R> Default for Held<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            detach: Vec::new(),
        }
    }
}

pub struct Settle<T, R> {
    done: Rc<RefCell<Option<Box<dyn FnOnce(T)>>>>,
    held: Rc<RefCell<Held<R>>>,
}

impl<T, R> Clone for Settle<T, R> {
    fn clone(&self) -> Self {
        Self {
            done: self.done.clone(),
            held: self.held.clone(),
        }
    }
}

impl<T: 'static, R> Settle<T, R> {
    pub fn new(f: impl FnOnce(T) + 'static) -> Self {
        Self {
            done: Rc::new(RefCell::new(Some(Box::new(f)))),
            held: Rc::new(RefCell::new(Held::default())),
        }
    }

    /// Keep `item` until the request settles. `detach` unhooks it from the
    /// host and runs before the result is delivered.
    pub fn hold(&self, item: R, detach: impl FnOnce() + 'static) {
        let mut held = self.held.borrow_mut();
        held.items.push(item);
        held.detach.push(Box::new(detach));
    }

    pub fn is_settled(&self) -> bool {
        self.done.borrow().is_none()
    }

    pub fn held(&self) -> usize {
        self.held.borrow().items.len()
    }

    /// Deliver `value` if nothing was delivered yet. Returns the held items,
    /// already detached; empty when the request had settled before.
    pub fn finish(&self, value: T) -> Vec<R> {
        let Some(f) = self.done.borrow_mut().take() else {
            return Vec::new();
        };
        let Held { items, detach } = mem::take(&mut *self.held.borrow_mut());
        for detach in detach {
            detach();
        }
        f(value);
        items
    }
}
