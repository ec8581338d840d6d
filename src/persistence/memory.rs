//! In-process host storage
//!
//! Emulates a browser key-value store: requests return immediately and their
//! completions run when the host calls [`MemoryStore::run_pending`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::queue::CompletionQueue;
use super::{LoadCallback, RecordStore, StoreCallback};
use crate::error::StorageError;

#[derive(Default)]
pub struct MemoryStore {
    records: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    queue: CompletionQueue,
    fail_store: Cell<bool>,
    fail_load: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver every queued completion. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        self.queue.drain()
    }

    /// Deliver only the oldest queued completion.
    pub fn run_next(&self) -> bool {
        self.queue.run_one()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Make the next store complete with a host error.
    pub fn fail_next_store(&self) {
        self.fail_store.set(true);
    }

    /// Make the next load complete with a host error.
    pub fn fail_next_load(&self) {
        self.fail_load.set(true);
    }

    /// Seed a record directly, bypassing the async path.
    pub fn insert(&self, record: &str, data: Vec<u8>) {
        self.records.borrow_mut().insert(record.to_string(), data);
    }

    pub fn get(&self, record: &str) -> Option<Vec<u8>> {
        self.records.borrow().get(record).cloned()
    }
}

impl RecordStore for MemoryStore {
    fn store(&self, record: &str, data: Vec<u8>, on_done: StoreCallback) {
        let fail = self.fail_store.replace(false);
        let records = self.records.clone();
        let record = record.to_string();
        self.queue.push(move || {
            if fail {
                on_done(Err(StorageError::Host("injected store failure".into())));
            } else {
                records.borrow_mut().insert(record, data);
                on_done(Ok(()));
            }
        });
    }

    fn load(&self, record: &str, on_done: LoadCallback) {
        let fail = self.fail_load.replace(false);
        let records = self.records.clone();
        let record = record.to_string();
        self.queue.push(move || {
            if fail {
                on_done(Err(StorageError::Host("injected load failure".into())));
                return;
            }
            // Copy out before calling back so the callback may touch the store.
            let found = records.borrow().get(&record).cloned();
            match found {
                Some(data) => on_done(Ok(data)),
                None => on_done(Err(StorageError::Missing)),
            }
        });
    }
}
