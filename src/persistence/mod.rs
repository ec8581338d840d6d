//! Asynchronous persistence bridge
//!
//! Bridges two host storage operations to the domain:
//! - Store: fire-and-forget, outcome only logged
//! - Load: outcome delivered to the domain's [`LoadHandler`]
//!
//! There is exactly one record, [`consts::RECORD_NAME`]. The shell
//! never looks inside the bytes.
//!
//! At most one store and one load may be outstanding at a time. A second
//! request of the same kind is still issued but logged as a caller bug.

pub mod memory;
pub mod queue;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod settle;
pub mod slot;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod idb;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::consts;
use crate::error::StorageError;

pub use memory::MemoryStore;
pub use queue::CompletionQueue;
pub use slot::SaveSlot;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use idb::IndexedDbStore;

/// Completion for a store request
pub type StoreCallback = Box<dyn FnOnce(Result<(), StorageError>)>;
/// Completion for a load request
pub type LoadCallback = Box<dyn FnOnce(Result<Vec<u8>, StorageError>)>;

/// Host-managed key-value storage.
///
/// Implementations must return immediately and invoke `on_done` exactly
/// once, later, from the host's own schedule.
pub trait RecordStore {
    fn store(&self, record: &str, data: Vec<u8>, on_done: StoreCallback);
    fn load(&self, record: &str, on_done: LoadCallback);
}

/// Opaque correlation value threaded through a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserToken(pub usize);

/// The domain's load-result handler.
///
/// `data` is `None` when the record is absent or the load failed; the two
/// cases are deliberately indistinguishable here.
pub trait LoadHandler {
    fn on_load(&mut self, token: UserToken, data: Option<&[u8]>);
}

impl<F> LoadHandler for F
where
    F: FnMut(UserToken, Option<&[u8]>),
{
    fn on_load(&mut self, token: UserToken, data: Option<&[u8]>) {
        self(token, data)
    }
}

/// Handle to the host store plus the fixed record name.
///
/// This is what the domain receives at bootstrap.
#[derive(Clone)]
pub struct Storage {
    store: Rc<dyn RecordStore>,
}

impl Storage {
    pub fn new(store: Rc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn record(&self) -> &'static str {
        consts::RECORD_NAME
    }
}

/// Diagnostic counters for completed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    pub stores_ok: u32,
    pub stores_failed: u32,
    pub loads_ok: u32,
    pub loads_failed: u32,
}

#[derive(Default)]
struct BridgeState {
    stores_in_flight: Cell<u32>,
    loads_in_flight: Cell<u32>,
    stats: Cell<BridgeStats>,
}

/// Count a newly issued request; returns how many were already outstanding.
fn issue(counter: &Cell<u32>) -> u32 {
    let outstanding = counter.get();
    counter.set(outstanding.saturating_add(1));
    outstanding
}

fn complete(counter: &Cell<u32>) {
    counter.set(counter.get().saturating_sub(1));
}

impl BridgeState {
    fn record(&self, update: impl FnOnce(&mut BridgeStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

/// Store/load bridge between the domain and a [`RecordStore`].
pub struct PersistenceBridge<H: LoadHandler + 'static> {
    storage: Storage,
    handler: Rc<RefCell<H>>,
    state: Rc<BridgeState>,
}

impl<H: LoadHandler + 'static> Clone for PersistenceBridge<H> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            handler: self.handler.clone(),
            state: self.state.clone(),
        }
    }
}

impl<H: LoadHandler + 'static> PersistenceBridge<H> {
    pub fn new(storage: Storage, handler: Rc<RefCell<H>>) -> Self {
        Self {
            storage,
            handler,
            state: Rc::new(BridgeState::default()),
        }
    }

    pub fn handler(&self) -> &Rc<RefCell<H>> {
        &self.handler
    }

    pub fn record(&self) -> &str {
        self.storage.record()
    }

    /// Overwrite the record with `data`. Fire-and-forget.
    ///
    /// The bytes are copied, so the caller may reuse its buffer immediately.
    pub fn store(&self, data: &[u8]) {
        let outstanding = issue(&self.state.stores_in_flight);
        if outstanding > 0 {
            log::warn!("Store issued while {} other store(s) are outstanding", outstanding);
        }

        let state = self.state.clone();
        let len = data.len();
        self.storage.store.store(
            self.storage.record(),
            data.to_vec(),
            Box::new(move |result: Result<(), StorageError>| {
                complete(&state.stores_in_flight);
                match result {
                    Ok(()) => {
                        log::info!("Save OK ({} bytes)", len);
                        state.record(|s| s.stores_ok += 1);
                    }
                    Err(e) => {
                        log::warn!("Save ERR: {}", e);
                        state.record(|s| s.stores_failed += 1);
                    }
                }
            }),
        );
    }

    /// Read the record; the result goes to the load handler with `token`.
    pub fn load(&self, token: UserToken) {
        let outstanding = issue(&self.state.loads_in_flight);
        if outstanding > 0 {
            log::warn!("Load issued while {} other load(s) are outstanding", outstanding);
        }

        let state = self.state.clone();
        let handler = self.handler.clone();
        self.storage.store.load(
            self.storage.record(),
            Box::new(move |result: Result<Vec<u8>, StorageError>| {
                complete(&state.loads_in_flight);
                let data = match result {
                    Ok(bytes) => {
                        log::info!("Loaded {} bytes", bytes.len());
                        state.record(|s| s.loads_ok += 1);
                        Some(bytes)
                    }
                    Err(e) if e.is_missing() => {
                        log::info!("No saved record");
                        state.record(|s| s.loads_failed += 1);
                        None
                    }
                    Err(e) => {
                        log::warn!("Load ERR: {}", e);
                        state.record(|s| s.loads_failed += 1);
                        None
                    }
                };

                match handler.try_borrow_mut() {
                    Ok(mut handler) => handler.on_load(token, data.as_deref()),
                    Err(_) => log::error!("Load handler is busy; dropping result for {:?}", token),
                }
            }),
        );
    }

    pub fn stats(&self) -> BridgeStats {
        self.state.stats.get()
    }

    pub fn store_in_flight(&self) -> bool {
        self.state.stores_in_flight.get() > 0
    }

    pub fn load_in_flight(&self) -> bool {
        self.state.loads_in_flight.get() > 0
    }
}
