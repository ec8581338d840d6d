//! Channel-based save slot
//!
//! The simplest way for a domain to use the bridge: `save` bytes and get a
//! `Receiver` back from `load`. Each load allocates a fresh [`UserToken`] that
//! maps to its one-shot sender. A failed or empty load sends an empty vec.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};

use super::{BridgeStats, LoadHandler, PersistenceBridge, Storage, UserToken};

/// Senders for loads that have not completed yet
#[derive(Default)]
pub struct PendingLoads {
    next_token: usize,
    senders: HashMap<UserToken, Sender<Vec<u8>>>,
}

impl PendingLoads {
    fn register(&mut self, sender: Sender<Vec<u8>>) -> UserToken {
        let token = UserToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.senders.insert(token, sender);
        token
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl LoadHandler for PendingLoads {
    fn on_load(&mut self, token: UserToken, data: Option<&[u8]>) {
        let Some(sender) = self.senders.remove(&token) else {
            log::warn!("Load completed for unknown token {:?}", token);
            return;
        };
        let bytes = match data {
            Some(bytes) if !bytes.is_empty() => bytes.to_vec(),
            _ => {
                log::info!("callback: no saved data");
                Vec::new()
            }
        };
        // The receiver may have been dropped; nothing to do then.
        sender.send(bytes).ok();
    }
}

/// Save/load facade for domain code
#[derive(Clone)]
pub struct SaveSlot {
    bridge: PersistenceBridge<PendingLoads>,
}

impl SaveSlot {
    pub fn new(storage: Storage) -> Self {
        let pending = Rc::new(RefCell::new(PendingLoads::default()));
        Self {
            bridge: PersistenceBridge::new(storage, pending),
        }
    }

    /// Overwrite the saved record. Best-effort; the outcome is only logged.
    pub fn save(&self, data: &[u8]) {
        self.bridge.store(data);
    }

    /// Request the saved record. The receiver gets exactly one message once
    /// the host completes; an empty vec means nothing was restored.
    pub fn load(&self) -> Receiver<Vec<u8>> {
        let (tx, rx) = channel();
        let token = self.bridge.handler().borrow_mut().register(tx);
        self.bridge.load(token);
        rx
    }

    pub fn outstanding_loads(&self) -> usize {
        self.bridge.handler().borrow().len()
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }
}
