//! IndexedDB host storage (WASM only)
//!
//! Each request opens the database, runs one transaction against the object
//! store and closes it again. Records are stored as `Uint8Array` values keyed
//! by record name. Completions arrive through IDB events on the browser's
//! event loop, never inside the issuing call.
//!
//! Every IDB request registers several listeners (success, error, abort...)
//! of which only one fires. The listeners of a request are owned by its
//! [`Settle`] completion and are detached and freed once it settles.

use std::rc::Rc;

use js_sys::{Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::{
    Event, IdbDatabase, IdbFactory, IdbOpenDbRequest, IdbRequest, IdbTransaction,
    IdbTransactionMode,
};

use super::settle::Settle;
use super::{LoadCallback, RecordStore, StoreCallback};
use crate::config::ShellConfig;
use crate::error::{ShellError, StorageError};

const DB_VERSION: u32 = 1;

#[wasm_bindgen]
extern "C" {
    /// `Promise.prototype.then` with a plain function, so a self-freeing
    /// `once_into_js` callback can be passed.
    #[wasm_bindgen(method, js_name = then)]
    fn then_call(this: &Promise, on_fulfilled: &JsValue) -> Promise;
}

/// Run `f` on a microtask. Needs no window and cannot fail to schedule.
fn defer(f: impl FnOnce() + 'static) {
    let callback = Closure::once_into_js(move |_: JsValue| f());
    Promise::resolve(&JsValue::UNDEFINED).then_call(&callback);
}

type Listener = Closure<dyn FnMut(Event)>;
type Pending<T> = Settle<T, Listener>;

/// Settle `pending` and free its listeners once the current event returns.
fn finish<T: 'static>(pending: &Pending<T>, value: T) {
    let listeners = pending.finish(value);
    if !listeners.is_empty() {
        defer(move || drop(listeners));
    }
}

fn js_error(context: &str, err: JsValue) -> StorageError {
    StorageError::Host(format!("{}: {:?}", context, err))
}

pub struct IndexedDbStore {
    factory: IdbFactory,
    database: String,
    object_store: Rc<str>,
}

impl IndexedDbStore {
    pub fn new(factory: IdbFactory, config: &ShellConfig) -> Self {
        Self {
            factory,
            database: config.database.clone(),
            object_store: Rc::from(config.object_store.as_str()),
        }
    }

    /// Use the window's IndexedDB factory.
    pub fn from_window(config: &ShellConfig) -> Result<Self, ShellError> {
        let window =
            web_sys::window().ok_or_else(|| ShellError::HostUnavailable("no window".into()))?;
        let factory = window
            .indexed_db()
            .map_err(|e| ShellError::HostUnavailable(format!("indexedDB: {:?}", e)))?
            .ok_or_else(|| ShellError::HostUnavailable("indexedDB not supported".into()))?;
        Ok(Self::new(factory, config))
    }

    fn open(&self, on_open: impl FnOnce(Result<IdbDatabase, StorageError>) + 'static) {
        let done = Pending::new(on_open);

        let request = match self.factory.open_with_u32(&self.database, DB_VERSION) {
            Ok(request) => request,
            Err(e) => {
                // Still report on the host's schedule.
                let context = format!("open {}", self.database);
                defer(move || finish(&done, Err(js_error(&context, e))));
                return;
            }
        };

        {
            let object_store = self.object_store.clone();
            let upgrade = Listener::new(move |event: Event| {
                let db = event
                    .target()
                    .and_then(|t| t.dyn_into::<IdbOpenDbRequest>().ok())
                    .and_then(|r| r.result().ok())
                    .and_then(|r| r.dyn_into::<IdbDatabase>().ok());
                if let Some(db) = db {
                    if !db.object_store_names().contains(&object_store) {
                        match db.create_object_store(&object_store) {
                            Ok(_) => log::info!("Created object store '{}'", object_store),
                            Err(e) => log::error!("Failed to create object store: {:?}", e),
                        }
                    }
                }
            });
            request.set_onupgradeneeded(Some(upgrade.as_ref().unchecked_ref()));
            let req = request.clone();
            done.hold(upgrade, move || req.set_onupgradeneeded(None));
        }

        {
            let pending = done.clone();
            let req = request.clone();
            let success = Listener::new(move |_: Event| {
                let db = req
                    .result()
                    .and_then(|r| r.dyn_into::<IdbDatabase>())
                    .map_err(|e| js_error("open result", e));
                finish(&pending, db);
            });
            request.set_onsuccess(Some(success.as_ref().unchecked_ref()));
            let req = request.clone();
            done.hold(success, move || req.set_onsuccess(None));
        }

        {
            let pending = done.clone();
            let req = request.clone();
            let error = Listener::new(move |_: Event| {
                let err = match req.error() {
                    Ok(Some(e)) => StorageError::Host(e.message()),
                    _ => StorageError::Host("open failed".into()),
                };
                finish(&pending, Err(err));
            });
            request.set_onerror(Some(error.as_ref().unchecked_ref()));
            done.hold(error, move || request.set_onerror(None));
        }
    }

    fn transaction(
        db: &IdbDatabase,
        object_store: &str,
        mode: IdbTransactionMode,
    ) -> Result<(IdbTransaction, web_sys::IdbObjectStore), StorageError> {
        let tx = db
            .transaction_with_str_and_mode(object_store, mode)
            .map_err(|e| js_error("transaction", e))?;
        let store = tx
            .object_store(object_store)
            .map_err(|e| js_error("object store", e))?;
        Ok((tx, store))
    }
}

impl RecordStore for IndexedDbStore {
    fn store(&self, record: &str, data: Vec<u8>, on_done: StoreCallback) {
        let object_store = self.object_store.clone();
        let key = JsValue::from_str(record);

        self.open(move |opened| {
            let db = match opened {
                Ok(db) => db,
                Err(e) => return on_done(Err(e)),
            };

            let done = Pending::new(on_done);
            let issued = Self::transaction(&db, &object_store, IdbTransactionMode::Readwrite)
                .and_then(|(tx, store)| {
                    let value = Uint8Array::from(data.as_slice());
                    store
                        .put_with_key(&value, &key)
                        .map_err(|e| js_error("put", e))?;
                    Ok(tx)
                });

            let tx = match issued {
                Ok(tx) => tx,
                Err(e) => {
                    db.close();
                    return finish(&done, Err(e));
                }
            };

            {
                let pending = done.clone();
                let db = db.clone();
                let complete = Listener::new(move |_: Event| {
                    db.close();
                    finish(&pending, Ok(()));
                });
                tx.set_oncomplete(Some(complete.as_ref().unchecked_ref()));
                let tx = tx.clone();
                done.hold(complete, move || tx.set_oncomplete(None));
            }
            {
                let pending = done.clone();
                let db = db.clone();
                let error = Listener::new(move |_: Event| {
                    db.close();
                    finish(&pending, Err(StorageError::Host("store transaction failed".into())));
                });
                tx.set_onerror(Some(error.as_ref().unchecked_ref()));
                let tx = tx.clone();
                done.hold(error, move || tx.set_onerror(None));
            }
            {
                let pending = done.clone();
                let abort = Listener::new(move |_: Event| {
                    db.close();
                    finish(&pending, Err(StorageError::Host("store transaction aborted".into())));
                });
                tx.set_onabort(Some(abort.as_ref().unchecked_ref()));
                done.hold(abort, move || tx.set_onabort(None));
            }
        });
    }

    fn load(&self, record: &str, on_done: LoadCallback) {
        let object_store = self.object_store.clone();
        let key = JsValue::from_str(record);

        self.open(move |opened| {
            let db = match opened {
                Ok(db) => db,
                Err(e) => return on_done(Err(e)),
            };

            let done = Pending::new(on_done);
            let issued = Self::transaction(&db, &object_store, IdbTransactionMode::Readonly)
                .and_then(|(_tx, store)| store.get(&key).map_err(|e| js_error("get", e)));

            let request: IdbRequest = match issued {
                Ok(request) => request,
                Err(e) => {
                    db.close();
                    return finish(&done, Err(e));
                }
            };

            {
                let pending = done.clone();
                let db = db.clone();
                let req = request.clone();
                let success = Listener::new(move |_: Event| {
                    db.close();
                    let result = match req.result() {
                        Ok(value) if value.is_undefined() || value.is_null() => {
                            Err(StorageError::Missing)
                        }
                        Ok(value) => Ok(Uint8Array::new(&value).to_vec()),
                        Err(e) => Err(js_error("get result", e)),
                    };
                    finish(&pending, result);
                });
                request.set_onsuccess(Some(success.as_ref().unchecked_ref()));
                let req = request.clone();
                done.hold(success, move || req.set_onsuccess(None));
            }
            {
                let pending = done.clone();
                let error = Listener::new(move |_: Event| {
                    db.close();
                    finish(&pending, Err(StorageError::Host("load request failed".into())));
                });
                request.set_onerror(Some(error.as_ref().unchecked_ref()));
                done.hold(error, move || request.set_onerror(None));
            }
        });
    }
}
