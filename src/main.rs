//! Frame Shell entry point
//!
//! Wires a small demo program into the host: it counts frames across runs,
//! restoring the total at startup and autosaving it periodically.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod demo {
    use std::sync::mpsc::{Receiver, TryRecvError};

    use frame_shell::{Frame, Program, SaveSlot, ShellError, Storage};

    /// Frames between autosaves (~2 s at 60 Hz)
    pub const AUTOSAVE_FRAMES: u64 = 120;

    pub struct Counter {
        slot: SaveSlot,
        restore: Option<Receiver<Vec<u8>>>,
        total: u64,
    }

    impl Counter {
        pub fn start(storage: Storage) -> Result<Self, ShellError> {
            let slot = SaveSlot::new(storage);
            let restore = Some(slot.load());
            Ok(Self {
                slot,
                restore,
                total: 0,
            })
        }

        fn poll_restore(&mut self) {
            let Some(rx) = &self.restore else { return };
            match rx.try_recv() {
                Ok(bytes) => {
                    let saved = decode(&bytes);
                    log::info!("Restored {} frames from a previous run", saved);
                    self.total += saved;
                    self.restore = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.restore = None,
            }
        }
    }

    /// Saved layout: total frame count, little-endian u64. Anything else
    /// counts as no save.
    pub fn decode(bytes: &[u8]) -> u64 {
        <[u8; 8]>::try_from(bytes)
            .map(u64::from_le_bytes)
            .unwrap_or(0)
    }

    impl Program for Counter {
        fn iterate(&mut self, frame: &Frame) {
            self.poll_restore();
            self.total += 1;

            if frame.index > 0 && frame.index % AUTOSAVE_FRAMES == 0 {
                log::debug!("Autosave at frame {} (total {})", frame.index, self.total);
                self.slot.save(&self.total.to_le_bytes());
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use frame_shell::persistence::MemoryStore;
        use frame_shell::{Bootstrap, FrameDriver};
        use std::rc::Rc;

        #[test]
        fn test_decode() {
            assert_eq!(decode(&42u64.to_le_bytes()), 42);
            assert_eq!(decode(&[]), 0);
            assert_eq!(decode(&[1, 2, 3]), 0);
        }

        #[test]
        fn test_restored_total_is_added() {
            let host = Rc::new(MemoryStore::new());
            host.insert(frame_shell::consts::RECORD_NAME, 1000u64.to_le_bytes().to_vec());
            let storage = Storage::new(host.clone());

            let context = Bootstrap::new(Counter::start).initialize(storage).unwrap();
            let mut driver = FrameDriver::new();
            driver.start(context).unwrap();

            driver.tick(0.0);
            host.run_pending();
            driver.tick(16.0);

            let mut saved = None;
            for i in 2..=AUTOSAVE_FRAMES {
                driver.tick(i as f64 * 16.0);
                host.run_pending();
                saved = host.get(frame_shell::consts::RECORD_NAME).map(|b| decode(&b));
            }
            // 1000 restored + AUTOSAVE_FRAMES + 1 ticks counted at the save.
            assert_eq!(saved, Some(1000 + AUTOSAVE_FRAMES + 1));
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    use frame_shell::ShellConfig;
    use frame_shell::platform::web;

    let config = ShellConfig::load();
    web::init_logging(&config);
    web::start(config, demo::Counter::start).map_err(|e| {
        log::error!("Fatal: {}", e);
        JsValue::from_str(&e.to_string())
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use frame_shell::ShellConfig;
    use frame_shell::platform::native;

    /// Frames the native demo runs before exiting (~10 s at 60 Hz)
    const NATIVE_DEMO_FRAMES: u64 = 600;

    let config = ShellConfig::load();
    native::init_logging(&config);

    if let Err(e) = native::run(config, demo::Counter::start, Some(NATIVE_DEMO_FRAMES)) {
        log::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
