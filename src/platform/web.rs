//! Browser host
//!
//! The browser owns the schedule: frames come from requestAnimationFrame and
//! storage completions from IndexedDB events, all on the one JS thread.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::bootstrap::Bootstrap;
use crate::config::ShellConfig;
use crate::driver::{FrameDriver, Program};
use crate::error::ShellError;
use crate::persistence::{IndexedDbStore, Storage};

/// Route `log` to the developer console and panics to `console.error`.
pub fn init_logging(config: &ShellConfig) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(config.log_level.level()).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Bootstrap the domain and start the frame loop.
pub fn start<P, F>(config: ShellConfig, init: F) -> Result<(), ShellError>
where
    P: Program + 'static,
    F: FnOnce(Storage) -> Result<P, ShellError>,
{
    log::info!("Frame shell starting...");

    let store = IndexedDbStore::from_window(&config)?;
    let storage = Storage::new(Rc::new(store));

    let context = Bootstrap::new(init).initialize(storage)?;
    let mut driver = FrameDriver::new();
    driver.start(context)?;

    request_animation_frame(Rc::new(RefCell::new(driver)));

    log::info!("Frame shell running!");
    Ok(())
}

fn request_animation_frame<P: Program + 'static>(driver: Rc<RefCell<FrameDriver<P>>>) {
    let Some(window) = web_sys::window() else {
        log::error!("No window; frame loop stopped");
        return;
    };
    let closure = Closure::once(move |time: f64| {
        frame_loop(driver, time);
    });
    if let Err(e) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
    closure.forget();
}

fn frame_loop<P: Program + 'static>(driver: Rc<RefCell<FrameDriver<P>>>, time: f64) {
    driver.borrow_mut().tick(time);
    request_animation_frame(driver);
}
