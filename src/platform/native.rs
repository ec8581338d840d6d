//! Native host
//!
//! Stands in for the browser: a fixed-rate loop delivers frame ticks and
//! file storage completions are pumped between frames on the same thread.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::bootstrap::Bootstrap;
use crate::config::ShellConfig;
use crate::driver::{FrameDriver, Program};
use crate::error::ShellError;
use crate::persistence::{FileStore, Storage};

pub fn init_logging(config: &ShellConfig) {
    let _ = env_logger::Builder::new()
        .filter_level(config.log_level.filter())
        .parse_default_env()
        .try_init();
}

/// Bootstrap the domain and drive it until `max_frames` ticks (forever if
/// `None`).
pub fn run<P, F>(config: ShellConfig, init: F, max_frames: Option<u64>) -> Result<(), ShellError>
where
    P: Program,
    F: FnOnce(Storage) -> Result<P, ShellError>,
{
    log::info!("Frame shell (native) starting...");

    let store = Rc::new(FileStore::new(&config)?);
    let storage = Storage::new(store.clone());

    let context = Bootstrap::new(init).initialize(storage)?;
    let mut driver = FrameDriver::new();
    driver.start(context)?;

    let interval = Duration::from_secs_f64(config.frame_interval_ms() / 1000.0);
    let started = Instant::now();

    while max_frames.is_none_or(|max| driver.frames() < max) {
        let frame_start = Instant::now();
        store.pump();
        driver.tick(started.elapsed().as_secs_f64() * 1000.0);
        if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // Deliver anything issued during the last frame.
    let flushed = store.pump();
    log::info!("Stopped after {} frames ({} completions flushed)", driver.frames(), flushed);
    Ok(())
}
