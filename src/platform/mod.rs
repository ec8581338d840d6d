//! Platform abstraction layer
//!
//! Hosts the frame loop and storage backend for each target:
//! - `web`: requestAnimationFrame + IndexedDB (wasm32)
//! - `native`: fixed-rate loop + file storage, for development and tests

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod web;
