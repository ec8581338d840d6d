//! Frame Shell - minimal browser host for a frame-driven program
//!
//! Core modules:
//! - `bootstrap`: Creates the single execution context at startup
//! - `driver`: Forwards host frame ticks to the domain's entry point
//! - `persistence`: Async store/load of one named record
//! - `platform`: Browser/native host loops
//! - `config`: Compiled-in defaults with developer overrides
//!
//! The domain program itself (simulation, rendering, audio) lives outside
//! this crate and is reached only through [`Program`] and [`Storage`].

pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod error;
pub mod persistence;
pub mod platform;

pub use bootstrap::Bootstrap;
pub use config::{LogLevel, ShellConfig};
pub use driver::{ContextId, ExecutionContext, Frame, FrameDriver, Program};
pub use error::{ShellError, StorageError};
pub use persistence::{
    LoadHandler, PersistenceBridge, RecordStore, SaveSlot, Storage, UserToken,
};

/// Shell constants
pub mod consts {
    /// IndexedDB database holding the record
    pub const DATABASE_NAME: &str = "frame_shell_db";
    /// Object store inside the database
    pub const OBJECT_STORE_NAME: &str = "records";
    /// The single persistence record
    pub const RECORD_NAME: &str = "savedata";
    /// Emulated refresh rate for the native host (Hz)
    pub const DEFAULT_FRAME_RATE: u32 = 60;
}
