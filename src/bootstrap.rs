//! Startup
//!
//! Creates the execution context exactly once. `initialize` consumes the
//! bootstrap, so a second context cannot be made from it.

use crate::driver::{ExecutionContext, Program};
use crate::error::ShellError;
use crate::persistence::Storage;

pub struct Bootstrap<F> {
    init: F,
}

impl<P, F> Bootstrap<F>
where
    P: Program,
    F: FnOnce(Storage) -> Result<P, ShellError>,
{
    pub fn new(init: F) -> Self {
        Self { init }
    }

    /// Run the domain initializer and wrap its state as the execution
    /// context. Any failure is fatal to the caller.
    pub fn initialize(self, storage: Storage) -> Result<ExecutionContext<P>, ShellError> {
        log::info!("Initializing execution context (record '{}')", storage.record());
        match (self.init)(storage) {
            Ok(program) => {
                let context = ExecutionContext::new(program);
                log::info!("Execution context {} created", context.id().get());
                Ok(context)
            }
            Err(e) => {
                let err = match e {
                    ShellError::Initialization(_) => e,
                    other => ShellError::Initialization(other.to_string()),
                };
                log::error!("{}", err);
                Err(err)
            }
        }
    }
}
