//! Frame-driven execution
//!
//! The driver owns the single execution context and relays every host frame
//! tick to the domain's per-frame entry point. It never inspects, retries or
//! rate-limits ticks.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ShellError;

/// Identity of one execution context, stable for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Token handed to the domain on every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The context this frame belongs to
    pub context: ContextId,
    /// Ticks forwarded before this one
    pub index: u64,
    /// Host timestamp for the frame (ms)
    pub time_ms: f64,
}

/// The domain's per-frame entry point.
pub trait Program {
    fn iterate(&mut self, frame: &Frame);
}

/// Opaque handle to one running instance of the domain program.
///
/// Not `Clone`: there is exactly one, and the driver owns it once running.
pub struct ExecutionContext<P> {
    id: ContextId,
    program: P,
}

impl<P> ExecutionContext<P> {
    pub(crate) fn new(program: P) -> Self {
        Self {
            id: ContextId::next(),
            program,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }
}

enum DriverState<P> {
    Uninitialized,
    Running { context: ExecutionContext<P>, frames: u64 },
}

/// Relays host frame ticks to the domain.
pub struct FrameDriver<P: Program> {
    state: DriverState<P>,
}

impl<P: Program> Default for FrameDriver<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Program> FrameDriver<P> {
    pub fn new() -> Self {
        Self {
            state: DriverState::Uninitialized,
        }
    }

    /// Take ownership of the context. Allowed once.
    pub fn start(&mut self, context: ExecutionContext<P>) -> Result<(), ShellError> {
        if self.is_running() {
            return Err(ShellError::AlreadyRunning);
        }
        log::info!("Driver running context {}", context.id().get());
        self.state = DriverState::Running { context, frames: 0 };
        Ok(())
    }

    /// One host-scheduled frame.
    pub fn tick(&mut self, time_ms: f64) {
        match &mut self.state {
            DriverState::Uninitialized => {
                log::debug!("Tick before start ignored");
            }
            DriverState::Running { context, frames } => {
                let frame = Frame {
                    context: context.id,
                    index: *frames,
                    time_ms,
                };
                *frames += 1;
                context.program.iterate(&frame);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    /// Ticks forwarded so far
    pub fn frames(&self) -> u64 {
        match &self.state {
            DriverState::Uninitialized => 0,
            DriverState::Running { frames, .. } => *frames,
        }
    }

    pub fn context_id(&self) -> Option<ContextId> {
        match &self.state {
            DriverState::Uninitialized => None,
            DriverState::Running { context, .. } => Some(context.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        seen: Rc<RefCell<Vec<Frame>>>,
    }

    impl Program for Recorder {
        fn iterate(&mut self, frame: &Frame) {
            self.seen.borrow_mut().push(*frame);
        }
    }

    fn recorder() -> (Recorder, Rc<RefCell<Vec<Frame>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (Recorder { seen: seen.clone() }, seen)
    }

    #[test]
    fn test_tick_before_start_is_dropped() {
        let mut driver: FrameDriver<Recorder> = FrameDriver::new();
        driver.tick(16.0);
        assert!(!driver.is_running());
        assert_eq!(driver.frames(), 0);
        assert_eq!(driver.context_id(), None);
    }

    #[test]
    fn test_each_tick_forwards_once_with_same_context() {
        let (program, seen) = recorder();
        let context = ExecutionContext::new(program);
        let id = context.id();

        let mut driver = FrameDriver::new();
        driver.start(context).unwrap();
        for i in 0..5 {
            driver.tick(i as f64 * 16.0);
        }

        let seen = seen.borrow();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|f| f.context == id));
        let indices: Vec<u64> = seen.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(seen[4].time_ms, 64.0);
        assert_eq!(driver.frames(), 5);
        assert_eq!(driver.context_id(), Some(id));
    }

    #[test]
    fn test_second_start_rejected() {
        let (first, seen) = recorder();
        let (second, other) = recorder();
        let first = ExecutionContext::new(first);
        let first_id = first.id();

        let mut driver = FrameDriver::new();
        driver.start(first).unwrap();
        let err = driver.start(ExecutionContext::new(second)).unwrap_err();
        assert!(matches!(err, ShellError::AlreadyRunning));

        driver.tick(0.0);
        assert_eq!(seen.borrow().len(), 1);
        assert!(other.borrow().is_empty());
        assert_eq!(driver.context_id(), Some(first_id));
    }

    #[test]
    fn test_context_ids_are_unique() {
        let a = ExecutionContext::new(());
        let b = ExecutionContext::new(());
        assert_ne!(a.id(), b.id());
    }
}
