use std::sync::Arc;
use std::thread::JoinHandle;

use crate::context::RunContext;
use crate::error::OrchestratorError;

/// A runnable unit a [`Thread`] drives: Concurrent/Parallel executors and
/// collector workers all implement this so `Thread` stays a single,
/// reusable OS-thread wrapper (§4.7 "Thread driver").
pub trait Runnable: Send {
    fn run(self: Box<Self>);
}

impl<F: FnOnce() + Send + 'static> Runnable for F {
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// Thin wrapper around `std::thread::spawn` (§5's "OS-level worker
/// threads"). Mirrors the teacher crate's preference for explicit,
/// named resource handles over bare `JoinHandle` plumbing scattered
/// through callers.
pub struct Thread {
    context: Arc<RunContext>,
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    pub fn new(context: Arc<RunContext>) -> Self {
        Self { context, handle: None }
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.context
    }

    /// Spawns `target` on a new OS thread.
    pub fn run(&mut self, target: Box<dyn Runnable + Send>) {
        self.handle = Some(std::thread::spawn(move || target.run()));
    }

    /// Blocks until the thread started by `run` finishes.
    pub fn join(&mut self) -> Result<(), OrchestratorError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| OrchestratorError::internal("Thread::join called before run"))?;
        handle
            .join()
            .map_err(|_| OrchestratorError::internal("worker thread panicked"))
    }
}
