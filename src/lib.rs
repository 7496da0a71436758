//! `cgharness-core` — a Linux cgroup v2 performance-experiment
//! orchestrator (§1). A plan's declarative tree of suites/cases/commands
//! is built in [`entity`], assembled into a nested [`executor`] tree by
//! [`runner`], and driven against a single timestamped [`context::RunContext`].

pub mod collector;
pub mod context;
pub mod controller;
pub mod entity;
pub mod error;
pub mod executor;
pub mod plandoc;
pub mod plugin;
pub mod process;
pub mod runner;
pub mod stat;
pub mod thread;

pub use context::{check_preconditions, RunContext};
pub use error::OrchestratorError;
pub use runner::Runner;

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber. Reads `RUST_LOG` via
/// `EnvFilter`, defaulting to `info`, the same setup the teacher crate's
/// own `init()` used.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic_when_called_once() {
        init_tracing();
    }
}
