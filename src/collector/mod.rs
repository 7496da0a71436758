//! Telemetry collector family (§4.6). A collector carries a name and
//! drives its own start/stop lifecycle against a shared [`RunContext`];
//! the base trait's default bodies are deliberately unimplemented —
//! calling them on a type that doesn't override is a programming-contract
//! violation surfaced as an `INTERNAL` error, the way the teacher crate's
//! `Executor` trait `anyhow::bail!`s on unsupported checkpoint/restore
//! paths (`src/executor/mod.rs`) instead of silently no-opping.

pub mod controller_group;
pub mod perf;
pub mod process;
pub mod singleton;
pub mod stat_parser;

pub use controller_group::CollectorControllerGroup;
pub use perf::CollectorPerf;
pub use process::CollectorProcess;

use std::sync::Arc;

use crate::context::RunContext;
use crate::error::OrchestratorError;
use crate::executor::context::ExecutorContext;

pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self, _run: &Arc<RunContext>, _ctx: &Arc<ExecutorContext>) -> Result<(), OrchestratorError> {
        Err(OrchestratorError::internal(format!(
            "collector `{}` does not implement start (base Collector contract)",
            self.name()
        )))
    }

    fn stop(&self, _run: &Arc<RunContext>) -> Result<(), OrchestratorError> {
        Err(OrchestratorError::internal(format!(
            "collector `{}` does not implement stop (base Collector contract)",
            self.name()
        )))
    }
}
