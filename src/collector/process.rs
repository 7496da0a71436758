use std::sync::{Arc, Mutex};

use crate::context::RunContext;
use crate::entity::command::EntityCommand;
use crate::entity::CollectorConfig;
use crate::error::OrchestratorError;
use crate::executor::context::ExecutorContext;
use crate::process::Process;

use super::Collector;

/// Runs an arbitrary command as a long-lived telemetry producer (§4.6
/// "Process collector"). Materializes the same [`EntityCommand`] shape a
/// regular command uses, so it drives the identical process-executor path
/// — just started asynchronously and stopped rather than run to
/// completion inline.
pub struct CollectorProcess {
    name: String,
    config: CollectorConfig,
    process: Mutex<Option<Process>>,
}

impl CollectorProcess {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            name: config.name.clone(),
            config,
            process: Mutex::new(None),
        }
    }

    fn command(&self) -> EntityCommand {
        let mut command = EntityCommand::default();
        if let Some(cmd) = &self.config.cmd {
            command.set_cmd(cmd.clone());
        }
        if let Some(become_cmd) = &self.config.become_cmd {
            command.set_become_cmd(become_cmd.clone());
        }
        command.set_shell(self.config.shell.unwrap_or(false));
        if let Some(shell_executable) = &self.config.shell_executable {
            command.set_shell_executable(shell_executable.clone());
        }
        if let Some(path) = &self.config.pipe_stdout {
            command.set_pipe_stdout(path.clone());
        }
        if let Some(path) = &self.config.pipe_stderr {
            command.set_pipe_stderr(path.clone());
        }
        command
    }
}

impl Collector for CollectorProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, run: &Arc<RunContext>, ctx: &Arc<ExecutorContext>) -> Result<(), OrchestratorError> {
        let entity = ctx
            .entity()
            .cloned()
            .ok_or_else(|| OrchestratorError::internal("collector frame carries no entity"))?;

        let mut command = self.command();
        if let Some(cmd) = command.cmd() {
            let substituted = run.substitute(cmd, ctx, &entity)?;
            command.set_cmd(substituted);
        }

        let mut process = Process::new(run.clone());
        process.set_command(command);
        process.start()?;
        *self.process.lock().unwrap() = Some(process);
        Ok(())
    }

    fn stop(&self, _run: &Arc<RunContext>) -> Result<(), OrchestratorError> {
        let mut guard = self.process.lock().unwrap();
        if let Some(mut process) = guard.take() {
            process.stop()?;
        }
        Ok(())
    }
}
