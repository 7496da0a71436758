use std::fs::File;
use std::io::Read;
use std::process::{Child, ChildStdout, Command as StdCommand, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::entity::command::EntityCommand;
use crate::error::OrchestratorError;

/// Splits a shell-style command line into argv, honoring single and
/// double quoting but nothing fancier (no variable expansion, no
/// backslash escapes) — the entity model only ever hands this plain
/// templated strings, never arbitrary shell syntax, when `shell` is
/// false (§4.7 "Process driver").
fn split_argv(cmd: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in cmd.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    in_token = true;
                } else if c.is_whitespace() {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else {
                    current.push(c);
                    in_token = true;
                }
            }
        }
    }
    if in_token {
        args.push(current);
    }
    args
}

/// Splits a non-shell pipeline command on unquoted `|` into its stages.
fn split_pipeline(cmd: &str) -> Vec<String> {
    cmd.split('|').map(|s| s.trim().to_string()).collect()
}

/// Drives a single (possibly piped) subprocess invocation: builds
/// argv/pipeline, spawns it, applies the optional `run_time` watchdog,
/// and collects output (§4.7). One `Process` handles exactly one
/// [`EntityCommand`] at a time; `ProcessExecutor` constructs a fresh
/// instance per invocation.
pub struct Process {
    context: Arc<RunContext>,
    command: Option<EntityCommand>,
    stages: Vec<Child>,
    stdout_data: Vec<u8>,
    stderr_data: Vec<u8>,
    exit_code: Option<i32>,
    stdout_file: Option<File>,
    stderr_file: Option<File>,
}

impl Process {
    pub fn new(context: Arc<RunContext>) -> Self {
        Self {
            context,
            command: None,
            stages: Vec::new(),
            stdout_data: Vec::new(),
            stderr_data: Vec::new(),
            exit_code: None,
            stdout_file: None,
            stderr_file: None,
        }
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.context
    }

    pub fn command(&self) -> Option<&EntityCommand> {
        self.command.as_ref()
    }

    pub fn set_command(&mut self, command: EntityCommand) {
        self.command = Some(command);
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout_data
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr_data
    }

    /// Spawns the pipeline described by `command`, wiring each stage's
    /// stdout into the next stage's stdin. The final stage's stdout/stderr
    /// are left piped unless `pipe_stdout`/`pipe_stderr` name a file.
    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        let command = self
            .command
            .clone()
            .ok_or_else(|| OrchestratorError::internal("Process::start called without a command"))?;

        let stages: Vec<Vec<String>> = if command.shell() {
            vec![vec![command.cmd().unwrap_or_default().to_string()]]
        } else {
            split_pipeline(command.cmd().unwrap_or_default())
                .into_iter()
                .map(|s| split_argv(&s))
                .collect()
        };

        let mut previous_stdout: Option<ChildStdout> = None;
        let stage_count = stages.len();

        for (i, stage) in stages.into_iter().enumerate() {
            let is_last = i + 1 == stage_count;
            let mut builder = if command.shell() {
                let mut b = StdCommand::new(command.shell_executable().unwrap_or("/bin/sh"));
                b.arg("-c").arg(&stage[0]);
                b
            } else {
                let mut b = StdCommand::new(&stage[0]);
                b.args(&stage[1..]);
                b
            };

            if let Some(stdin) = previous_stdout.take() {
                builder.stdin(Stdio::from(stdin));
            }

            builder.stdout(Stdio::piped());
            builder.stderr(Stdio::piped());

            debug!(cmd = ?stage, "spawning process stage");
            let mut child = builder
                .spawn()
                .map_err(|e| OrchestratorError::subprocess(format!("failed to spawn {stage:?}: {e}")))?;

            if !is_last {
                previous_stdout = child.stdout.take();
                // Intermediate stderr is not consumed further; close it so
                // the upstream process doesn't block writing to it.
                drop(child.stderr.take());
            }
            self.stages.push(child);
        }

        if let Some(path) = command.pipe_stdout() {
            self.stdout_file = Some(
                File::create(path)
                    .map_err(|e| OrchestratorError::internal(format!("failed to open {path}: {e}")))?,
            );
        }
        if let Some(path) = command.pipe_stderr() {
            self.stderr_file = Some(
                File::create(path)
                    .map_err(|e| OrchestratorError::internal(format!("failed to open {path}: {e}")))?,
            );
        }

        if command.run_time() > 0 {
            self.timer(command.run_time())?;
        }

        Ok(())
    }

    /// Polls the last pipeline stage once a second, up to `run_time`
    /// seconds; if it is still running once the budget is exhausted,
    /// sends the default termination signal.
    fn timer(&mut self, run_time: u64) -> Result<(), OrchestratorError> {
        let mut exited = false;
        for _ in 0..run_time {
            let still_running = {
                let child = self.stages.last_mut().expect("process started before timer runs");
                child
                    .try_wait()
                    .map_err(|e| OrchestratorError::subprocess(format!("poll failed: {e}")))?
                    .is_none()
            };
            if !still_running {
                exited = true;
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
        if !exited {
            self.signal(Signal::SIGTERM)?;
        }
        Ok(())
    }

    /// Sends `sig` to the final pipeline stage.
    pub fn signal(&mut self, sig: Signal) -> Result<(), OrchestratorError> {
        let child = self
            .stages
            .last()
            .ok_or_else(|| OrchestratorError::internal("Process::signal called before start"))?;
        signal::kill(Pid::from_raw(child.id() as i32), sig)
            .map_err(|e| OrchestratorError::subprocess(format!("failed to signal process: {e}")))
    }

    /// Blocks until the last stage exits, collecting its output. Used by
    /// the asynchronous process variant (§4.5 "Asynchronous process
    /// variant"): `start()` returns immediately, `wait()` is the second
    /// half of the lifecycle a collector's `stop()` calls after signaling.
    pub fn wait(&mut self) -> Result<(), OrchestratorError> {
        self.communicate(None)
    }

    /// Signals the final stage (default SIGTERM) then waits for it to
    /// exit — the `execute_stop` half of the asynchronous process variant.
    pub fn stop(&mut self) -> Result<(), OrchestratorError> {
        self.signal(Signal::SIGTERM)?;
        self.wait()
    }

    /// `start()` followed by `communicate`: waits (optionally bounded by
    /// `timeout`), collects stdout/stderr, honors `debug_stdout`/
    /// `debug_stderr`/`pipe_stdout`/`pipe_stderr`, and — on a timeout —
    /// kills the process and either raises or swallows depending on
    /// `raise_error` (§7 "A command carrying raise_error = false...").
    pub fn run(&mut self) -> Result<(), OrchestratorError> {
        self.start()?;
        let command = self.command.clone().expect("checked by start()");

        match self.communicate(command.timeout()) {
            Ok(()) => {}
            Err(err @ OrchestratorError::Timeout { .. }) => {
                if command.raise_error() {
                    return Err(err);
                }
                warn!(error = %err, "command timed out, raise_error is false; continuing");
            }
            Err(err) => return Err(err),
        }

        if command.debug_stdout() {
            debug!(stdout = ?self.stdout_data, "command stdout");
        }
        if command.debug_stderr() {
            debug!(stderr = ?self.stderr_data, "command stderr");
        }

        if self.exit_code.is_some_and(|code| code != 0) {
            let message = format!(
                "command `{}` exited with status {}",
                command.cmd().unwrap_or(""),
                self.exit_code.unwrap()
            );
            if command.raise_error() {
                return Err(OrchestratorError::subprocess(message));
            }
            warn!(error = %message, "non-zero exit, raise_error is false; continuing");
        }

        if let Some(mut file) = self.stdout_file.take() {
            use std::io::Write;
            let _ = file.write_all(&self.stdout_data);
        }
        if let Some(mut file) = self.stderr_file.take() {
            use std::io::Write;
            let _ = file.write_all(&self.stderr_data);
        }

        Ok(())
    }

    fn communicate(&mut self, timeout: Option<u64>) -> Result<(), OrchestratorError> {
        let mut child = self.stages.pop().expect("process started before communicate");

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_reader = stdout_pipe.take().map(|mut s| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = s.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_reader = stderr_pipe.take().map(|mut s| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = s.read_to_end(&mut buf);
                buf
            })
        });

        let status = match timeout {
            None => child
                .wait()
                .map_err(|e| OrchestratorError::subprocess(format!("wait failed: {e}")))?,
            Some(seconds) => {
                let deadline = Instant::now() + Duration::from_secs(seconds);
                loop {
                    if let Some(status) = child
                        .try_wait()
                        .map_err(|e| OrchestratorError::subprocess(format!("poll failed: {e}")))?
                    {
                        break status;
                    }
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(OrchestratorError::Timeout {
                            cmd: self
                                .command
                                .as_ref()
                                .and_then(|c| c.cmd())
                                .unwrap_or("")
                                .to_string(),
                            seconds,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        };

        self.exit_code = status.code();
        if let Some(reader) = stdout_reader {
            self.stdout_data = reader.join().unwrap_or_default();
        }
        if let Some(reader) = stderr_reader {
            self.stderr_data = reader.join().unwrap_or_default();
        }
        Ok(())
    }
}
