
use std::sync::{Arc, RwLock, Weak};

use super::case::EntityCase;
use super::entity::{validate_entity_name, Entity};
use super::plan::EntityPlan;
use super::suite::EntitySuite;
use crate::error::OrchestratorError;

/// A command's parent is whichever entity owns it: a plan, suite or case
/// when used as a pre/post hook, or a case when it is a regular command
/// (§3 "Plans/Suites/Cases own ..."). The back-link is lookup-only per the
/// parent invariant in §9 — it is a `Weak` reference in every variant.
#[derive(Clone)]
pub enum CommandParent {
    Plan(Weak<RwLock<EntityPlan>>),
    Suite(Weak<RwLock<EntitySuite>>),
    Case(Weak<RwLock<EntityCase>>),
}

/// A single templated shell invocation (§3). Cloneable so the process
/// driver can work from a detached, placeholder-substituted snapshot
/// without touching the entity tree's shared `Arc<RwLock<_>>` node.
#[derive(Clone)]
pub struct EntityCommand {
    name: Option<String>,
    parent: Option<CommandParent>,
    cmd: Option<String>,
    become_cmd: Option<String>,
    shell: bool,
    shell_executable: Option<String>,
    timeout: Option<u64>,
    run_time: u64,
    pipe_stdout: Option<String>,
    pipe_stderr: Option<String>,
    debug_stdout: bool,
    debug_stderr: bool,
    raise_error: bool,
    cgroups: Vec<String>,
}

impl Default for EntityCommand {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            cmd: None,
            become_cmd: None,
            shell: false,
            shell_executable: None,
            timeout: None,
            run_time: 0,
            pipe_stdout: None,
            pipe_stderr: None,
            debug_stdout: false,
            debug_stderr: false,
            raise_error: true,
            cgroups: Vec::new(),
        }
    }
}

impl EntityCommand {
    pub fn new() -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), OrchestratorError> {
        let name = name.into();
        validate_entity_name(&name)?;
        self.name = Some(name);
        Ok(())
    }

    pub fn parent(&self) -> Option<&CommandParent> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: CommandParent) {
        self.parent = Some(parent);
    }

    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref()
    }

    pub fn set_cmd(&mut self, cmd: impl Into<String>) {
        self.cmd = Some(cmd.into());
    }

    pub fn become_cmd(&self) -> Option<&str> {
        self.become_cmd.as_deref()
    }

    pub fn set_become_cmd(&mut self, cmd: impl Into<String>) {
        self.become_cmd = Some(cmd.into());
    }

    pub fn shell(&self) -> bool {
        self.shell
    }

    pub fn set_shell(&mut self, shell: bool) {
        self.shell = shell;
    }

    pub fn shell_executable(&self) -> Option<&str> {
        self.shell_executable.as_deref()
    }

    pub fn set_shell_executable(&mut self, path: impl Into<String>) {
        self.shell_executable = Some(path.into());
    }

    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn set_timeout(&mut self, seconds: u64) {
        self.timeout = Some(seconds);
    }

    pub fn run_time(&self) -> u64 {
        self.run_time
    }

    pub fn set_run_time(&mut self, seconds: u64) {
        self.run_time = seconds;
    }

    pub fn pipe_stdout(&self) -> Option<&str> {
        self.pipe_stdout.as_deref()
    }

    pub fn set_pipe_stdout(&mut self, path: impl Into<String>) {
        self.pipe_stdout = Some(path.into());
    }

    pub fn pipe_stderr(&self) -> Option<&str> {
        self.pipe_stderr.as_deref()
    }

    pub fn set_pipe_stderr(&mut self, path: impl Into<String>) {
        self.pipe_stderr = Some(path.into());
    }

    pub fn debug_stdout(&self) -> bool {
        self.debug_stdout
    }

    pub fn set_debug_stdout(&mut self, value: bool) {
        self.debug_stdout = value;
    }

    pub fn debug_stderr(&self) -> bool {
        self.debug_stderr
    }

    pub fn set_debug_stderr(&mut self, value: bool) {
        self.debug_stderr = value;
    }

    pub fn raise_error(&self) -> bool {
        self.raise_error
    }

    pub fn set_raise_error(&mut self, value: bool) {
        self.raise_error = value;
    }

    pub fn cgroups(&self) -> &[String] {
        &self.cgroups
    }

    pub fn set_cgroups(&mut self, cgroups: Vec<String>) {
        self.cgroups = cgroups;
    }
}

impl Entity for EntityCommand {
    fn kind_label(&self) -> &'static str {
        "Command"
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn long_name(&self) -> String {
        let prefix = match &self.parent {
            Some(CommandParent::Plan(p)) => p.upgrade().map(|p| p.read().unwrap().long_name()),
            Some(CommandParent::Suite(p)) => p.upgrade().map(|p| p.read().unwrap().long_name()),
            Some(CommandParent::Case(p)) => p.upgrade().map(|p| p.read().unwrap().long_name()),
            None => None,
        };
        match prefix {
            Some(prefix) => format!("{prefix} > {}", self.short_name()),
            None => self.short_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::plan::EntityPlan;
    use crate::entity::suite::EntitySuite;

    #[test]
    fn init_defaults() {
        let command = EntityCommand::default();
        assert!(command.cmd.is_none());
        assert!(command.become_cmd.is_none());
        assert!(!command.shell);
        assert!(command.shell_executable.is_none());
        assert!(command.timeout.is_none());
        assert!(command.pipe_stdout.is_none());
        assert!(command.pipe_stderr.is_none());
        assert!(!command.debug_stdout);
        assert!(!command.debug_stderr);
        assert!(command.cgroups.is_empty());
    }

    #[test]
    fn properties_roundtrip() {
        let mut command = EntityCommand::default();
        command.set_cmd("echo test");
        assert_eq!(command.cmd(), Some("echo test"));

        command.set_become_cmd("sudo -i");
        assert_eq!(command.become_cmd(), Some("sudo -i"));

        command.set_shell(true);
        assert!(command.shell());

        command.set_shell_executable("/bin/bash");
        assert_eq!(command.shell_executable(), Some("/bin/bash"));

        command.set_timeout(30);
        assert_eq!(command.timeout(), Some(30));

        command.set_pipe_stdout("/path/to/stdout.log");
        assert_eq!(command.pipe_stdout(), Some("/path/to/stdout.log"));

        command.set_pipe_stderr("/path/to/stderr.log");
        assert_eq!(command.pipe_stderr(), Some("/path/to/stderr.log"));

        command.set_debug_stdout(true);
        assert!(command.debug_stdout());

        command.set_debug_stderr(true);
        assert!(command.debug_stderr());

        command.set_cgroups(vec!["cpu".into(), "memory".into()]);
        assert_eq!(command.cgroups(), ["cpu".to_string(), "memory".to_string()]);
    }

    #[test]
    fn dir_name() {
        let mut command = EntityCommand::default();
        command.set_name("testcmd").unwrap();
        assert_eq!(command.dir_name(), "command_testcmd");
    }

    #[test]
    fn log_name_walks_full_hierarchy() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("testplan").unwrap();

        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("testsuite").unwrap();
        EntityPlan::add_suite(&plan, suite.clone());

        let case = EntityCase::new();
        case.write().unwrap().set_name("testcase").unwrap();
        EntitySuite::add_case(&suite, case.clone());

        let command = EntityCommand::new();
        command.write().unwrap().set_name("testcmd").unwrap();
        EntityCase::add_command(&case, command.clone());

        assert_eq!(command.read().unwrap().short_name(), "Command[testcmd]");
        assert_eq!(
            command.read().unwrap().long_name(),
            "Plan[testplan] > Suite[testsuite] > Case[testcase] > Command[testcmd]"
        );
    }
}
