//! JSON plan loading: `main.rs`'s own glue from a file on disk to an
//! [`EntityPlan`] tree, not part of the library's declared scope. §1 puts
//! "YAML loading and schema validation" out of bounds for this crate — the
//! binary still has to get *some* document off disk to build a tree from,
//! so it carries a minimal `serde_json`-based shape rather than reaching
//! for a YAML parser the core library has no other use for.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::controller::{ControllerFactory, ControllerGroup, LimitValue};
use crate::entity::case::EntityCase;
use crate::entity::command::EntityCommand;
use crate::entity::plan::EntityPlan;
use crate::entity::suite::EntitySuite;
use crate::entity::{CollectorConfig, EntityConfig};
use crate::error::OrchestratorError;

#[derive(Debug, Deserialize)]
pub struct PlanDoc {
    pub name: String,
    #[serde(default)]
    pub config: EntityConfig,
    #[serde(default)]
    pub pre: Vec<CommandDoc>,
    #[serde(default)]
    pub post: Vec<CommandDoc>,
    #[serde(default)]
    pub cgroups: Vec<CgroupDoc>,
    #[serde(default)]
    pub collectors: Vec<CollectorConfig>,
    #[serde(default)]
    pub suites: Vec<SuiteDoc>,
}

#[derive(Debug, Deserialize)]
pub struct SuiteDoc {
    pub name: String,
    #[serde(default)]
    pub config: EntityConfig,
    #[serde(default)]
    pub pre: Vec<CommandDoc>,
    #[serde(default)]
    pub post: Vec<CommandDoc>,
    #[serde(default)]
    pub cases: Vec<CaseDoc>,
}

#[derive(Debug, Deserialize)]
pub struct CaseDoc {
    pub name: String,
    #[serde(default)]
    pub config: EntityConfig,
    #[serde(default)]
    pub pre: Vec<CommandDoc>,
    #[serde(default)]
    pub post: Vec<CommandDoc>,
    #[serde(default)]
    pub commands: Vec<CommandDoc>,
}

#[derive(Debug, Deserialize)]
pub struct CommandDoc {
    pub name: String,
    pub cmd: String,
    #[serde(default)]
    pub become_cmd: Option<String>,
    #[serde(default)]
    pub shell: bool,
    #[serde(default)]
    pub shell_executable: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub run_time: u64,
    #[serde(default)]
    pub pipe_stdout: Option<String>,
    #[serde(default)]
    pub pipe_stderr: Option<String>,
    #[serde(default)]
    pub debug_stdout: bool,
    #[serde(default)]
    pub debug_stderr: bool,
    #[serde(default = "default_true")]
    pub raise_error: bool,
    #[serde(default)]
    pub cgroups: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CgroupDoc {
    pub name: String,
    #[serde(default)]
    pub become_cmd: Option<String>,
    #[serde(default)]
    pub controllers: Vec<ControllerDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ControllerDoc {
    pub name: String,
    #[serde(default)]
    pub limits: HashMap<String, LimitDoc>,
    /// Overrides the controller type's default stat files (§3, §4.6) when
    /// present; otherwise [`ControllerFactory::instance`]'s defaults apply.
    #[serde(default)]
    pub stat_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LimitDoc {
    Int(i64),
    Str(String),
}

impl From<LimitDoc> for LimitValue {
    fn from(value: LimitDoc) -> Self {
        match value {
            LimitDoc::Int(v) => LimitValue::Int(v),
            LimitDoc::Str(v) => LimitValue::Str(v),
        }
    }
}

/// Parses `path` as a [`PlanDoc`] and builds it into a live `EntityPlan`
/// tree, wiring every parent back-link through the usual `add_*`
/// constructors so the resulting tree is indistinguishable from one built
/// by hand.
pub fn load_plan(path: &Path) -> Result<std::sync::Arc<std::sync::RwLock<EntityPlan>>, OrchestratorError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OrchestratorError::config(format!("failed to read plan file {}: {e}", path.display())))?;
    let doc: PlanDoc = serde_json::from_str(&text)
        .map_err(|e| OrchestratorError::config(format!("failed to parse plan file {}: {e}", path.display())))?;
    build_plan(doc)
}

fn build_command(doc: CommandDoc) -> Result<std::sync::Arc<std::sync::RwLock<EntityCommand>>, OrchestratorError> {
    let command = EntityCommand::new();
    {
        let mut c = command.write().unwrap();
        c.set_name(doc.name)?;
        c.set_cmd(doc.cmd);
        if let Some(become_cmd) = doc.become_cmd {
            c.set_become_cmd(become_cmd);
        }
        c.set_shell(doc.shell);
        if let Some(shell_executable) = doc.shell_executable {
            c.set_shell_executable(shell_executable);
        }
        if let Some(timeout) = doc.timeout {
            c.set_timeout(timeout);
        }
        c.set_run_time(doc.run_time);
        if let Some(pipe_stdout) = doc.pipe_stdout {
            c.set_pipe_stdout(pipe_stdout);
        }
        if let Some(pipe_stderr) = doc.pipe_stderr {
            c.set_pipe_stderr(pipe_stderr);
        }
        c.set_debug_stdout(doc.debug_stdout);
        c.set_debug_stderr(doc.debug_stderr);
        c.set_raise_error(doc.raise_error);
        c.set_cgroups(doc.cgroups);
    }
    Ok(command)
}

fn build_cgroup(doc: CgroupDoc) -> Result<ControllerGroup, OrchestratorError> {
    let mut group = ControllerGroup::new(doc.name);
    if let Some(become_cmd) = doc.become_cmd {
        group.set_become_cmd(become_cmd);
    }
    let mut controllers = Vec::with_capacity(doc.controllers.len());
    for c in doc.controllers {
        let mut controller = ControllerFactory::instance(&c.name)?;
        controller.set_limits(c.limits.into_iter().map(|(k, v)| (k, v.into())).collect());
        if !c.stat_files.is_empty() {
            controller.set_stat_files(c.stat_files);
        }
        controllers.push(controller);
    }
    group.set_controllers(controllers);
    Ok(group)
}

fn build_plan(doc: PlanDoc) -> Result<std::sync::Arc<std::sync::RwLock<EntityPlan>>, OrchestratorError> {
    let plan = EntityPlan::new();
    {
        let mut p = plan.write().unwrap();
        p.set_name(doc.name)?;
        *p.config_mut() = doc.config;
        let cgroups = doc.cgroups.into_iter().map(build_cgroup).collect::<Result<Vec<_>, _>>()?;
        p.set_cgroups(cgroups);
        p.set_collectors(doc.collectors);
    }
    for pre in doc.pre {
        EntityPlan::add_pre(&plan, build_command(pre)?);
    }
    for post in doc.post {
        EntityPlan::add_post(&plan, build_command(post)?);
    }
    for suite in doc.suites {
        EntityPlan::add_suite(&plan, build_suite(suite)?);
    }
    Ok(plan)
}

fn build_suite(doc: SuiteDoc) -> Result<std::sync::Arc<std::sync::RwLock<EntitySuite>>, OrchestratorError> {
    let suite = EntitySuite::new();
    {
        let mut s = suite.write().unwrap();
        s.set_name(doc.name)?;
        *s.config_mut() = doc.config;
    }
    for pre in doc.pre {
        EntitySuite::add_pre(&suite, build_command(pre)?);
    }
    for post in doc.post {
        EntitySuite::add_post(&suite, build_command(post)?);
    }
    for case in doc.cases {
        EntitySuite::add_case(&suite, build_case(case)?);
    }
    Ok(suite)
}

fn build_case(doc: CaseDoc) -> Result<std::sync::Arc<std::sync::RwLock<EntityCase>>, OrchestratorError> {
    let case = EntityCase::new();
    {
        let mut c = case.write().unwrap();
        c.set_name(doc.name)?;
        *c.config_mut() = doc.config;
    }
    for pre in doc.pre {
        EntityCase::add_pre(&case, build_command(pre)?);
    }
    for post in doc.post {
        EntityCase::add_post(&case, build_command(post)?);
    }
    for command in doc.commands {
        EntityCase::add_command(&case, build_command(command)?);
    }
    Ok(case)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_minimal_single_command_plan() {
        let json = r#"{
            "name": "demo",
            "suites": [{
                "name": "s1",
                "cases": [{
                    "name": "c1",
                    "commands": [{"name": "echo", "cmd": "echo hi", "shell": false}]
                }]
            }]
        }"#;
        let doc: PlanDoc = serde_json::from_str(json).unwrap();
        let plan = build_plan(doc).unwrap();
        let plan = plan.read().unwrap();
        assert_eq!(plan.suites().len(), 1);
        let suite = plan.suites()[0].read().unwrap();
        assert_eq!(suite.cases().len(), 1);
        let case = suite.cases()[0].read().unwrap();
        assert_eq!(case.commands().len(), 1);
        assert_eq!(case.commands()[0].read().unwrap().cmd(), Some("echo hi"));
    }

    #[test]
    fn builds_cgroups_and_collectors() {
        let json = r#"{
            "name": "demo",
            "cgroups": [{
                "name": "cg1",
                "controllers": [{"name": "cpu", "limits": {"weight": 100}}]
            }],
            "collectors": [{"engine": "process", "name": "c", "cmd": "true"}]
        }"#;
        let doc: PlanDoc = serde_json::from_str(json).unwrap();
        let plan = build_plan(doc).unwrap();
        let plan = plan.read().unwrap();
        assert_eq!(plan.cgroups().len(), 1);
        assert_eq!(plan.cgroups()[0].controllers()[0].limits()[0].0, "weight");
        assert_eq!(plan.collectors().len(), 1);
        // ControllerFactory seeds the type's default stat files even
        // though the doc never named them (§4.6).
        assert!(plan.cgroups()[0].controllers()[0].stat_files().contains(&"cpu.stat".to_string()));
    }

    #[test]
    fn cgroup_doc_can_override_default_stat_files() {
        let json = r#"{
            "name": "demo",
            "cgroups": [{
                "name": "cg1",
                "controllers": [{"name": "memory", "stat_files": ["memory.stat"]}]
            }]
        }"#;
        let doc: PlanDoc = serde_json::from_str(json).unwrap();
        let plan = build_plan(doc).unwrap();
        let plan = plan.read().unwrap();
        assert_eq!(plan.cgroups()[0].controllers()[0].stat_files(), ["memory.stat".to_string()]);
    }

    #[test]
    fn rejects_unknown_controller_type() {
        let json = r#"{
            "name": "demo",
            "cgroups": [{"name": "cg1", "controllers": [{"name": "bogus"}]}]
        }"#;
        let doc: PlanDoc = serde_json::from_str(json).unwrap();
        let err = build_plan(doc).unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[test]
    fn rejects_invalid_entity_names() {
        let json = r#"{"name": "bad name"}"#;
        let doc: PlanDoc = serde_json::from_str(json).unwrap();
        assert!(build_plan(doc).is_err());
    }
}
