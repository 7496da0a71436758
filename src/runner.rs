//! Builds the executor tree from an entity tree and drives it (§4.2), plus
//! the run-tree introspection `report()` feature. Holds its `RunContext`
//! the way the teacher's runtime constructors held their config — one
//! `Arc`-wrapped handle, with a small set of `build_*` methods doing the
//! actual tree assembly rather than one giant constructor.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};

use crate::entity::case::EntityCase;
use crate::entity::plan::EntityPlan;
use crate::entity::suite::EntitySuite;
use crate::error::OrchestratorError;
use crate::executor::context::EntityNode;
use crate::executor::{
    CollectingExecutor, CommandListExecutor, ConcurrentExecutor, ControllingExecutor, Executor,
    IteratingExecutor, ParallelExecutor, ReplicatingExecutor, SequenceExecutor,
};
use crate::context::RunContext;

/// Turns a list of plans into executor trees and runs each to completion
/// in turn (§4.2). Also answers `report()` queries over the run root's
/// artifact tree (§4.9 in the original test suite).
pub struct Runner {
    run: Arc<RunContext>,
}

impl Runner {
    pub fn new(run: Arc<RunContext>) -> Self {
        Self { run }
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.run
    }

    /// Builds and executes one `Ctl/R_plan/...` tree per plan, in
    /// declaration order. The first plan to fail aborts the remaining
    /// plans — there is no partial-run recovery at this level.
    pub fn run(&self, plans: &[Arc<RwLock<EntityPlan>>]) -> Result<(), OrchestratorError> {
        for plan in plans {
            self.build_plan(plan.clone()).execute(&self.run, None)?;
        }
        Ok(())
    }

    fn build_plan(&self, plan: Arc<RwLock<EntityPlan>>) -> Arc<dyn Executor> {
        let suites = plan.read().unwrap().suites().to_vec();
        let suite_children: Vec<Arc<dyn Executor>> =
            suites.into_iter().map(|s| self.build_suite(s)).collect();
        let sequence: Arc<dyn Executor> = Arc::new(SequenceExecutor::new(suite_children));
        let replicating: Arc<dyn Executor> =
            Arc::new(ReplicatingExecutor::new(EntityNode::Plan(plan.clone()), sequence));
        Arc::new(ControllingExecutor::new(EntityNode::Plan(plan), replicating))
    }

    fn build_suite(&self, suite: Arc<RwLock<EntitySuite>>) -> Arc<dyn Executor> {
        let concurrency = suite.read().unwrap().config().concurrency;
        let cases = suite.read().unwrap().cases().to_vec();
        let case_children: Vec<Arc<dyn Executor>> =
            cases.into_iter().map(|c| self.build_case(c, concurrency)).collect();

        let concurrent: Arc<dyn Executor> =
            Arc::new(ConcurrentExecutor::new(EntityNode::Suite(suite.clone()), case_children));

        // §4.2: telemetry attaches at suite level only when the suite runs
        // its cases concurrently — that whole region is one experiment.
        let body: Arc<dyn Executor> = if concurrency {
            let plan = suite.read().unwrap().parent();
            let (configs, cgroups) = plan_collectors_and_cgroups(plan.as_ref());
            Arc::new(CollectingExecutor::new(EntityNode::Suite(suite.clone()), configs, cgroups, concurrent))
        } else {
            concurrent
        };

        Arc::new(ReplicatingExecutor::new(EntityNode::Suite(suite), body))
    }

    fn build_case(&self, case: Arc<RwLock<EntityCase>>, suite_concurrency: bool) -> Arc<dyn Executor> {
        let commands = case.read().unwrap().commands().to_vec();
        let command_list: Arc<dyn Executor> = Arc::new(CommandListExecutor::new(commands));
        let parallel: Arc<dyn Executor> =
            Arc::new(ParallelExecutor::new(EntityNode::Case(case.clone()), command_list));

        // §4.2: otherwise each case is its own experiment, so telemetry
        // attaches here instead.
        let body: Arc<dyn Executor> = if !suite_concurrency {
            let plan = case.read().unwrap().parent().and_then(|s| s.read().unwrap().parent());
            let (configs, cgroups) = plan_collectors_and_cgroups(plan.as_ref());
            Arc::new(CollectingExecutor::new(EntityNode::Case(case.clone()), configs, cgroups, parallel))
        } else {
            parallel
        };

        let iterating: Arc<dyn Executor> = Arc::new(IteratingExecutor::new(EntityNode::Case(case.clone()), body));
        Arc::new(ReplicatingExecutor::new(EntityNode::Case(case), iterating))
    }

    /// Walks `<run_root>/**/*`, groups regular files by their name with
    /// the final extension stripped (`collector.perf_stat.data` and
    /// `collector.perf_stat.old` would share the `collector.perf_stat`
    /// bucket), and nests those buckets under the dot-prefix that
    /// precedes the first `.` (every artifact this crate writes is named
    /// `<prefix>.<rest>`, e.g. `collector.*` or `stat.*`).
    pub fn report(&self, files: bool) -> Result<Value, OrchestratorError> {
        let mut result = serde_json::Map::new();
        if files {
            result.insert("files".to_string(), json!({ "collector": self.file_groups()? }));
        }
        Ok(Value::Object(result))
    }

    fn file_groups(&self) -> Result<HashMap<String, Vec<String>>, OrchestratorError> {
        let pattern = format!("{}/**/*", self.run.run_root().display());
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        let entries = glob::glob(&pattern)
            .map_err(|e| OrchestratorError::internal(format!("invalid report glob pattern: {e}")))?;
        for entry in entries {
            let path = entry
                .map_err(|e| OrchestratorError::internal(format!("failed to read run tree entry: {e}")))?;
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let stem = match name.rsplit_once('.') {
                Some((base, _ext)) => base.to_string(),
                None => name.to_string(),
            };
            groups.entry(stem).or_default().push(path.display().to_string());
        }
        Ok(groups)
    }
}

fn plan_collectors_and_cgroups(
    plan: Option<&Arc<RwLock<EntityPlan>>>,
) -> (Vec<crate::entity::CollectorConfig>, Vec<crate::controller::group::ControllerGroup>) {
    match plan {
        Some(plan) => {
            let plan = plan.read().unwrap();
            (plan.collectors().to_vec(), plan.cgroups().to_vec())
        }
        None => (Vec::new(), Vec::new()),
    }
}
