//! The synchronous executor tree (§4.1-§4.5): the nested composition of
//! Controlling/Replicating/Collecting/Concurrent/Iterating/Parallel/Process
//! executors that walks the entity tree and actually runs commands.
//!
//! Generalizes the teacher's `#[async_trait] Executor` contract down to a
//! single synchronous `execute` call: this crate drives subprocesses from
//! blocking `std::process::Child`s and OS worker threads (`src/process.rs`,
//! `src/thread.rs`) rather than a tokio runtime, so there is no
//! `prepare`/`cleanup`/`checkpoint` split to preserve.
//!
//! Every kind collapses onto the single [`ExecutorContext`] frame type in
//! [`context`] the same way the six near-identical context subclasses
//! collapsed into one struct: what varies between `ControllingExecutor`,
//! `ReplicatingExecutor`, etc. is which [`EntityNode`] fields it reads and
//! whether it fans out, not the frame machinery itself.

pub mod context;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::warn;

use crate::context::RunContext;
use crate::entity::command::EntityCommand;
use crate::entity::config::IterationType;
use crate::entity::CollectorConfig;
use crate::error::OrchestratorError;
use crate::plugin::PluginRegistry;
use crate::process::Process;
use crate::stat::Stat;
use crate::thread::Thread;

use self::context::{EntityNode, ExecutorContext};

/// Every node of the executor tree implements this one method (§4.2
/// "Every executor implements execute(parent_ctx)"). Only
/// [`ReplicatingExecutor`] actually runs pre/post hooks; every other kind
/// is a pure structural wrapper around its child (see [`run_hooks`]).
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError>;
}

/// Wraps a command's attached cgroups, then privilege escalation, then
/// resolves placeholders, then drives one subprocess to completion (§4.5
/// "Command materialization"). Shared by every leaf call site: regular
/// commands via [`ProcessExecutor`], cgroup builders/destroyers via
/// [`ControllingExecutor`], and pre/post hooks via [`run_hooks`].
pub(crate) fn run_single_command(
    run: &Arc<RunContext>,
    ctx: &ExecutorContext,
    entity: &EntityNode,
    command: &EntityCommand,
) -> Result<(), OrchestratorError> {
    let mut materialized = command.clone();

    let mut cmd = command.cmd().unwrap_or_default().to_string();
    for name in command.cgroups() {
        if let Some(group) = run.cgroup(name) {
            cmd = format!("cgexec -g {} {cmd}", group.cgexec_spec());
        }
    }
    if let Some(become_cmd) = command.become_cmd() {
        cmd = format!("{become_cmd} {cmd}");
    }
    cmd = run.substitute(&cmd, ctx, entity)?;
    materialized.set_cmd(cmd);

    if let Some(path) = command.pipe_stdout() {
        materialized.set_pipe_stdout(run.substitute(path, ctx, entity)?);
    }
    if let Some(path) = command.pipe_stderr() {
        materialized.set_pipe_stderr(run.substitute(path, ctx, entity)?);
    }

    let mut process = Process::new(run.clone());
    process.set_command(materialized);
    process.run()
}

/// Runs an entity's hook list through [`run_single_command`] in
/// declaration order, stopping at the first failure.
fn run_hooks(
    run: &Arc<RunContext>,
    ctx: &ExecutorContext,
    entity: &EntityNode,
    hooks: &[Arc<RwLock<EntityCommand>>],
) -> Result<(), OrchestratorError> {
    for hook in hooks {
        let command = hook.read().unwrap().clone();
        run_single_command(run, ctx, entity, &command)?;
    }
    Ok(())
}

/// Builds the plan's cgroups before the child runs and tears them down
/// after, regardless of outcome (§4.5 "Controlling"). Destroyer failures
/// are logged, not propagated — a broken teardown must not mask a
/// successful run.
pub struct ControllingExecutor {
    entity: EntityNode,
    child: Arc<dyn Executor>,
}

impl ControllingExecutor {
    pub fn new(entity: EntityNode, child: Arc<dyn Executor>) -> Self {
        Self { entity, child }
    }
}

impl Executor for ControllingExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let mut ctx = ExecutorContext::controlling(parent_ctx);
        ctx.set_entity(self.entity.clone());
        ctx.set_current(1);
        let ctx = Arc::new(ctx);

        let cgroups = self.entity.cgroups();
        for group in &cgroups {
            for command in group.builders() {
                let command = command.read().unwrap().clone();
                run_single_command(run, &ctx, &self.entity, &command)?;
            }
        }

        let result = self.child.execute(run, Some(ctx.clone()));

        for group in &cgroups {
            for command in group.destroyers() {
                let command = command.read().unwrap().clone();
                if let Err(e) = run_single_command(run, &ctx, &self.entity, &command) {
                    warn!(error = %e, cgroup = group.name(), "cgroup destroyer failed");
                }
            }
        }

        result
    }
}

/// Starts every configured collector before the child runs and stops
/// them all afterward, best-effort (§4.6): a collector that fails to
/// start or stop cleanly is logged, not fatal to the run. Exposes the
/// plan's active cgroup list to collectors via the Collecting frame's
/// `cgroups` payload so a `cgroup_stat` collector can resolve which
/// cgroups to sample without being bound to a fixed list at build time.
pub struct CollectingExecutor {
    entity: EntityNode,
    configs: Vec<CollectorConfig>,
    cgroups: Vec<crate::controller::group::ControllerGroup>,
    child: Arc<dyn Executor>,
}

impl CollectingExecutor {
    pub fn new(
        entity: EntityNode,
        configs: Vec<CollectorConfig>,
        cgroups: Vec<crate::controller::group::ControllerGroup>,
        child: Arc<dyn Executor>,
    ) -> Self {
        Self { entity, configs, cgroups, child }
    }
}

impl Executor for CollectingExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let mut ctx = ExecutorContext::collecting(parent_ctx);
        ctx.set_entity(self.entity.clone());
        ctx.set_current(1);
        ctx.set_cgroups(self.cgroups.clone());
        let ctx = Arc::new(ctx);

        let registry = PluginRegistry::new();
        let mut collectors = Vec::new();
        for config in &self.configs {
            match registry.build_collector(config) {
                Ok(collector) => collectors.push(collector),
                Err(e) => warn!(error = %e, collector = %config.name, "failed to build collector"),
            }
        }
        for collector in &collectors {
            if let Err(e) = collector.start(run, &ctx) {
                warn!(error = %e, collector = collector.name(), "collector failed to start");
            }
        }

        let result = self.child.execute(run, Some(ctx.clone()));

        for collector in &collectors {
            if let Err(e) = collector.stop(run) {
                warn!(error = %e, collector = collector.name(), "collector failed to stop cleanly");
            }
        }

        result
    }
}

/// Runs its child `replication` times, each pass wrapped in the owning
/// entity's pre/post hooks and a [`Stat`] timer logged to that pass's
/// output directory (§4.3 "Replicating"). The only executor kind that
/// actually fires hooks — every other kind is a structural pass-through —
/// so a command's pre/post never double-fires across nested wrappers.
pub struct ReplicatingExecutor {
    entity: EntityNode,
    child: Arc<dyn Executor>,
}

impl ReplicatingExecutor {
    pub fn new(entity: EntityNode, child: Arc<dyn Executor>) -> Self {
        Self { entity, child }
    }
}

impl Executor for ReplicatingExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let passes = self.entity.config().map(|c| c.replication).unwrap_or(1).max(1);
        let pre = self.entity.pre();
        let post = self.entity.post();

        for pass in 1..=passes {
            let mut ctx = ExecutorContext::replicating(parent_ctx.clone());
            ctx.set_entity(self.entity.clone());
            ctx.set_current(pass);
            let ctx = Arc::new(ctx);

            run_hooks(run, &ctx, &self.entity, &pre)?;

            let mut stat = Stat::new();
            stat.start()?;
            let result = self.child.execute(run, Some(ctx.clone()));
            stat.stop()?;
            let path = run.ensure_path(&ctx)?;
            stat.log(path.to_str().unwrap_or("."))?;
            result?;

            run_hooks(run, &ctx, &self.entity, &post)?;
        }
        Ok(())
    }
}

/// Expands the entity's declared iteration axes into a sequence of
/// bindings — PRODUCT (cartesian, first axis varies slowest) or ZIP
/// (element-wise, truncated to the shortest axis) — and runs the child
/// once per binding, each under a fresh Iterating frame (§4.3
/// "Iterating").
pub struct IteratingExecutor {
    entity: EntityNode,
    child: Arc<dyn Executor>,
}

impl IteratingExecutor {
    pub fn new(entity: EntityNode, child: Arc<dyn Executor>) -> Self {
        Self { entity, child }
    }

    fn bindings(&self) -> Vec<HashMap<String, String>> {
        let axes = self.entity.iter_axes();
        if axes.is_empty() {
            return vec![HashMap::new()];
        }
        let iteration = self.entity.config().map(|c| c.iteration).unwrap_or(IterationType::Product);
        match iteration {
            IterationType::Product => {
                let mut result = vec![HashMap::new()];
                for (key, values) in &axes {
                    let mut next = Vec::with_capacity(result.len() * values.len());
                    for binding in &result {
                        for value in values {
                            let mut extended = binding.clone();
                            extended.insert(key.clone(), value.clone());
                            next.push(extended);
                        }
                    }
                    result = next;
                }
                result
            }
            IterationType::Zip => {
                let len = axes.iter().map(|(_, v)| v.len()).min().unwrap_or(0);
                (0..len)
                    .map(|i| axes.iter().map(|(k, v)| (k.clone(), v[i].clone())).collect())
                    .collect()
            }
        }
    }
}

impl Executor for IteratingExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        for (i, binding) in self.bindings().into_iter().enumerate() {
            let mut ctx = ExecutorContext::iterating(parent_ctx.clone());
            ctx.set_entity(self.entity.clone());
            ctx.set_current(i as u32 + 1);
            ctx.set_iters(binding);
            self.child.execute(run, Some(Arc::new(ctx)))?;
        }
        Ok(())
    }
}

/// Fans out over one child per case (§4.3 "Concurrent"): on separate
/// threads when the suite's `concurrency` flag is set, sequentially
/// (sharing `current = 1`, per §4.1) otherwise. Always present in the
/// tree at suite level; its own `entity.config().concurrency` decides
/// which mode it runs in.
pub struct ConcurrentExecutor {
    entity: EntityNode,
    children: Vec<Arc<dyn Executor>>,
}

impl ConcurrentExecutor {
    pub fn new(entity: EntityNode, children: Vec<Arc<dyn Executor>>) -> Self {
        Self { entity, children }
    }
}

impl Executor for ConcurrentExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let concurrency = self.entity.config().map(|c| c.concurrency).unwrap_or(false);

        if !concurrency {
            for child in &self.children {
                let mut ctx = ExecutorContext::concurrent(parent_ctx.clone());
                ctx.set_entity(self.entity.clone());
                ctx.set_current(1);
                child.execute(run, Some(Arc::new(ctx)))?;
            }
            return Ok(());
        }

        let mut workers = Vec::with_capacity(self.children.len());
        for (i, child) in self.children.iter().cloned().enumerate() {
            let mut ctx = ExecutorContext::concurrent(parent_ctx.clone());
            ctx.set_entity(self.entity.clone());
            ctx.set_current(i as u32 + 1);
            let ctx = Arc::new(ctx);

            let slot: Arc<Mutex<Option<Result<(), OrchestratorError>>>> = Arc::new(Mutex::new(None));
            let mut thread = Thread::new(run.clone());
            let thread_run = run.clone();
            let thread_slot = slot.clone();
            thread.run(Box::new(move || {
                let result = child.execute(&thread_run, Some(ctx));
                *thread_slot.lock().unwrap() = Some(result);
            }));
            workers.push((thread, slot));
        }

        let mut first_err = None;
        for (mut thread, slot) in workers {
            if let Err(e) = thread.join() {
                first_err.get_or_insert(e);
                continue;
            }
            if let Some(Err(e)) = slot.lock().unwrap().take() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Spawns `config.parallelism` copies of a single child subtree covering
/// all of a case's commands (§4.3 "Parallel"). Runs the child inline when
/// `parallelism <= 1`; otherwise one thread per copy, each bound to a
/// fresh Parallel frame with its own `current`. The child is an
/// `Arc<dyn Executor>` rather than a clone — `Executor::execute` takes
/// `&self`, so independent mutable state lives in each thread's own
/// `ExecutorContext` chain, not in the executor object itself (§9
/// "shallow copies").
pub struct ParallelExecutor {
    entity: EntityNode,
    child: Arc<dyn Executor>,
}

impl ParallelExecutor {
    pub fn new(entity: EntityNode, child: Arc<dyn Executor>) -> Self {
        Self { entity, child }
    }
}

impl Executor for ParallelExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let parallelism = self.entity.config().map(|c| c.parallelism).unwrap_or(1).max(1);

        if parallelism <= 1 {
            let mut ctx = ExecutorContext::parallel(parent_ctx);
            ctx.set_entity(self.entity.clone());
            ctx.set_current(1);
            return self.child.execute(run, Some(Arc::new(ctx)));
        }

        let mut handles = Vec::with_capacity(parallelism as usize);
        for i in 1..=parallelism {
            let mut ctx = ExecutorContext::parallel(parent_ctx.clone());
            ctx.set_entity(self.entity.clone());
            ctx.set_current(i);
            let ctx = Arc::new(ctx);
            let child = self.child.clone();
            let run = run.clone();
            handles.push(std::thread::spawn(move || child.execute(&run, Some(ctx))));
        }

        let mut first_err = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(_) => {
                    first_err.get_or_insert(OrchestratorError::internal("parallel worker thread panicked"));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Leaf of the tree: materializes and runs one [`EntityCommand`] (§4.5
/// "Process"). Does not push its own `ExecutorContext` frame — the
/// output directory layout (§6) has no `command_<name>` segment, so a
/// command's stdout/pipe artifacts land directly in its parent Parallel
/// frame's directory. `{m:entity:command}`/`{m:param:...}` placeholders
/// still resolve correctly since the command's own `EntityNode` is
/// passed explicitly to `RunContext::substitute` regardless of which
/// frame is active.
pub struct ProcessExecutor {
    command: Arc<RwLock<EntityCommand>>,
}

impl ProcessExecutor {
    pub fn new(command: Arc<RwLock<EntityCommand>>) -> Self {
        Self { command }
    }
}

impl Executor for ProcessExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        let ctx = parent_ctx
            .ok_or_else(|| OrchestratorError::internal("ProcessExecutor requires a parent context"))?;
        let entity = EntityNode::Command(self.command.clone());
        let command = self.command.read().unwrap().clone();
        run_single_command(run, &ctx, &entity, &command)
    }
}

/// Runs a fixed list of children in declared order with no `current`
/// counter and no frame of its own (§4.2 "a plan's suites run in the
/// order they were declared"). Unlike [`ConcurrentExecutor`] this never
/// fans out — it exists purely so a plan with more than one suite has
/// somewhere to hang the ordering without inventing a new context-frame
/// kind for it.
pub struct SequenceExecutor {
    children: Vec<Arc<dyn Executor>>,
}

impl SequenceExecutor {
    pub fn new(children: Vec<Arc<dyn Executor>>) -> Self {
        Self { children }
    }
}

impl Executor for SequenceExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        for child in &self.children {
            child.execute(run, parent_ctx.clone())?;
        }
        Ok(())
    }
}

/// Runs a case's ordered command list sequentially as one unit — the
/// "single child command subtree" [`ParallelExecutor`] replicates across
/// its copies (§4.3).
pub struct CommandListExecutor {
    commands: Vec<Arc<RwLock<EntityCommand>>>,
}

impl CommandListExecutor {
    pub fn new(commands: Vec<Arc<RwLock<EntityCommand>>>) -> Self {
        Self { commands }
    }
}

impl Executor for CommandListExecutor {
    fn execute(
        &self,
        run: &Arc<RunContext>,
        parent_ctx: Option<Arc<ExecutorContext>>,
    ) -> Result<(), OrchestratorError> {
        for command in &self.commands {
            ProcessExecutor::new(command.clone()).execute(run, parent_ctx.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::case::EntityCase;
    use crate::entity::plan::EntityPlan;
    use crate::entity::suite::EntitySuite;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingExecutor(Arc<AtomicU32>);

    impl Executor for CountingExecutor {
        fn execute(
            &self,
            _run: &Arc<RunContext>,
            _parent_ctx: Option<Arc<ExecutorContext>>,
        ) -> Result<(), OrchestratorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn run_ctx() -> Arc<RunContext> {
        Arc::new(RunContext::for_test())
    }

    #[test]
    fn replicating_runs_child_replication_times_and_fires_hooks_once_per_pass() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("p").unwrap();
        plan.write().unwrap().config_mut().replication = 3;

        let pre = EntityCommand::new();
        pre.write().unwrap().set_name("pre").unwrap();
        pre.write().unwrap().set_cmd("true");
        pre.write().unwrap().set_shell(false);
        EntityPlan::add_pre(&plan, pre);

        let counter = Arc::new(AtomicU32::new(0));
        let executor = ReplicatingExecutor::new(EntityNode::Plan(plan), Arc::new(CountingExecutor(counter.clone())));

        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn iterating_expands_product_in_declared_order() {
        let case = EntityCase::new();
        case.write().unwrap().set_name("c").unwrap();
        case.write().unwrap().config_mut().iters = vec![
            ("a".to_string(), vec!["A".to_string(), "B".to_string()]),
            ("b".to_string(), vec!["C".to_string(), "D".to_string()]),
        ];

        let executor =
            IteratingExecutor::new(EntityNode::Case(case), Arc::new(CountingExecutor(Arc::new(AtomicU32::new(0)))));
        let bindings = executor.bindings();
        let pairs: Vec<(String, String)> =
            bindings.iter().map(|b| (b["a"].clone(), b["b"].clone())).collect();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "C".to_string()),
                ("A".to_string(), "D".to_string()),
                ("B".to_string(), "C".to_string()),
                ("B".to_string(), "D".to_string()),
            ]
        );
    }

    #[test]
    fn iterating_zip_truncates_to_shortest_axis() {
        let case = EntityCase::new();
        case.write().unwrap().set_name("c").unwrap();
        case.write().unwrap().config_mut().iteration = IterationType::Zip;
        case.write().unwrap().config_mut().iters = vec![
            ("a".to_string(), vec!["A".to_string(), "B".to_string(), "C".to_string()]),
            ("b".to_string(), vec!["X".to_string(), "Y".to_string()]),
        ];

        let executor =
            IteratingExecutor::new(EntityNode::Case(case), Arc::new(CountingExecutor(Arc::new(AtomicU32::new(0)))));
        assert_eq!(executor.bindings().len(), 2);
    }

    #[test]
    fn concurrent_sequential_mode_runs_every_child() {
        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("s").unwrap();

        let counter = Arc::new(AtomicU32::new(0));
        let children: Vec<Arc<dyn Executor>> = (0..3)
            .map(|_| Arc::new(CountingExecutor(counter.clone())) as Arc<dyn Executor>)
            .collect();
        let executor = ConcurrentExecutor::new(EntityNode::Suite(suite), children);
        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn concurrent_threaded_mode_runs_every_child() {
        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("s").unwrap();
        suite.write().unwrap().config_mut().concurrency = true;

        let counter = Arc::new(AtomicU32::new(0));
        let children: Vec<Arc<dyn Executor>> = (0..4)
            .map(|_| Arc::new(CountingExecutor(counter.clone())) as Arc<dyn Executor>)
            .collect();
        let executor = ConcurrentExecutor::new(EntityNode::Suite(suite), children);
        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn parallel_inline_when_parallelism_is_one() {
        let case = EntityCase::new();
        case.write().unwrap().set_name("c").unwrap();

        let counter = Arc::new(AtomicU32::new(0));
        let executor = ParallelExecutor::new(EntityNode::Case(case), Arc::new(CountingExecutor(counter.clone())));
        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parallel_threaded_runs_every_copy() {
        let case = EntityCase::new();
        case.write().unwrap().set_name("c").unwrap();
        case.write().unwrap().config_mut().parallelism = 5;

        let counter = Arc::new(AtomicU32::new(0));
        let executor = ParallelExecutor::new(EntityNode::Case(case), Arc::new(CountingExecutor(counter.clone())));
        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn controlling_aborts_run_when_a_builder_fails() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("p").unwrap();
        let mut group = crate::controller::group::ControllerGroup::new("test_group_mod");
        group.add_controller(crate::controller::Controller::cpu());
        plan.write().unwrap().set_cgroups(vec![group]);

        // cgcreate is not on PATH in the test sandbox; its failure must
        // abort before the child ever runs.
        let counter = Arc::new(AtomicU32::new(0));
        let executor = ControllingExecutor::new(EntityNode::Plan(plan), Arc::new(CountingExecutor(counter.clone())));
        let err = executor.execute(&run_ctx(), None).unwrap_err();
        assert!(matches!(err, OrchestratorError::Subprocess(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn controlling_runs_child_when_there_are_no_cgroups() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("p").unwrap();

        let counter = Arc::new(AtomicU32::new(0));
        let executor = ControllingExecutor::new(EntityNode::Plan(plan), Arc::new(CountingExecutor(counter.clone())));
        executor.execute(&run_ctx(), None).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn process_executor_requires_parent_context() {
        let command = EntityCommand::new();
        command.write().unwrap().set_name("cmd").unwrap();
        command.write().unwrap().set_cmd("true");
        let executor = ProcessExecutor::new(command);
        let err = executor.execute(&run_ctx(), None).unwrap_err();
        assert!(matches!(err, OrchestratorError::Internal(_)));
    }

    #[test]
    fn sequence_executor_runs_children_in_declared_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        struct Tagging(Arc<Mutex<Vec<u32>>>, u32);
        impl Executor for Tagging {
            fn execute(&self, _run: &Arc<RunContext>, _ctx: Option<Arc<ExecutorContext>>) -> Result<(), OrchestratorError> {
                self.0.lock().unwrap().push(self.1);
                Ok(())
            }
        }

        let children: Vec<Arc<dyn Executor>> =
            (0..3).map(|i| Arc::new(Tagging(order.clone(), i)) as Arc<dyn Executor>).collect();
        SequenceExecutor::new(children).execute(&run_ctx(), None).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn command_list_executor_runs_every_command_in_order() {
        let cmd1 = EntityCommand::new();
        cmd1.write().unwrap().set_name("cmd1").unwrap();
        cmd1.write().unwrap().set_cmd("true");
        cmd1.write().unwrap().set_shell(false);

        let cmd2 = EntityCommand::new();
        cmd2.write().unwrap().set_name("cmd2").unwrap();
        cmd2.write().unwrap().set_cmd("true");
        cmd2.write().unwrap().set_shell(false);

        let executor = CommandListExecutor::new(vec![cmd1, cmd2]);
        let ctx = Arc::new(ExecutorContext::parallel(None));
        executor.execute(&run_ctx(), Some(ctx)).unwrap();
    }
}
