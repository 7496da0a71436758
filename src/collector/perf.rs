use std::sync::{Arc, Mutex};

use crate::context::RunContext;
use crate::entity::command::EntityCommand;
use crate::entity::CollectorConfig;
use crate::error::OrchestratorError;
use crate::executor::context::ExecutorContext;
use crate::process::Process;

use super::Collector;

/// Which `perf` subcommand and output artifact name a [`CollectorPerf`]
/// instance builds (§4.6 "Perf event collectors").
enum PerfKind {
    Stat,
    Profile,
}

/// Builds a `perf stat record` / `perf record` invocation from the
/// collector config's events, grouping cgroup-scoped events into
/// `-e '{...}' -G <cgroup>` blocks and ungrouped events into a single
/// `-a -e '{...}'` system-wide block, then runs it as a long-lived
/// producer the same way [`super::process::CollectorProcess`] does.
pub struct CollectorPerf {
    name: String,
    kind: PerfKind,
    config: CollectorConfig,
    process: Mutex<Option<Process>>,
}

impl CollectorPerf {
    pub fn stat(config: CollectorConfig) -> Self {
        Self::new(PerfKind::Stat, config)
    }

    pub fn profile(config: CollectorConfig) -> Self {
        Self::new(PerfKind::Profile, config)
    }

    fn new(kind: PerfKind, config: CollectorConfig) -> Self {
        Self {
            name: config.name.clone(),
            kind,
            config,
            process: Mutex::new(None),
        }
    }

    fn build_cmd(&self) -> String {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        let mut system: Vec<&str> = Vec::new();

        for event in &self.config.events {
            match event.cgroup.as_deref() {
                Some(cgroup) => match groups.iter_mut().find(|(name, _)| *name == cgroup) {
                    Some((_, events)) => events.push(&event.name),
                    None => groups.push((cgroup, vec![&event.name])),
                },
                None => system.push(&event.name),
            }
        }

        let (subcmd, artifact) = match self.kind {
            PerfKind::Stat => ("perf stat record", "collector.perf_stat.data"),
            PerfKind::Profile => ("perf record", "collector.perf_profile.data"),
        };

        let mut parts = vec![format!("{subcmd} -o {{m:context:run_path}}/{artifact}")];
        parts.extend(self.config.custom.iter().cloned());
        for (cgroup, events) in &groups {
            parts.push(format!("-e '{{{}}}' -G {}", events.join(","), cgroup));
        }
        if !system.is_empty() {
            parts.push(format!("-a -e '{{{}}}'", system.join(",")));
        }
        parts.join(" ")
    }
}

impl Collector for CollectorPerf {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, run: &Arc<RunContext>, ctx: &Arc<ExecutorContext>) -> Result<(), OrchestratorError> {
        let entity = ctx
            .entity()
            .cloned()
            .ok_or_else(|| OrchestratorError::internal("collector frame carries no entity"))?;

        let template = self.build_cmd();
        let substituted = run.substitute(&template, ctx, &entity)?;

        let mut command = EntityCommand::default();
        command.set_cmd(substituted);
        command.set_shell(true);
        if let Some(become_cmd) = &self.config.become_cmd {
            command.set_become_cmd(become_cmd.clone());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CollectorEventConfig;

    fn sample_config() -> CollectorConfig {
        CollectorConfig {
            engine: "perf_stat".into(),
            name: "perf1".into(),
            events: vec![
                CollectorEventConfig { cgroup: Some("cg1".into()), name: "cpu-cycles".into() },
                CollectorEventConfig { cgroup: Some("cg1".into()), name: "instructions".into() },
                CollectorEventConfig { cgroup: None, name: "page-faults".into() },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn stat_command_groups_cgroup_and_system_events() {
        let collector = CollectorPerf::stat(sample_config());
        let cmd = collector.build_cmd();
        assert!(cmd.starts_with("perf stat record -o {m:context:run_path}/collector.perf_stat.data"));
        assert!(cmd.contains("-e '{cpu-cycles,instructions}' -G cg1"));
        assert!(cmd.contains("-a -e '{page-faults}'"));
    }

    #[test]
    fn profile_command_uses_perf_record() {
        let collector = CollectorPerf::profile(sample_config());
        let cmd = collector.build_cmd();
        assert!(cmd.starts_with("perf record -o {m:context:run_path}/collector.perf_profile.data"));
    }

    #[test]
    fn custom_args_are_preserved_in_order() {
        let mut config = sample_config();
        config.custom = vec!["--no-buffering".to_string()];
        let collector = CollectorPerf::stat(config);
        let cmd = collector.build_cmd();
        assert!(cmd.contains("perf_stat.data --no-buffering -e"));
    }
}
