use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::context::RunContext;
use crate::controller::group::ControllerGroup;
use crate::error::OrchestratorError;
use crate::executor::context::ExecutorContext;

use super::stat_parser::parse_stat_file;
use super::{singleton, Collector};

const CGROUP_SYSFS_ROOT: &str = "/sys/fs/cgroup";

/// Periodic worker thread that scrapes each attached (cgroup, controller,
/// stat_file) triple on an interval (§4.6 "Cgroup-stat collector").
/// Falls back to whatever [`ExecutorContext::cgroups`] exposes on its
/// Collecting frame when the collector itself was not pre-bound to a
/// fixed cgroup list.
pub struct CollectorControllerGroup {
    name: String,
    cgroups: Vec<ControllerGroup>,
    ramp: u64,
    interval: u64,
    join_flag: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CollectorControllerGroup {
    pub fn new(name: impl Into<String>, cgroups: Vec<ControllerGroup>, ramp: u64, interval: u64) -> Self {
        Self {
            name: name.into(),
            cgroups,
            ramp,
            interval,
            join_flag: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    fn sample_once(run_path: &Path, cgroups: &[ControllerGroup]) -> Result<(), OrchestratorError> {
        let timestamp = Utc::now().to_rfc3339();
        for cgroup in cgroups {
            for controller in cgroup.controllers() {
                for stat_file in controller.stat_files() {
                    let source = PathBuf::from(CGROUP_SYSFS_ROOT).join(cgroup.name()).join(stat_file);
                    let contents = match std::fs::read_to_string(&source) {
                        Ok(contents) => contents,
                        Err(e) => {
                            warn!(path = %source.display(), error = %e, "failed to read cgroup stat file");
                            continue;
                        }
                    };
                    let (headers, values) = parse_stat_file(&contents)?;

                    let out_path = run_path.join(format!(
                        "collector.cgroup_{}_{}.log",
                        cgroup.name(),
                        controller.name()
                    ));
                    let handle = singleton::writer_for(&out_path)?;
                    let mut file = handle.lock().unwrap();
                    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
                        let mut header_row = vec!["timestamp".to_string()];
                        header_row.extend(headers);
                        writeln!(file, "{}", header_row.join("\t")).map_err(|e| {
                            OrchestratorError::internal(format!("failed to write stat header: {e}"))
                        })?;
                    }
                    let mut row = vec![timestamp.clone()];
                    row.extend(values);
                    writeln!(file, "{}", row.join("\t"))
                        .map_err(|e| OrchestratorError::internal(format!("failed to write stat row: {e}")))?;
                    file.flush()
                        .map_err(|e| OrchestratorError::internal(format!("failed to flush stat file: {e}")))?;
                }
            }
        }
        Ok(())
    }
}

impl Collector for CollectorControllerGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, run: &Arc<RunContext>, ctx: &Arc<ExecutorContext>) -> Result<(), OrchestratorError> {
        let run_path = run.ensure_path(ctx)?;
        let cgroups = ctx.cgroups().map(|c| c.to_vec()).unwrap_or_else(|| self.cgroups.clone());
        let ramp = self.ramp;
        let interval = self.interval.max(1);
        let join_flag = self.join_flag.clone();
        join_flag.store(false, Ordering::SeqCst);

        let handle = std::thread::spawn(move || {
            if ramp > 0 {
                std::thread::sleep(Duration::from_secs(ramp));
            }
            loop {
                if join_flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = Self::sample_once(&run_path, &cgroups) {
                    warn!(error = %e, "cgroup stat sample failed");
                }
                for _ in 0..interval {
                    if join_flag.load(Ordering::SeqCst) {
                        break;
                    }
                    std::thread::sleep(Duration::from_secs(1));
                }
            }
        });
        *self.handle.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn stop(&self, _run: &Arc<RunContext>) -> Result<(), OrchestratorError> {
        self.join_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle
                .join()
                .map_err(|_| OrchestratorError::internal("cgroup stat worker thread panicked"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_once_skips_unreadable_file_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = ControllerGroup::new("does_not_exist_in_sysfs");
        group.add_controller(crate::controller::Controller::cpu());
        let result = CollectorControllerGroup::sample_once(dir.path(), &[group]);
        assert!(result.is_ok());
    }

    #[test]
    fn start_then_stop_joins_worker() {
        let run = Arc::new(RunContext::for_test());
        let plan = crate::entity::plan::EntityPlan::new();
        plan.write().unwrap().set_name("p").unwrap();
        let mut ctx = ExecutorContext::collecting(None);
        ctx.set_entity(crate::executor::context::EntityNode::Plan(plan));
        ctx.set_current(1);
        let ctx = Arc::new(ctx);

        let collector = CollectorControllerGroup::new("cg_collector", Vec::new(), 0, 1);
        collector.start(&run, &ctx).unwrap();
        collector.stop(&run).unwrap();
    }
}
