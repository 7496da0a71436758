//! CLI entry point (§4.8, §7): `run` builds a plan's executor tree and
//! drives it to completion; `report` introspects a prior run's output
//! tree. Plan documents are read as JSON (see [`cgharness_core::plandoc`]) —
//! YAML authoring and schema validation stay an external collaborator's
//! job (§1 Non-goals).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;

use cgharness_core::{check_preconditions, plandoc, Runner};

#[derive(Parser)]
#[command(name = "cgharness", about = "Linux cgroup v2 performance-experiment orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and execute a plan's experiment tree.
    Run {
        /// Path to a JSON plan document.
        #[arg(long)]
        plan: PathBuf,
        /// Directory under which the timestamped run root is created.
        #[arg(long, default_value = "./runs")]
        work_dir: PathBuf,
    },
    /// Summarize a prior run's output tree.
    Report {
        /// Run root produced by a previous `run` invocation.
        #[arg(long)]
        run_root: PathBuf,
        /// Include the per-artifact file listing (§4.9).
        #[arg(long, default_value_t = true)]
        files: bool,
    },
}

fn main() -> ExitCode {
    cgharness_core::init_tracing();

    match &Cli::parse().command {
        Command::Run { plan, work_dir } => run(plan, work_dir),
        Command::Report { run_root, files } => report(run_root, *files),
    }
}

fn run(plan_path: &std::path::Path, work_dir: &std::path::Path) -> ExitCode {
    if let Err(e) = check_preconditions() {
        error!(error = %e, "precondition check failed");
        return ExitCode::FAILURE;
    }

    let plan = match plandoc::load_plan(plan_path) {
        Ok(plan) => plan,
        Err(e) => {
            error!(error = %e, "failed to load plan");
            return ExitCode::FAILURE;
        }
    };

    let cgroups = plan.read().unwrap().cgroups().to_vec();
    let run = match cgharness_core::RunContext::bootstrap(work_dir, cgroups) {
        Ok(run) => Arc::new(run),
        Err(e) => {
            error!(error = %e, "failed to bootstrap run context");
            return ExitCode::FAILURE;
        }
    };

    let runner = Runner::new(run.clone());
    match runner.run(&[plan]) {
        Ok(()) => {
            println!("run root: {}", run.run_root().display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn report(run_root: &std::path::Path, files: bool) -> ExitCode {
    let run = Arc::new(cgharness_core::RunContext::for_run_root(run_root.to_path_buf()));
    let runner = Runner::new(run);
    match runner.report(files) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "report failed");
            ExitCode::FAILURE
        }
    }
}
