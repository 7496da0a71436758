//! Run-wide state shared by every executor: the timestamped output root,
//! the plan's named cgroup definitions, and placeholder substitution
//! (§4.5, §6). Mirrors the teacher crate's `IsolationConfig`/`Isolation`
//! idiom in `engine/isolation.rs` — resolve defaults, validate
//! preconditions up front via `nix`/`std`, wrap fallible steps in
//! `anyhow::Context` — generalized from namespace isolation to a plan's
//! run-root bookkeeping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use tracing::debug;

use crate::controller::group::ControllerGroup;
use crate::error::OrchestratorError;
use crate::executor::context::{EntityNode, ExecutorContext};

/// Host preconditions that must hold before the executor tree runs
/// (§7 PRECONDITION). Checked once by [`RunContext::bootstrap`].
const REQUIRED_BINARIES: &[&str] = &["cgcreate", "cgset", "cgdelete", "cgexec", "perf"];

fn binary_on_path(name: &str) -> bool {
    std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path).any(|dir| dir.join(name).is_file())
        })
        .unwrap_or(false)
}

/// Verifies the host is Linux and every binary in [`REQUIRED_BINARIES`]
/// resolves on `PATH`. Called once before the executor tree is built;
/// CONFIG/schema validation is the external parser's job, not this
/// crate's (§1 Non-goals).
pub fn check_preconditions() -> Result<(), OrchestratorError> {
    if std::env::consts::OS != "linux" {
        return Err(OrchestratorError::precondition(format!(
            "unsupported host OS `{}`; this orchestrator only runs on Linux",
            std::env::consts::OS
        )));
    }
    for binary in REQUIRED_BINARIES {
        if !binary_on_path(binary) {
            return Err(OrchestratorError::precondition(format!(
                "required binary `{binary}` not found on PATH"
            )));
        }
    }
    Ok(())
}

/// Shared, read-mostly state for one run of the orchestrator: the
/// timestamped output root and a name→[`ControllerGroup`] index used to
/// resolve `cgexec` controller lists when a command attaches to a cgroup
/// by name (§4.5 "Cgroup wrap").
pub struct RunContext {
    run_root: PathBuf,
    cgroups: HashMap<String, ControllerGroup>,
}

impl RunContext {
    /// Builds `<work_path>/<UTC-timestamp>/`, creates it, and indexes
    /// `cgroups` by name. Does not check host preconditions — call
    /// [`check_preconditions`] once before building any `RunContext`.
    pub fn bootstrap(
        work_path: &Path,
        cgroups: Vec<ControllerGroup>,
    ) -> Result<Self, OrchestratorError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let run_root = work_path.join(stamp);
        std::fs::create_dir_all(&run_root).map_err(|e| {
            OrchestratorError::precondition(format!(
                "failed to create run root {}: {e}",
                run_root.display()
            ))
        })?;
        debug!(run_root = %run_root.display(), "bootstrapped run context");
        Ok(Self {
            run_root,
            cgroups: cgroups.into_iter().map(|g| (g.name().to_string(), g)).collect(),
        })
    }

    /// A `RunContext` good enough for unit tests that don't exercise
    /// path creation or cgroup lookups — points at the process temp dir
    /// without creating it.
    pub fn for_test() -> Self {
        Self {
            run_root: std::env::temp_dir(),
            cgroups: HashMap::new(),
        }
    }

    /// Reopens a prior run's output tree for introspection (`report()`,
    /// §4.9) without re-running `bootstrap`'s preconditions or directory
    /// creation — the run root is assumed to already exist on disk.
    pub fn for_run_root(run_root: PathBuf) -> Self {
        Self {
            run_root,
            cgroups: HashMap::new(),
        }
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    pub fn cgroup(&self, name: &str) -> Option<&ControllerGroup> {
        self.cgroups.get(name)
    }

    /// Output directory for `ctx`: the contributing ids in its frame
    /// chain joined under the run root (§3 "Output directory... is
    /// deterministic", §6 layout). Frames with `exclude_from_path` set
    /// contribute nothing; an entity's `<kind>_<name>` segment is
    /// emitted once, at the first contributing frame scoped to it.
    pub fn resolve_path(&self, ctx: &ExecutorContext) -> PathBuf {
        let mut frames = Vec::new();
        let mut cur = Some(ctx);
        while let Some(frame) = cur {
            frames.push(frame);
            cur = frame.parent().map(|p| p.as_ref());
        }
        frames.reverse();

        let mut segments = Vec::new();
        let mut last_entity: Option<(&'static str, String)> = None;
        for frame in frames {
            if frame.exclude_from_path() {
                continue;
            }
            if let Some(entity) = frame.entity() {
                let key = (entity.kind_label(), entity.name());
                if last_entity.as_ref() != Some(&key) {
                    segments.push(entity.dir_name());
                    last_entity = Some(key);
                }
            }
            segments.push(frame.id());
        }

        let mut path = self.run_root.clone();
        for segment in segments {
            path.push(segment);
        }
        path
    }

    /// Creates the output directory for `ctx` if it doesn't already
    /// exist (§5 "Output directories are created idempotently per
    /// frame").
    pub fn ensure_path(&self, ctx: &ExecutorContext) -> Result<PathBuf, OrchestratorError> {
        let path = self.resolve_path(ctx);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create output directory {}", path.display()))
            .map_err(|e| OrchestratorError::internal(e.to_string()))?;
        Ok(path)
    }

    /// Resolves every `{m:<ns>:<key>}` placeholder in `template` against
    /// `ctx` (for `iter:`/`context:run_path`) and `entity` (for
    /// `entity:`/`param:`), in a single left-to-right pass (§4.5, §9).
    /// An unresolved placeholder is a fatal [`OrchestratorError::UnresolvedPlaceholder`].
    pub fn substitute(
        &self,
        template: &str,
        ctx: &ExecutorContext,
        entity: &EntityNode,
    ) -> Result<String, OrchestratorError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{m:") {
            output.push_str(&rest[..start]);
            let after = &rest[start..];
            let end = after.find('}').ok_or_else(|| {
                OrchestratorError::unresolved_placeholder(after.to_string())
            })?;
            let token = &after[..=end];
            let inner = &token[3..token.len() - 1];
            let (ns, key) = inner
                .split_once(':')
                .ok_or_else(|| OrchestratorError::unresolved_placeholder(token.to_string()))?;
            let resolved = self
                .resolve_placeholder(ns, key, ctx, entity)
                .ok_or_else(|| OrchestratorError::unresolved_placeholder(token.to_string()))?;
            output.push_str(&resolved);
            rest = &after[end + 1..];
        }
        output.push_str(rest);
        Ok(output)
    }

    fn resolve_placeholder(
        &self,
        ns: &str,
        key: &str,
        ctx: &ExecutorContext,
        entity: &EntityNode,
    ) -> Option<String> {
        match ns {
            "entity" => find_entity_of_kind(entity, key),
            "param" => find_param(entity, key),
            "iter" => find_iter(ctx, key),
            "context" => match key {
                "run_path" => Some(self.resolve_path(ctx).display().to_string()),
                "pid" => Some(std::process::id().to_string()),
                "ppid" => Some(nix::unistd::getppid().to_string()),
                "pgid" => nix::unistd::getpgid(None).ok().map(|p| p.to_string()),
                _ => None,
            },
            _ => None,
        }
    }
}

fn find_entity_of_kind(entity: &EntityNode, kind: &str) -> Option<String> {
    let target = match kind {
        "plan" => "Plan",
        "suite" => "Suite",
        "case" => "Case",
        "command" => "Command",
        _ => return None,
    };
    let mut cur = Some(entity.clone());
    while let Some(node) = cur {
        if node.kind_label() == target {
            return Some(node.name());
        }
        cur = node.parent_node();
    }
    None
}

fn find_param(entity: &EntityNode, key: &str) -> Option<String> {
    let mut cur = Some(entity.clone());
    while let Some(node) = cur {
        if let Some(value) = node.params().get(key) {
            return Some(value.clone());
        }
        cur = node.parent_node();
    }
    None
}

fn find_iter(ctx: &ExecutorContext, key: &str) -> Option<String> {
    let mut cur = Some(ctx);
    while let Some(frame) = cur {
        if let Some(value) = frame.iters().get(key) {
            return Some(value.clone());
        }
        cur = frame.parent().map(|p| p.as_ref());
    }
    None
}
