//! Collector-engine resolution (§6 "Plugin config shape", §4.6).
//!
//! The original plugin surface loaded Zig/Go executor implementations from
//! shared libraries at runtime. That concern has no counterpart here: this
//! crate's "plugins" are just the small fixed set of collector engines
//! (`process`, `perf_stat`, `perf_profile`, `cgroup_stat`), and YAML/schema
//! plan loading remains an external collaborator (§1 Non-goals) rather
//! than something this registry discovers dynamically. What survives from
//! the teacher's `PluginRegistry` (`src/plugin/mod.rs`) is the shape: a
//! registry of named builders behind a lookup, not a dynamic loader.

use crate::collector::{Collector, CollectorControllerGroup, CollectorPerf, CollectorProcess};
use crate::entity::CollectorConfig;
use crate::error::OrchestratorError;

/// Engine name constants matching the `engine` field of [`CollectorConfig`].
pub const ENGINE_PROCESS: &str = "process";
pub const ENGINE_PERF_STAT: &str = "perf_stat";
pub const ENGINE_PERF_PROFILE: &str = "perf_profile";
pub const ENGINE_CGROUP_STAT: &str = "cgroup_stat";

/// Resolves a [`CollectorConfig`]'s `engine` string to a concrete
/// collector. Unlike the teacher's dynamic loader this never touches the
/// filesystem — every engine is a built-in, compiled-in builder.
pub struct PluginRegistry;

impl PluginRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Known engine names, for CONFIG-error messages and introspection.
    pub fn known_engines(&self) -> &'static [&'static str] {
        &[ENGINE_PROCESS, ENGINE_PERF_STAT, ENGINE_PERF_PROFILE, ENGINE_CGROUP_STAT]
    }

    /// Builds the collector named by `config.engine`. `cgroup_stat`
    /// collectors are built with an empty cgroup list; at run time they
    /// fall back to whatever their Collecting frame exposes
    /// (`ExecutorContext::cgroups`), which is how the suite/case-scoped
    /// active cgroup set actually reaches them (§4.4).
    pub fn build_collector(&self, config: &CollectorConfig) -> Result<Box<dyn Collector>, OrchestratorError> {
        match config.engine.as_str() {
            ENGINE_PROCESS => Ok(Box::new(CollectorProcess::new(config.clone()))),
            ENGINE_PERF_STAT => Ok(Box::new(CollectorPerf::stat(config.clone()))),
            ENGINE_PERF_PROFILE => Ok(Box::new(CollectorPerf::profile(config.clone()))),
            ENGINE_CGROUP_STAT => Ok(Box::new(CollectorControllerGroup::new(
                config.name.clone(),
                Vec::new(),
                config.ramp.unwrap_or(0),
                config.interval.unwrap_or(1),
            ))),
            other => Err(OrchestratorError::config(format!(
                "unknown collector engine `{other}`; known engines are {:?}",
                self.known_engines()
            ))),
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
