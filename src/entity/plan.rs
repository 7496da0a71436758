use std::sync::{Arc, RwLock};

use super::collector_config::CollectorConfig;
use super::command::{CommandParent, EntityCommand};
use super::config::EntityConfig;
use super::entity::{validate_entity_name, Entity};
use super::suite::EntitySuite;
use crate::controller::group::ControllerGroup;
use crate::error::OrchestratorError;

/// The root of the experiment tree: owns suites plus the cgroups and
/// collectors that scope the whole plan (§3). A plan has no parent.
pub struct EntityPlan {
    name: Option<String>,
    config: EntityConfig,
    pre: Vec<Arc<RwLock<EntityCommand>>>,
    post: Vec<Arc<RwLock<EntityCommand>>>,
    suites: Vec<Arc<RwLock<EntitySuite>>>,
    cgroups: Vec<ControllerGroup>,
    collectors: Vec<CollectorConfig>,
}

impl Default for EntityPlan {
    fn default() -> Self {
        Self {
            name: None,
            config: EntityConfig::default(),
            pre: Vec::new(),
            post: Vec::new(),
            suites: Vec::new(),
            cgroups: Vec::new(),
            collectors: Vec::new(),
        }
    }
}

impl EntityPlan {
    pub fn new() -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), OrchestratorError> {
        let name = name.into();
        validate_entity_name(&name)?;
        self.name = Some(name);
        Ok(())
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EntityConfig {
        &mut self.config
    }

    pub fn pre(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.pre
    }

    pub fn post(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.post
    }

    pub fn suites(&self) -> &[Arc<RwLock<EntitySuite>>] {
        &self.suites
    }

    pub fn cgroups(&self) -> &[ControllerGroup] {
        &self.cgroups
    }

    pub fn set_cgroups(&mut self, cgroups: Vec<ControllerGroup>) {
        self.cgroups = cgroups;
    }

    pub fn collectors(&self) -> &[CollectorConfig] {
        &self.collectors
    }

    pub fn set_collectors(&mut self, collectors: Vec<CollectorConfig>) {
        self.collectors = collectors;
    }

    pub fn add_pre(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Plan(Arc::downgrade(this)));
        this.write().unwrap().pre.push(command);
    }

    pub fn add_post(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Plan(Arc::downgrade(this)));
        this.write().unwrap().post.push(command);
    }

    pub fn add_suite(this: &Arc<RwLock<Self>>, suite: Arc<RwLock<EntitySuite>>) {
        suite.write().unwrap().set_parent(Arc::downgrade(this));
        this.write().unwrap().suites.push(suite);
    }

    pub fn set_suites(this: &Arc<RwLock<Self>>, suites: Vec<Arc<RwLock<EntitySuite>>>) {
        this.write().unwrap().suites.clear();
        for suite in suites {
            Self::add_suite(this, suite);
        }
    }
}

impl Entity for EntityPlan {
    fn kind_label(&self) -> &'static str {
        "Plan"
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn long_name(&self) -> String {
        self.short_name()
    }
}
