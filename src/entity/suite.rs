
use std::sync::{Arc, RwLock, Weak};

use super::case::EntityCase;
use super::command::{CommandParent, EntityCommand};
use super::config::EntityConfig;
use super::entity::{validate_entity_name, Entity};
use super::plan::EntityPlan;
use crate::error::OrchestratorError;

/// A suite owns an ordered list of cases and runs under a plan (§3).
pub struct EntitySuite {
    name: Option<String>,
    config: EntityConfig,
    parent: Option<Weak<RwLock<EntityPlan>>>,
    pre: Vec<Arc<RwLock<EntityCommand>>>,
    post: Vec<Arc<RwLock<EntityCommand>>>,
    cases: Vec<Arc<RwLock<EntityCase>>>,
}

impl Default for EntitySuite {
    fn default() -> Self {
        Self {
            name: None,
            config: EntityConfig::default(),
            parent: None,
            pre: Vec::new(),
            post: Vec::new(),
            cases: Vec::new(),
        }
    }
}

impl EntitySuite {
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

    pub fn parent(&self) -> Option<Arc<RwLock<EntityPlan>>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn pre(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.pre
    }

    pub fn post(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.post
    }

    pub fn cases(&self) -> &[Arc<RwLock<EntityCase>>] {
        &self.cases
    }

    pub fn add_pre(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Suite(Arc::downgrade(this)));
        this.write().unwrap().pre.push(command);
    }

    pub fn add_post(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Suite(Arc::downgrade(this)));
        this.write().unwrap().post.push(command);
    }

    pub fn add_case(this: &Arc<RwLock<Self>>, case: Arc<RwLock<EntityCase>>) {
        case.write().unwrap().set_parent(Arc::downgrade(this));
        this.write().unwrap().cases.push(case);
    }

    pub fn set_cases(this: &Arc<RwLock<Self>>, cases: Vec<Arc<RwLock<EntityCase>>>) {
        this.write().unwrap().cases.clear();
        for case in cases {
            Self::add_case(this, case);
        }
    }

    pub(super) fn set_parent(&mut self, parent: Weak<RwLock<EntityPlan>>) {
        self.parent = Some(parent);
    }
}

impl Entity for EntitySuite {
    fn kind_label(&self) -> &'static str {
        "Suite"
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn long_name(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{} > {}", parent.read().unwrap().long_name(), self.short_name()),
            None => self.short_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_defaults() {
        let suite = EntitySuite::default();
        assert!(suite.cases.is_empty());
    }

    #[test]
    fn add_and_replace_cases() {
        let suite = EntitySuite::new();
        let case1 = EntityCase::new();
        case1.write().unwrap().set_name("case1").unwrap();
        EntitySuite::add_case(&suite, case1.clone());

        assert_eq!(suite.read().unwrap().cases().len(), 1);
        assert!(Arc::ptr_eq(&suite.read().unwrap().cases()[0], &case1));

        let case2 = EntityCase::new();
        case2.write().unwrap().set_name("case2").unwrap();
        let case3 = EntityCase::new();
        case3.write().unwrap().set_name("case3").unwrap();
        EntitySuite::set_cases(&suite, vec![case2.clone(), case3.clone()]);

        assert_eq!(suite.read().unwrap().cases().len(), 2);
        assert!(Arc::ptr_eq(&suite.read().unwrap().cases()[0], &case2));
        assert!(Arc::ptr_eq(&suite.read().unwrap().cases()[1], &case3));
    }

    #[test]
    fn dir_name() {
        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("testsuite").unwrap();
        assert_eq!(suite.read().unwrap().dir_name(), "suite_testsuite");
    }

    #[test]
    fn log_name() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("testplan").unwrap();

        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("testsuite").unwrap();
        EntityPlan::add_suite(&plan, suite.clone());

        assert_eq!(suite.read().unwrap().short_name(), "Suite[testsuite]");
        assert_eq!(suite.read().unwrap().long_name(), "Plan[testplan] > Suite[testsuite]");
    }
}
