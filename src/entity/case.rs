
use std::sync::{Arc, RwLock, Weak};

use super::command::{CommandParent, EntityCommand};
use super::config::EntityConfig;
use super::entity::{validate_entity_name, Entity};
use super::suite::EntitySuite;
use crate::error::OrchestratorError;

/// A case owns an ordered list of commands and runs under a suite (§3).
pub struct EntityCase {
    name: Option<String>,
    config: EntityConfig,
    parent: Option<Weak<RwLock<EntitySuite>>>,
    pre: Vec<Arc<RwLock<EntityCommand>>>,
    post: Vec<Arc<RwLock<EntityCommand>>>,
    commands: Vec<Arc<RwLock<EntityCommand>>>,
}

impl Default for EntityCase {
    fn default() -> Self {
        Self {
            name: None,
            config: EntityConfig::default(),
            parent: None,
            pre: Vec::new(),
            post: Vec::new(),
            commands: Vec::new(),
        }
    }
}

impl EntityCase {
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

    pub fn parent(&self) -> Option<Arc<RwLock<EntitySuite>>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn pre(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.pre
    }

    pub fn post(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.post
    }

    pub fn commands(&self) -> &[Arc<RwLock<EntityCommand>>] {
        &self.commands
    }

    pub fn add_pre(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Case(Arc::downgrade(this)));
        this.write().unwrap().pre.push(command);
    }

    pub fn set_pre(this: &Arc<RwLock<Self>>, commands: Vec<Arc<RwLock<EntityCommand>>>) {
        this.write().unwrap().pre.clear();
        for command in commands {
            Self::add_pre(this, command);
        }
    }

    pub fn add_post(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Case(Arc::downgrade(this)));
        this.write().unwrap().post.push(command);
    }

    pub fn set_post(this: &Arc<RwLock<Self>>, commands: Vec<Arc<RwLock<EntityCommand>>>) {
        this.write().unwrap().post.clear();
        for command in commands {
            Self::add_post(this, command);
        }
    }

    pub fn add_command(this: &Arc<RwLock<Self>>, command: Arc<RwLock<EntityCommand>>) {
        command.write().unwrap().set_parent(CommandParent::Case(Arc::downgrade(this)));
        this.write().unwrap().commands.push(command);
    }

    pub fn set_commands(this: &Arc<RwLock<Self>>, commands: Vec<Arc<RwLock<EntityCommand>>>) {
        this.write().unwrap().commands.clear();
        for command in commands {
            Self::add_command(this, command);
        }
    }

    pub(super) fn set_parent(&mut self, parent: Weak<RwLock<EntitySuite>>) {
        self.parent = Some(parent);
    }
}

impl Entity for EntityCase {
    fn kind_label(&self) -> &'static str {
        "Case"
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
    use crate::entity::plan::EntityPlan;

    #[test]
    fn init_defaults() {
        let case = EntityCase::default();
        assert!(case.commands.is_empty());
    }

    #[test]
    fn add_and_replace_commands() {
        let case = EntityCase::new();
        let cmd1 = EntityCommand::new();
        cmd1.write().unwrap().set_name("cmd1").unwrap();
        EntityCase::add_command(&case, cmd1.clone());

        assert_eq!(case.read().unwrap().commands().len(), 1);
        assert!(Arc::ptr_eq(&case.read().unwrap().commands()[0], &cmd1));

        let cmd2 = EntityCommand::new();
        cmd2.write().unwrap().set_name("cmd2").unwrap();
        let cmd3 = EntityCommand::new();
        cmd3.write().unwrap().set_name("cmd3").unwrap();
        EntityCase::set_commands(&case, vec![cmd2.clone(), cmd3.clone()]);

        assert_eq!(case.read().unwrap().commands().len(), 2);
        assert!(Arc::ptr_eq(&case.read().unwrap().commands()[0], &cmd2));
        assert!(Arc::ptr_eq(&case.read().unwrap().commands()[1], &cmd3));
    }

    #[test]
    fn dir_name() {
        let case = EntityCase::new();
        case.write().unwrap().set_name("testcase").unwrap();
        assert_eq!(case.read().unwrap().dir_name(), "case_testcase");
    }

    #[test]
    fn log_name() {
        let plan = EntityPlan::new();
        plan.write().unwrap().set_name("testplan").unwrap();

        let suite = EntitySuite::new();
        suite.write().unwrap().set_name("testsuite").unwrap();
        EntityPlan::add_suite(&plan, suite.clone());

        let case = EntityCase::new();
        case.write().unwrap().set_name("testcase").unwrap();
        EntitySuite::add_case(&suite, case.clone());

        assert_eq!(case.read().unwrap().short_name(), "Case[testcase]");
        assert_eq!(
            case.read().unwrap().long_name(),
            "Plan[testplan] > Suite[testsuite] > Case[testcase]"
        );
    }

    #[test]
    fn pre_post_inherited_behavior() {
        let case = EntityCase::new();

        let pre = EntityCommand::new();
        pre.write().unwrap().set_name("precmd").unwrap();
        pre.write().unwrap().set_cmd("echo pre");
        EntityCase::add_pre(&case, pre.clone());

        let post = EntityCommand::new();
        post.write().unwrap().set_name("postcmd").unwrap();
        post.write().unwrap().set_cmd("echo post");
        EntityCase::add_post(&case, post.clone());

        assert_eq!(case.read().unwrap().pre().len(), 1);
        assert_eq!(case.read().unwrap().post().len(), 1);
        assert_eq!(case.read().unwrap().pre()[0].read().unwrap().name(), "precmd");
        assert_eq!(case.read().unwrap().post()[0].read().unwrap().name(), "postcmd");
    }
}
