

use std::sync::{Arc, RwLock};

use super::controller::Controller;
use crate::entity::command::EntityCommand;

/// A named cgroup, built from an ordered list of typed controllers.
/// Exposes two pure builders (§4.6): `builders()` emits the `cgcreate`
/// then one `cgset` per limit; `destroyers()` emits the single
/// `cgdelete`. Neither touches the sysfs tree directly — they hand back
/// [`EntityCommand`]s for the process driver to run, so privilege
/// escalation via `become_cmd` is honored the same way as any other
/// command.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerGroup {
    name: String,
    become_cmd: Option<String>,
    controllers: Vec<Controller>,
}

impl ControllerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            become_cmd: None,
            controllers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn become_cmd(&self) -> Option<&str> {
        self.become_cmd.as_deref()
    }

    pub fn set_become_cmd(&mut self, cmd: impl Into<String>) {
        self.become_cmd = Some(cmd.into());
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn set_controllers(&mut self, controllers: Vec<Controller>) {
        self.controllers = controllers;
    }

    pub fn add_controller(&mut self, controller: Controller) {
        self.controllers.push(controller);
    }

    fn controller_names(&self) -> Vec<&str> {
        self.controllers.iter().map(Controller::name).collect()
    }

    /// `<ctrl1,ctrl2,...>:<name>`, the argument shape shared by `cgcreate`,
    /// `cgdelete` and the process driver's cgroup wrap (§4.5).
    pub fn cgexec_spec(&self) -> String {
        format!("{}:{}", self.controller_names().join(","), self.name)
    }

    fn make_command(&self, name: String, cmd: String) -> Arc<RwLock<EntityCommand>> {
        let command = EntityCommand::new();
        {
            let mut c = command.write().unwrap();
            // The group/cgcreate/cgdelete commands are synthesized, not
            // user-declared, so the ordinary name charset check does not
            // apply here; assign the field directly.
            c.set_cmd(cmd);
            if let Some(become_cmd) = &self.become_cmd {
                c.set_become_cmd(become_cmd.clone());
            }
            let _ = name;
        }
        command
    }

    /// `cgcreate -g <ctrl1,ctrl2,...>:<name>` followed by one
    /// `cgset -r <ctrl>.<key>=<val> <name>` per limit, in controller then
    /// limit declaration order.
    pub fn builders(&self) -> Vec<Arc<RwLock<EntityCommand>>> {
        let ctrls = self.controller_names().join(",");
        let mut commands = vec![self.make_command(
            format!("cgcreate_{}", self.name),
            format!("cgcreate -g {}:{}", ctrls, self.name),
        )];
        for controller in &self.controllers {
            for (key, value) in controller.limits() {
                commands.push(self.make_command(
                    format!("cgset_{}_{}_{}", controller.name(), key, self.name),
                    format!("cgset -r {}.{}={} {}", controller.name(), key, value, self.name),
                ));
            }
        }
        commands
    }

    /// Single `cgdelete -g <ctrl1,...>:<name>` command.
    pub fn destroyers(&self) -> Vec<Arc<RwLock<EntityCommand>>> {
        let ctrls = self.controller_names().join(",");
        vec![self.make_command(
            format!("cgdelete_{}", self.name),
            format!("cgdelete -g {}:{}", ctrls, self.name),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init() {
        let group = ControllerGroup::new("test_group");
        assert_eq!(group.name(), "test_group");
        assert!(group.become_cmd().is_none());
        assert!(group.controllers().is_empty());
    }

    #[test]
    fn become_cmd_roundtrip() {
        let mut group = ControllerGroup::new("test_group");
        group.set_become_cmd("sudo");
        assert_eq!(group.become_cmd(), Some("sudo"));
    }

    #[test]
    fn add_and_replace_controllers() {
        let mut group = ControllerGroup::new("test_group");
        group.add_controller(Controller::cpu());
        assert_eq!(group.controllers().len(), 1);

        group.add_controller(Controller::memory());
        assert_eq!(group.controllers().len(), 2);

        let mut group2 = ControllerGroup::new("test_group");
        group2.set_controllers(vec![Controller::cpu(), Controller::memory()]);
        assert_eq!(group2.controllers().len(), 2);
    }

    #[test]
    fn cgexec_spec_joins_controllers() {
        let mut group = ControllerGroup::new("test_group");
        group.add_controller(Controller::cpu());
        group.add_controller(Controller::memory());
        assert_eq!(group.cgexec_spec(), "cpu,memory:test_group");
    }

    #[test]
    fn controller_names() {
        let mut group = ControllerGroup::new("test_group");
        group.add_controller(Controller::cpu());
        group.add_controller(Controller::memory());
        let names = group.controller_names();
        assert!(names.contains(&"cpu"));
        assert!(names.contains(&"memory"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn builders_without_become_cmd() {
        let mut group = ControllerGroup::new("test_group");
        let mut cpu = Controller::cpu();
        cpu.add_limit("weight", 100i64);
        group.add_controller(cpu);

        let commands = group.builders();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].read().unwrap().cmd(), Some("cgcreate -g cpu:test_group"));
        assert_eq!(commands[1].read().unwrap().cmd(), Some("cgset -r cpu.weight=100 test_group"));
        assert!(commands[0].read().unwrap().become_cmd().is_none());
    }

    #[test]
    fn builders_with_become_cmd() {
        let mut group = ControllerGroup::new("test_group");
        group.set_become_cmd("sudo");
        let mut cpu = Controller::cpu();
        cpu.add_limit("weight", 100i64);
        group.add_controller(cpu);

        let commands = group.builders();
        assert_eq!(commands[0].read().unwrap().become_cmd(), Some("sudo"));
        assert_eq!(commands[1].read().unwrap().become_cmd(), Some("sudo"));
    }

    #[test]
    fn destroyers() {
        let mut group = ControllerGroup::new("test_group");
        group.add_controller(Controller::cpu());
        group.add_controller(Controller::memory());

        let commands = group.destroyers();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].read().unwrap().cmd(), Some("cgdelete -g cpu,memory:test_group"));
        assert!(commands[0].read().unwrap().become_cmd().is_none());
    }

    #[test]
    fn empty_group() {
        let group = ControllerGroup::new("empty_group");
        assert!(group.controller_names().is_empty());

        let builders = group.builders();
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].read().unwrap().cmd(), Some("cgcreate -g :empty_group"));

        let destroyers = group.destroyers();
        assert_eq!(destroyers.len(), 1);
        assert_eq!(destroyers[0].read().unwrap().cmd(), Some("cgdelete -g :empty_group"));
    }
}
