use crate::error::OrchestratorError;

use super::controller::Controller;

/// Builds a [`Controller`] pre-populated with its type's default stat
/// files from a typed name string (§4.6).
pub struct ControllerFactory;

impl ControllerFactory {
    pub fn instance(name: &str) -> Result<Controller, OrchestratorError> {
        match name {
            Controller::TYPE_CPU => Ok(Controller::cpu()),
            Controller::TYPE_CPUSET => Ok(Controller::cpuset()),
            Controller::TYPE_IO => Ok(Controller::io()),
            Controller::TYPE_MEMORY => Ok(Controller::memory()),
            Controller::TYPE_HUGETLB => Ok(Controller::hugetlb()),
            Controller::TYPE_PIDS => Ok(Controller::pids()),
            Controller::TYPE_RDMA => Ok(Controller::rdma()),
            Controller::TYPE_MISC => Ok(Controller::misc()),
            other => Err(OrchestratorError::config(format!(
                "Controller name {other} is not recognized"
            ))),
        }
    }
}
