pub mod controller;
pub mod factory;
pub mod group;

pub use controller::{Controller, LimitValue};
pub use factory::ControllerFactory;
pub use group::ControllerGroup;
