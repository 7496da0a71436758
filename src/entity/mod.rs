pub mod case;
pub mod collector_config;
pub mod command;
pub mod config;
pub mod entity;
pub mod plan;
pub mod suite;

pub use collector_config::{CollectorConfig, CollectorEventConfig};
pub use config::{EntityConfig, IterationType};
pub use entity::Entity;
