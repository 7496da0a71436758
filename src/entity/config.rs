use std::collections::HashMap;

/// Per-entity tuning knobs shared by plan, suite, case and command.
///
/// `concurrency` only has observable effect at suite level and
/// `parallelism` only at case level (§4.3); the struct is shared across
/// all entity kinds anyway since every entity carries one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityConfig {
    pub replication: u32,
    pub concurrency: bool,
    pub parallelism: u32,
    pub iteration: IterationType,
    pub params: HashMap<String, String>,
    /// Iteration axes in declaration order. Kept as an ordered
    /// association list rather than a `HashMap` because PRODUCT
    /// expansion is order-sensitive — "first axis varies slowest" (§4.3)
    /// has no meaning once axis order is lost.
    pub iters: Vec<(String, Vec<String>)>,
}

/// How `iters` axes are combined into a sequence of bindings (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IterationType {
    Product,
    Zip,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            replication: 1,
            concurrency: false,
            parallelism: 1,
            iteration: IterationType::Product,
            params: HashMap::new(),
            iters: Vec::new(),
        }
    }
}

impl EntityConfig {
    /// Declared values for axis `key`, if present, in declaration order.
    pub fn iter_axis(&self, key: &str) -> Option<&[String]> {
        self.iters.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }
}
