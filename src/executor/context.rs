use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::controller::group::ControllerGroup;
use crate::entity::case::EntityCase;
use crate::entity::command::{CommandParent, EntityCommand};
use crate::entity::config::EntityConfig;
use crate::entity::plan::EntityPlan;
use crate::entity::suite::EntitySuite;

/// A type-erased handle to whichever entity level an [`ExecutorContext`]
/// frame or [`crate::process::Process`] command is currently scoped to.
/// Lets the placeholder substitution and executor-tree code walk the
/// plan/suite/case/command chain without static knowledge of which level
/// it started at (§4.4).
#[derive(Clone)]
pub enum EntityNode {
    Plan(Arc<RwLock<EntityPlan>>),
    Suite(Arc<RwLock<EntitySuite>>),
    Case(Arc<RwLock<EntityCase>>),
    Command(Arc<RwLock<EntityCommand>>),
}

impl EntityNode {
    pub fn kind_label(&self) -> &'static str {
        match self {
            EntityNode::Plan(_) => "Plan",
            EntityNode::Suite(_) => "Suite",
            EntityNode::Case(_) => "Case",
            EntityNode::Command(_) => "Command",
        }
    }

    pub fn name(&self) -> String {
        use crate::entity::entity::Entity;
        match self {
            EntityNode::Plan(e) => e.read().unwrap().name().to_string(),
            EntityNode::Suite(e) => e.read().unwrap().name().to_string(),
            EntityNode::Case(e) => e.read().unwrap().name().to_string(),
            EntityNode::Command(e) => e.read().unwrap().name().to_string(),
        }
    }

    pub fn dir_name(&self) -> String {
        use crate::entity::entity::Entity;
        match self {
            EntityNode::Plan(e) => e.read().unwrap().dir_name(),
            EntityNode::Suite(e) => e.read().unwrap().dir_name(),
            EntityNode::Case(e) => e.read().unwrap().dir_name(),
            EntityNode::Command(e) => e.read().unwrap().dir_name(),
        }
    }

    pub fn long_name(&self) -> String {
        use crate::entity::entity::Entity;
        match self {
            EntityNode::Plan(e) => e.read().unwrap().long_name(),
            EntityNode::Suite(e) => e.read().unwrap().long_name(),
            EntityNode::Case(e) => e.read().unwrap().long_name(),
            EntityNode::Command(e) => e.read().unwrap().long_name(),
        }
    }

    /// `Some` for every level except `Command`, which carries no config.
    pub fn config(&self) -> Option<EntityConfig> {
        match self {
            EntityNode::Plan(e) => Some(e.read().unwrap().config().clone()),
            EntityNode::Suite(e) => Some(e.read().unwrap().config().clone()),
            EntityNode::Case(e) => Some(e.read().unwrap().config().clone()),
            EntityNode::Command(_) => None,
        }
    }

    pub fn params(&self) -> HashMap<String, String> {
        self.config().map(|c| c.params).unwrap_or_default()
    }

    pub fn iter_axes(&self) -> Vec<(String, Vec<String>)> {
        self.config().map(|c| c.iters).unwrap_or_default()
    }

    pub fn cgroups(&self) -> Vec<ControllerGroup> {
        match self {
            EntityNode::Plan(e) => e.read().unwrap().cgroups().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Pre-hook commands owned by this entity, empty for `Command` (which
    /// carries no hooks of its own).
    pub fn pre(&self) -> Vec<Arc<RwLock<EntityCommand>>> {
        match self {
            EntityNode::Plan(e) => e.read().unwrap().pre().to_vec(),
            EntityNode::Suite(e) => e.read().unwrap().pre().to_vec(),
            EntityNode::Case(e) => e.read().unwrap().pre().to_vec(),
            EntityNode::Command(_) => Vec::new(),
        }
    }

    /// Post-hook commands owned by this entity, empty for `Command`.
    pub fn post(&self) -> Vec<Arc<RwLock<EntityCommand>>> {
        match self {
            EntityNode::Plan(e) => e.read().unwrap().post().to_vec(),
            EntityNode::Suite(e) => e.read().unwrap().post().to_vec(),
            EntityNode::Case(e) => e.read().unwrap().post().to_vec(),
            EntityNode::Command(_) => Vec::new(),
        }
    }

    /// Walks one level up the entity tree (not the executor-context
    /// chain): `Plan` has none, `Command` dispatches on its
    /// [`CommandParent`] variant.
    pub fn parent_node(&self) -> Option<EntityNode> {
        match self {
            EntityNode::Plan(_) => None,
            EntityNode::Suite(e) => e.read().unwrap().parent().map(EntityNode::Plan),
            EntityNode::Case(e) => e.read().unwrap().parent().map(EntityNode::Suite),
            EntityNode::Command(e) => match e.read().unwrap().parent() {
                Some(CommandParent::Plan(w)) => w.upgrade().map(EntityNode::Plan),
                Some(CommandParent::Suite(w)) => w.upgrade().map(EntityNode::Suite),
                Some(CommandParent::Case(w)) => w.upgrade().map(EntityNode::Case),
                None => None,
            },
        }
    }
}

/// The kind-specific payload a context frame carries beyond the shared
/// prefix/exclude_from_path/current/entity fields (§4.1).
#[derive(Clone, Default)]
pub enum ContextPayload {
    #[default]
    None,
    Collecting {
        cgroups: Option<Vec<ControllerGroup>>,
    },
    Iterating {
        iters: HashMap<String, String>,
    },
}

/// One frame of the dynamic-scope chain threaded through `execute()`
/// calls (§4.1). Rather than the six near-identical subclasses of the
/// original design (differing only in `prefix`, `exclude_from_path` and,
/// for two of them, one extra field), this crate collapses them into one
/// struct with a tagged payload — constructed through the `controlling`/
/// `collecting`/`replicating`/`concurrent`/`parallel`/`iterating`
/// constructors below, which is where each kind's fixed prefix and
/// exclude_from_path live.
#[derive(Clone)]
pub struct ExecutorContext {
    parent: Option<Arc<ExecutorContext>>,
    entity: Option<EntityNode>,
    current: Option<u32>,
    prefix: Option<&'static str>,
    exclude_from_path: bool,
    payload: ContextPayload,
}

impl ExecutorContext {
    fn new(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            parent,
            entity: None,
            current: None,
            prefix: None,
            exclude_from_path: false,
            payload: ContextPayload::None,
        }
    }

    pub fn controlling(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("cne"),
            exclude_from_path: true,
            ..Self::new(parent)
        }
    }

    pub fn collecting(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("cle"),
            exclude_from_path: true,
            payload: ContextPayload::Collecting { cgroups: None },
            ..Self::new(parent)
        }
    }

    pub fn replicating(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("r"),
            exclude_from_path: false,
            ..Self::new(parent)
        }
    }

    pub fn concurrent(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("cce"),
            exclude_from_path: true,
            ..Self::new(parent)
        }
    }

    pub fn parallel(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("p"),
            exclude_from_path: false,
            ..Self::new(parent)
        }
    }

    pub fn iterating(parent: Option<Arc<ExecutorContext>>) -> Self {
        Self {
            prefix: Some("i"),
            exclude_from_path: false,
            payload: ContextPayload::Iterating { iters: HashMap::new() },
            ..Self::new(parent)
        }
    }

    pub fn parent(&self) -> Option<&Arc<ExecutorContext>> {
        self.parent.as_ref()
    }

    pub fn entity(&self) -> Option<&EntityNode> {
        self.entity.as_ref()
    }

    pub fn set_entity(&mut self, entity: EntityNode) {
        self.entity = Some(entity);
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn set_current(&mut self, current: u32) {
        self.current = Some(current);
    }

    pub fn exclude_from_path(&self) -> bool {
        self.exclude_from_path
    }

    pub fn prefix(&self) -> Option<&'static str> {
        self.prefix
    }

    /// `<prefix><current:03>`, e.g. `"r001"`.
    pub fn id(&self) -> String {
        format!("{}{:03}", self.prefix.unwrap_or(""), self.current.unwrap_or(0))
    }

    pub fn cgroups(&self) -> Option<&[ControllerGroup]> {
        match &self.payload {
            ContextPayload::Collecting { cgroups } => cgroups.as_deref(),
            _ => None,
        }
    }

    pub fn set_cgroups(&mut self, cgroups: Vec<ControllerGroup>) {
        if let ContextPayload::Collecting { cgroups: slot } = &mut self.payload {
            *slot = Some(cgroups);
        }
    }

    pub fn iters(&self) -> HashMap<String, String> {
        match &self.payload {
            ContextPayload::Iterating { iters } => iters.clone(),
            _ => HashMap::new(),
        }
    }

    pub fn set_iters(&mut self, iters: HashMap<String, String>) {
        if let ContextPayload::Iterating { iters: slot } = &mut self.payload {
            *slot = iters;
        }
    }

    /// Yields frames from `self` up to the root (§4.1 `walk()`).
    pub fn walk(&self) -> Walk<'_> {
        Walk { current: Some(self) }
    }
}

/// Iterator returned by [`ExecutorContext::walk`].
pub struct Walk<'a> {
    current: Option<&'a ExecutorContext>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a ExecutorContext;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.current.take()?;
        self.current = frame.parent().map(|p| p.as_ref());
        Some(frame)
    }
}
