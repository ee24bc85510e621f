use std::sync::Arc;

use crate::knowledge::KnowledgeStore;
use crate::names::NameGenerator;
use crate::registry::WaystoneRegistry;

/// The external collaborators a level hands to its waystone bindings.
///
/// Cloning is a few refcount bumps.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<dyn WaystoneRegistry>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub names: Arc<dyn NameGenerator>,
}

impl Services {
    pub fn new(
        registry: Arc<dyn WaystoneRegistry>,
        knowledge: Arc<dyn KnowledgeStore>,
        names: Arc<dyn NameGenerator>,
    ) -> Self {
        Self {
            registry,
            knowledge,
            names,
        }
    }
}
