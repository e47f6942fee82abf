//! Call-local state for one mapping call

use std::collections::HashSet;

use crate::value::ObjectId;

/// Source objects currently being mapped on the active branch
///
/// Created per top-level call and never shared, so concurrent calls cannot observe each
/// other's cycle state.
#[derive(Debug, Default)]
pub struct MappingContext {
    active: HashSet<ObjectId>,
}

impl MappingContext {
    /// Fresh context for a top-level call
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as being mapped; `false` when it already is, which means a cycle
    pub fn enter(&mut self, id: ObjectId) -> bool {
        self.active.insert(id)
    }

    /// Done mapping `id`
    pub fn leave(&mut self, id: ObjectId) {
        self.active.remove(&id);
    }

    /// Whether `id` is being mapped further up the branch
    pub fn is_active(&self, id: ObjectId) -> bool {
        self.active.contains(&id)
    }

    /// Number of nested composite mappings in progress
    pub fn depth(&self) -> usize {
        self.active.len()
    }
}
