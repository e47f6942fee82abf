//! Thread-safe plan cache
//!
//! Plans are built outside the map lock. When two callers race on the same key both
//! build, the first insert wins and the loser's plan is dropped.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use super::MappingPlan;
use crate::error::Result;
use crate::registry::TypeName;

/// Plans keyed by (source type, destination type)
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: DashMap<(TypeName, TypeName), Arc<MappingPlan>>,
}

impl PlanCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached plan for the pair, if any
    pub fn get(&self, source: &TypeName, destination: &TypeName) -> Option<Arc<MappingPlan>> {
        self.plans
            .get(&(source.clone(), destination.clone()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Cached plan for the pair, building and storing it on first use
    pub fn get_or_build<F>(
        &self,
        source: &TypeName,
        destination: &TypeName,
        build: F,
    ) -> Result<Arc<MappingPlan>>
    where
        F: FnOnce() -> Result<MappingPlan>,
    {
        if let Some(plan) = self.get(source, destination) {
            trace!(source = %source, destination = %destination, "plan cache hit");
            return Ok(plan);
        }

        let built = Arc::new(build()?);
        let stored = self
            .plans
            .entry((source.clone(), destination.clone()))
            .or_insert(built);
        Ok(Arc::clone(stored.value()))
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// No plan cached yet
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every cached plan
    pub fn clear(&self) {
        self.plans.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::MAX_RECURSION_DEPTH;
    use crate::plan::PlanBuilder;
    use crate::test_support::registry_with_people;

    #[test]
    fn second_request_reuses_the_plan() {
        let registry = registry_with_people();
        let cache = PlanCache::new();
        let builder = PlanBuilder::new(&registry, ".", MAX_RECURSION_DEPTH);
        let person = TypeName::from("Person");

        let first = cache
            .get_or_build(&person, &person, || builder.build(&person, &person))
            .unwrap();
        let second = cache
            .get_or_build(&person, &person, || builder.build(&person, &person))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let registry = registry_with_people();
        let cache = PlanCache::new();
        let builder = PlanBuilder::new(&registry, ".", MAX_RECURSION_DEPTH);
        let missing = TypeName::from("Missing");

        assert!(
            cache
                .get_or_build(&missing, &missing, || builder.build(&missing, &missing))
                .is_err()
        );
        assert!(cache.is_empty());
    }
}
