//! Plan construction
//!
//! Walks the destination type depth-first. Every field gets an entry; composite fields
//! are then expanded with the source position their first candidate points at, so
//! nested fields keep reading from wherever their parent was redirected. Collections
//! are mapped as a unit and never expanded.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::recursion_context::RecursionContext;
use super::{ComplexBindGroup, ComplexBindRule, MappingPlan, MappingPlanEntry};
use crate::convert::ConverterRegistry;
use crate::error::Result;
use crate::registry::{FieldDescriptor, MappingConfigurator, TypeDescriptor, TypeName, TypeRegistry};

/// Builds [`MappingPlan`]s from registered descriptors
#[derive(Debug, Clone, Copy)]
pub struct PlanBuilder<'a> {
    registry:   &'a TypeRegistry,
    separator:  &'a str,
    max_depth:  usize,
    converters: Option<&'a ConverterRegistry>,
}

impl<'a> PlanBuilder<'a> {
    /// Builder over `registry`
    pub const fn new(registry: &'a TypeRegistry, separator: &'a str, max_depth: usize) -> Self {
        Self {
            registry,
            separator,
            max_depth,
            converters: None,
        }
    }

    /// Warn about converter names that are not registered here
    pub const fn with_converters(mut self, converters: &'a ConverterRegistry) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Plan for mapping `source` instances onto `destination` instances
    ///
    /// Only the destination must be registered; source paths are resolved by name at
    /// mapping time.
    pub fn build(&self, source: &TypeName, destination: &TypeName) -> Result<MappingPlan> {
        let descriptor = self.registry.require(destination)?;
        let mut plan = MappingPlan {
            source:        source.clone(),
            destination:   destination.clone(),
            entries:       Vec::new(),
            complex_binds: Vec::new(),
        };

        let context = RecursionContext::root(destination, self.separator);
        self.plan_fields(&descriptor, &context, &mut plan);

        if let Some(configure) = descriptor.configure() {
            let mut configurator = MappingConfigurator::new();
            configure(&mut configurator);
            apply_overrides(&mut plan, configurator);
        }

        debug!(
            source = %source,
            destination = %destination,
            entries = plan.entries.len(),
            complex_binds = plan.complex_binds.len(),
            "built mapping plan"
        );
        Ok(plan)
    }

    fn plan_fields(
        &self,
        descriptor: &TypeDescriptor,
        context: &RecursionContext<'_>,
        plan: &mut MappingPlan,
    ) {
        for field in descriptor.fields() {
            let dest_key = context.dest_key(field.name());
            let rules = field.rules();

            if let Some(group) = self.complex_bind_group(field, context, &dest_key) {
                plan.complex_binds.push(group);
            }

            let Some(candidates) = candidates_for(field, context) else {
                trace!(path = %dest_key, "field ignored");
                continue;
            };

            if let Some(converter) = &rules.converter {
                self.check_converter(converter, &dest_key);
            }

            let child_source = candidates
                .first()
                .cloned()
                .unwrap_or_else(|| context.fallback_source(field.name()));

            let entry = MappingPlanEntry::new(dest_key.clone(), candidates, rules.converter.clone());

            let Some(nested) = self.expansion(field, context, &dest_key) else {
                plan.entries.push(entry);
                continue;
            };
            plan.entries.push(entry.expanded());
            let child = context.create_field_context(dest_key, child_source, nested.name());
            self.plan_fields(&nested, &child, plan);
        }
    }

    /// Descriptor of a composite field whose fields get entries of their own
    ///
    /// Composites that are not expanded are mapped as a unit at execution time.
    fn expansion(
        &self,
        field: &FieldDescriptor,
        context: &RecursionContext<'_>,
        dest_key: &str,
    ) -> Option<Arc<TypeDescriptor>> {
        let field_type = field.field_type().composite_type()?;
        if context.is_visited(field_type) {
            trace!(path = dest_key, type_name = %field_type, "type already expanded on this branch");
            return None;
        }
        if context.depth.increment().exceeds_limit(self.max_depth) {
            warn!(
                path = dest_key,
                type_name = %field_type,
                depth = %context.depth,
                "plan depth limit reached, nested fields not planned"
            );
            return None;
        }
        let Some(nested) = self.registry.get(field_type) else {
            debug!(path = dest_key, type_name = %field_type, "nested type not registered");
            return None;
        };
        Some(nested)
    }

    /// Resolve a field's complex-bind destinations to root paths
    fn complex_bind_group(
        &self,
        field: &FieldDescriptor,
        context: &RecursionContext<'_>,
        dest_key: &str,
    ) -> Option<ComplexBindGroup> {
        let binds = &field.rules().complex_binds;
        if binds.is_empty() {
            return None;
        }
        let relative_marker = format!("{}{}", field.name(), self.separator);
        let rules = binds
            .iter()
            .map(|bind| {
                let destination = bind.destination.trim();
                let destination = if destination.is_empty() {
                    dest_key.to_string()
                } else if starts_with_ignore_case(destination, &relative_marker) {
                    context.dest_key(destination)
                } else {
                    destination.to_string()
                };
                ComplexBindRule {
                    destination,
                    source: bind.source.trim().to_string(),
                }
            })
            .collect();
        Some(ComplexBindGroup {
            declaring_path: dest_key.to_string(),
            rules,
        })
    }

    fn check_converter(&self, name: &str, dest_key: &str) {
        if let Some(converters) = self.converters
            && converters.get(name).is_none()
        {
            warn!(
                path = dest_key,
                converter = name,
                "converter not registered, field maps without conversion"
            );
        }
    }
}

/// Candidate source paths for one field, `None` when the field takes no part
fn candidates_for(field: &FieldDescriptor, context: &RecursionContext<'_>) -> Option<Vec<String>> {
    let rules = field.rules();
    let fallback = context.fallback_source(field.name());

    match &rules.bind_to {
        Some(bind) if !bind.candidates().is_empty() => {
            let mut candidates: Vec<String> = bind
                .candidates()
                .iter()
                .map(|candidate| context.bind_candidate(candidate, bind.is_literal()))
                .collect();
            if !rules.ignore
                && !candidates
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(&fallback))
            {
                candidates.push(fallback);
            }
            Some(candidates)
        }
        _ if rules.ignore => None,
        _ => Some(vec![fallback]),
    }
}

/// Fluent overrides replace the entry for the same destination or add a new one
fn apply_overrides(plan: &mut MappingPlan, configurator: MappingConfigurator) {
    for override_entry in configurator.into_overrides() {
        match plan
            .entries
            .iter_mut()
            .find(|entry| entry.destination.eq_ignore_ascii_case(&override_entry.destination))
        {
            Some(entry) => entry.candidates = override_entry.sources,
            None => plan.entries.push(MappingPlanEntry::new(
                override_entry.destination,
                override_entry.sources,
                None,
            )),
        }
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
