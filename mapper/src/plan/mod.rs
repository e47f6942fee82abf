//! Mapping plans
//!
//! A plan lists, for one (source type, destination type) pair, every destination path
//! together with the source paths it may be read from in priority order. Plans hold no
//! instance data and are cached for the life of the mapper.

mod builder;
mod cache;
mod recursion_context;

use std::fmt;

pub use builder::PlanBuilder;
pub use cache::PlanCache;
pub use recursion_context::RecursionContext;
use serde::Serialize;

use crate::registry::TypeName;

/// One destination path and where its value may come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingPlanEntry {
    destination: String,
    candidates:  Vec<String>,
    converter:   Option<String>,
    expanded:    bool,
}

impl MappingPlanEntry {
    /// Entry reading `destination` from the first non-null of `candidates`
    pub const fn new(
        destination: String,
        candidates: Vec<String>,
        converter: Option<String>,
    ) -> Self {
        Self {
            destination,
            candidates,
            converter,
            expanded: false,
        }
    }

    /// Mark a composite entry whose fields have their own entries in the plan
    #[must_use]
    pub const fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }

    /// Destination path from the destination root
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Source paths from the source root, highest priority first
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Converter applied to the resolved value before assignment
    pub fn converter(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    /// Nested entries fill this composite; a non-null source only makes sure the
    /// destination object exists
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// One complex-bind rule with its destination resolved to a root path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexBindRule {
    /// Destination path from the destination root
    pub destination: String,
    /// Source path from the source root
    pub source:      String,
}

/// Complex-bind rules declared on one destination field
///
/// Rules are tried in declaration order; the first whose source is non-null is applied
/// and the rest of the group is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexBindGroup {
    /// Destination path of the declaring field
    pub declaring_path: String,
    /// Rules in priority order
    pub rules:          Vec<ComplexBindRule>,
}

/// Every entry and complex-bind group for one type pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingPlan {
    source:        TypeName,
    destination:   TypeName,
    entries:       Vec<MappingPlanEntry>,
    complex_binds: Vec<ComplexBindGroup>,
}

impl MappingPlan {
    /// Source type
    pub const fn source(&self) -> &TypeName {
        &self.source
    }

    /// Destination type
    pub const fn destination(&self) -> &TypeName {
        &self.destination
    }

    /// Entries, parents before their children
    pub fn entries(&self) -> &[MappingPlanEntry] {
        &self.entries
    }

    /// Complex-bind groups in field declaration order
    pub fn complex_binds(&self) -> &[ComplexBindGroup] {
        &self.complex_binds
    }

    /// Entry for a destination path, matched case-insensitively
    pub fn entry(&self, destination: &str) -> Option<&MappingPlanEntry> {
        self.entries
            .iter()
            .find(|entry| entry.destination.eq_ignore_ascii_case(destination))
    }
}

impl fmt::Display for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.source, self.destination)?;
        for entry in &self.entries {
            write!(f, "  {} <- [{}]", entry.destination, entry.candidates.join(", "))?;
            if let Some(converter) = &entry.converter {
                write!(f, " via {converter}")?;
            }
            if entry.expanded {
                write!(f, " (expanded)")?;
            }
            writeln!(f)?;
        }
        for group in &self.complex_binds {
            for rule in &group.rules {
                writeln!(
                    f,
                    "  {} <- {} (complex, {})",
                    rule.destination, rule.source, group.declaring_path
                )?;
            }
        }
        Ok(())
    }
}
