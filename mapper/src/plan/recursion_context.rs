//! Per-branch state for the plan walk
//!
//! Each destination field the walk descends into gets its own context: where it sits in
//! the destination, where the same position lands in the source if no rule redirects
//! it, and which types are already being expanded on the way down.

use std::collections::HashSet;

use crate::constants::RecursionDepth;
use crate::registry::TypeName;

/// Position of the walk in the destination shape
#[derive(Debug, Clone)]
pub struct RecursionContext<'a> {
    /// Separator joining path segments
    pub separator:     &'a str,
    /// Destination path of the composite whose fields are being planned; empty at the root
    pub dest_prefix:   String,
    /// Source path the same position maps to; `None` at the root
    pub source_prefix: Option<String>,
    /// Composite types expanded on this branch
    pub visited:       HashSet<TypeName>,
    /// Nesting level
    pub depth:         RecursionDepth,
}

impl<'a> RecursionContext<'a> {
    /// Context for the destination root
    pub fn root(type_name: &TypeName, separator: &'a str) -> Self {
        Self {
            separator,
            dest_prefix: String::new(),
            source_prefix: None,
            visited: HashSet::from([type_name.clone()]),
            depth: RecursionDepth::ZERO,
        }
    }

    /// Destination path of a field under this context
    pub fn dest_key(&self, field_name: &str) -> String {
        if self.dest_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}{}{field_name}", self.dest_prefix, self.separator)
        }
    }

    /// Source path a same-named field would be read from
    pub fn fallback_source(&self, field_name: &str) -> String {
        self.source_prefix.as_ref().map_or_else(
            || self.dest_key(field_name),
            |prefix| format!("{prefix}{}{field_name}", self.separator),
        )
    }

    /// Resolve one bind-to candidate
    ///
    /// Candidates that already contain a separator, or are declared literal, are taken
    /// from the source root; bare names are read next to the current source position.
    pub fn bind_candidate(&self, candidate: &str, literal: bool) -> String {
        if literal || candidate.contains(self.separator) {
            return candidate.to_string();
        }
        self.source_prefix.as_ref().map_or_else(
            || candidate.to_string(),
            |prefix| format!("{prefix}{}{candidate}", self.separator),
        )
    }

    /// Whether `type_name` is already expanded on this branch
    pub fn is_visited(&self, type_name: &TypeName) -> bool {
        self.visited.contains(type_name)
    }

    /// Context for the fields of a composite field
    ///
    /// The visited set is copied, so sibling branches may each expand the same type.
    pub fn create_field_context(
        &self,
        dest_key: String,
        source_prefix: String,
        field_type: &TypeName,
    ) -> Self {
        let mut visited = self.visited.clone();
        visited.insert(field_type.clone());
        Self {
            separator: self.separator,
            dest_prefix: dest_key,
            source_prefix: Some(source_prefix),
            visited,
            depth: self.depth.increment(),
        }
    }
}
