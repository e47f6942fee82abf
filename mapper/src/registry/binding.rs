//! Per-field binding rules
//!
//! A destination field can redirect where its value comes from (`BindTo`), pull values
//! from anywhere in the source into paths under or outside itself (`ComplexBind`), opt
//! out of name-based matching, or name a converter applied before assignment.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::CANDIDATE_SEPARATOR;

/// Ordered candidate source paths for one destination field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindTo {
    candidates: Vec<String>,
    literal:    bool,
}

impl BindTo {
    /// Parse a comma-separated candidate list, trimming whitespace and dropping blanks
    pub fn new(list: &str) -> Self {
        Self {
            candidates: split_list(list),
            literal:    false,
        }
    }

    /// Candidates used verbatim from the source root, never prefixed
    pub fn literal(list: &str) -> Self {
        Self {
            candidates: split_list(list),
            literal:    true,
        }
    }

    /// Candidates in priority order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Literal candidates skip relative resolution
    pub const fn is_literal(&self) -> bool {
        self.literal
    }
}

/// Explicit mapping from an absolute source path into a destination path
///
/// The destination is relative to the declaring field's parent when it starts with the
/// field's own name, absolute from the destination root otherwise, and the field itself
/// when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexBind {
    /// Destination path
    pub destination: String,
    /// Source path from the source root
    pub source:      String,
}

impl ComplexBind {
    /// A single rule
    pub fn new(destination: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            source:      source.into(),
        }
    }

    /// Expand comma-separated destination and source lists into rules
    ///
    /// Lists are zipped pairwise; when the lengths differ the shorter side repeats its
    /// first entry. An empty destination list yields rules that target the field itself.
    pub fn expand(destinations: &str, sources: &str) -> Vec<Self> {
        let destinations = split_list(destinations);
        let sources = split_list(sources);
        if sources.is_empty() {
            return Vec::new();
        }
        let count = destinations.len().max(sources.len());
        (0..count)
            .map(|index| {
                let destination = destinations
                    .get(index)
                    .or_else(|| destinations.first())
                    .cloned()
                    .unwrap_or_default();
                let source = sources
                    .get(index)
                    .or_else(|| sources.first())
                    .cloned()
                    .unwrap_or_default();
                Self {
                    destination,
                    source,
                }
            })
            .collect()
    }
}

/// Every rule attached to one destination field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Redirected candidate sources
    pub bind_to:       Option<BindTo>,
    /// Explicit source-to-destination rules, in priority order
    pub complex_binds: Vec<ComplexBind>,
    /// Excluded from default-name matching
    pub ignore:        bool,
    /// Registered converter applied before assignment
    pub converter:     Option<String>,
}

impl FieldRules {
    /// No rule is set
    pub fn is_empty(&self) -> bool {
        self.bind_to.is_none()
            && self.complex_binds.is_empty()
            && !self.ignore
            && self.converter.is_none()
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(CANDIDATE_SEPARATOR)
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(ToString::to_string)
        .dedup()
        .collect()
}
