//! Mapper configuration
//!
//! Configuration is a plain serde struct so hosts can keep it next to the rest of their
//! settings; every field has a default and a partial JSON document is accepted.

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::constants::{DEFAULT_SEPARATOR, MAX_RECURSION_DEPTH};
use crate::error::{Error, Result};

/// How a mapping plan is executed
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExecutionMode {
    /// Walk field names on every call
    #[default]
    Interpreted,
    /// Resolve paths once into memoized accessor closures
    Compiled,
}

/// Settings shared by every operation of a [`Mapper`](crate::Mapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Path segment separator
    pub separator: String,
    /// Plan execution strategy
    pub execution: ExecutionMode,
    /// Recursion ceiling for graph walks
    pub max_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            execution: ExecutionMode::default(),
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl MapperConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .change_context(Error::Configuration("malformed mapper configuration".into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(Report::new(Error::Configuration(
                "separator must not be empty".into(),
            )));
        }
        if self.separator.contains(['[', ']']) {
            return Err(Report::new(Error::Configuration(format!(
                "separator '{}' collides with index syntax",
                self.separator
            ))));
        }
        if self.max_depth == 0 {
            return Err(Report::new(Error::Configuration(
                "max_depth must be at least 1".into(),
            )));
        }
        Ok(())
    }

    /// Replace the separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Replace the execution mode
    #[must_use]
    pub const fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    /// Replace the recursion ceiling
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MapperConfig::from_json_str(r#"{ "execution": "compiled" }"#).unwrap();
        assert_eq!(config.execution, ExecutionMode::Compiled);
        assert_eq!(config.separator, ".");
        assert_eq!(config.max_depth, MAX_RECURSION_DEPTH);
    }

    #[test]
    fn empty_separator_is_rejected() {
        let report = MapperConfig::from_json_str(r#"{ "separator": "" }"#).unwrap_err();
        assert!(matches!(report.current_context(), Error::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let report = MapperConfig::from_json_str("{ separator: ").unwrap_err();
        assert!(matches!(report.current_context(), Error::Configuration(_)));
    }

    #[test]
    fn execution_mode_parses_case_insensitively() {
        assert_eq!(
            "Compiled".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Compiled
        );
        assert_eq!(ExecutionMode::Interpreted.to_string(), "interpreted");
    }
}
