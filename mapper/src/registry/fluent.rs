//! Fluent per-type mapping configuration
//!
//! A destination type can carry a hook that receives a [`MappingConfigurator`] while its
//! plan is being built. Entries registered here replace the candidate list the field
//! rules produced for the same destination path.

/// One fluent override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingOverride {
    /// Destination path from the destination root
    pub destination: String,
    /// Candidate source paths from the source root, in priority order
    pub sources:     Vec<String>,
}

/// Collects fluent overrides for one destination type
#[derive(Debug, Default)]
pub struct MappingConfigurator {
    overrides: Vec<MappingOverride>,
}

impl MappingConfigurator {
    /// Empty configurator
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `destination` from the first non-null of `sources`
    ///
    /// Configuring the same destination twice keeps the later call; destination paths
    /// compare case-insensitively.
    pub fn map<S: AsRef<str>>(&mut self, destination: &str, sources: &[S]) -> &mut Self {
        let sources = sources
            .iter()
            .map(|source| source.as_ref().trim().to_string())
            .filter(|source| !source.is_empty())
            .collect();
        let entry = MappingOverride {
            destination: destination.trim().to_string(),
            sources,
        };
        match self
            .overrides
            .iter_mut()
            .find(|existing| existing.destination.eq_ignore_ascii_case(&entry.destination))
        {
            Some(existing) => *existing = entry,
            None => self.overrides.push(entry),
        }
        self
    }

    /// Read `destination` from a single source path
    pub fn map_from(&mut self, destination: &str, source: &str) -> &mut Self {
        self.map(destination, &[source])
    }

    /// Collected overrides in registration order
    pub fn overrides(&self) -> &[MappingOverride] {
        &self.overrides
    }

    pub(crate) fn into_overrides(self) -> Vec<MappingOverride> {
        self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_override_replaces_earlier() {
        let mut configurator = MappingConfigurator::new();
        configurator
            .map("Name", &["First"])
            .map_from("Age", "Years")
            .map("name", &["Last", " Nick "]);

        let overrides = configurator.overrides();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].destination, "name");
        assert_eq!(overrides[0].sources, ["Last", "Nick"]);
        assert_eq!(overrides[1].sources, ["Years"]);
    }
}
