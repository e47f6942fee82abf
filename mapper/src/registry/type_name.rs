use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A newtype wrapper for registered type names
///
/// Registry lookups, plan cache keys and composite instances all identify types by this
/// name. Derived types register under their Rust identifier unless renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Get the underlying string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last `::` segment, for log lines
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for TypeName {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<&Self> for TypeName {
    fn from(type_name: &Self) -> Self {
        type_name.clone()
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TypeName> for Value {
    fn from(type_name: TypeName) -> Self {
        Self::String(type_name.0)
    }
}
