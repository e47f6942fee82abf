use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";
const MSG_MISSING_PREFIX: &str = "Missing";

/// Result type for the `graph_mapper` library
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Error categories surfaced by the public API
///
/// Per-field problems during mapping never reach the caller; they are logged and the
/// field is skipped. Only root-level misuse and setup problems produce an `Error`.
#[derive(Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Construction failed: {0}")]
    Construction(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Converter failed: {0}")]
    Converter(String),

    #[error("{0}")]
    General(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Path parse error: {0}")]
    PathParse(String),

    #[error("Type not registered: {type_name}")]
    TypeNotRegistered { type_name: String },
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(s) => f.debug_tuple("Configuration").field(s).finish(),
            Self::Construction(s) => f.debug_tuple("Construction").field(s).finish(),
            Self::Conversion(s) => f.debug_tuple("Conversion").field(s).finish(),
            Self::Converter(s) => f.debug_tuple("Converter").field(s).finish(),
            Self::General(s) => f.debug_tuple("General").field(s).finish(),
            Self::InvalidArgument(s) => f.debug_tuple("InvalidArgument").field(s).finish(),
            Self::PathParse(s) => f.debug_tuple("PathParse").field(s).finish(),
            Self::TypeNotRegistered { type_name } => f
                .debug_struct("TypeNotRegistered")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

impl Error {
    // Builder methods for common patterns

    /// Create a "Failed to X" error
    pub fn failed_to(action: &str, details: impl std::fmt::Display) -> Self {
        Self::General(format!("{MSG_FAILED_TO_PREFIX} {action}: {details}"))
    }

    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create a "Missing X" error
    pub fn missing(what: &str) -> Self {
        Self::InvalidArgument(format!("{MSG_MISSING_PREFIX} {what}"))
    }

    /// Create error for a type name that has no registered descriptor
    pub fn not_registered(type_name: impl std::fmt::Display) -> Self {
        Self::TypeNotRegistered {
            type_name: type_name.to_string(),
        }
    }

    /// Create error for an instance that could not be default-constructed
    pub fn construction_failed(type_name: impl std::fmt::Display, reason: &str) -> Self {
        Self::Construction(format!(
            "{MSG_FAILED_TO_PREFIX} construct '{type_name}': {reason}"
        ))
    }

    /// Create error for a path string the parser rejects
    pub fn path_parse(path: &str, reason: impl std::fmt::Display) -> Self {
        Self::PathParse(format!("'{path}': {reason}"))
    }
}
