// ============================================================================
// PATH CONSTANTS
// ============================================================================

/// Default separator between field segments in a dotted path
pub const DEFAULT_SEPARATOR: &str = ".";

/// Separator between candidate paths inside a single bind-to rule
pub const CANDIDATE_SEPARATOR: char = ',';

/// Key under which a flattened scalar root is stored
pub const ROOT_VALUE_KEY: &str = "Value";

/// Element placeholder used by structure-only flattening
pub const ELEMENT_WILDCARD: &str = "[*]";

// ============================================================================
// RECURSION CONSTANTS
// ============================================================================

/// Maximum recursion depth for plan building, flattening and composite mapping
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Recursion depth tracking for graph walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RecursionDepth(usize);

impl RecursionDepth {
    /// Depth of a root walk
    pub const ZERO: Self = Self(0);

    /// One level deeper
    pub const fn increment(self) -> Self {
        Self(self.0 + 1)
    }

    /// True once the walk is deeper than `limit`
    pub const fn exceeds_limit(self, limit: usize) -> bool {
        self.0 > limit
    }

    /// Raw depth
    pub const fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RecursionDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
