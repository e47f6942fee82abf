//! Path parsing and resolution
//!
//! Paths name a location in an object graph: field names joined by the configured
//! separator, with `[n]` indexers for list and array elements. Matching is
//! case-insensitive throughout.

mod field_path;
mod parser;

pub use field_path::{Accessor, ArrayMode, FieldPath, PathResolver, ResolvedSegment};
pub use parser::{RawSegment, parse_path};
