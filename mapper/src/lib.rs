//! Object-graph mapping driven by declarative per-field binding rules
//!
//! A destination type describes where each of its fields comes from: its own name, an
//! ordered list of candidate source paths, explicit cross-structure bindings, or a fluent
//! configuration hook. The mapper turns that into a plan once per (source, destination)
//! pair and applies it to any number of instances.
//!
//! # Usage
//!
//! ```ignore
//! use graph_mapper::Mappable;
//!
//! #[derive(Default, Mappable)]
//! struct Source {
//!     name: String,
//!     nested: Inner,
//! }
//!
//! #[derive(Default, Mappable)]
//! struct Destination {
//!     name: String,
//!     #[bind_to("Nested.Info")]
//!     info: String,
//! }
//!
//! let destination: Destination = graph_mapper::map(&source)?;
//! ```
//!
//! # Surfaces
//!
//! - typed: [`map`], [`bind_from`] and [`Mapper::map_all`] over [`Mappable`] types
//! - dynamic: [`Mapper::map_value`], [`Mapper::bind_value`] and [`Mapper::map_values`]
//!   over [`Value`] graphs described by hand-built [`TypeDescriptor`]s
//! - flatten: [`Mapper::flatten`] and [`Mapper::rehydrate`] between graphs and
//!   path-keyed maps
//!
//! Paths use `.` between fields and `[n]` for elements unless the
//! [`MapperConfig::separator`] says otherwise.

extern crate self as graph_mapper;

pub mod compiled;
mod config;
mod constants;
pub mod convert;
pub mod engine;
mod error;
pub mod flatten;
mod mapper;
pub mod path;
pub mod plan;
pub mod registry;
pub mod value;

#[cfg(test)]
mod scenario_tests;
#[cfg(test)]
mod test_support;

pub use config::{ExecutionMode, MapperConfig};
pub use constants::{DEFAULT_SEPARATOR, MAX_RECURSION_DEPTH};
pub use convert::PropertyConverter;
pub use error::{Error, Result};
pub use flatten::{FlattenResult, FlattenedProperty};
pub use graph_mapper_macros::Mappable;
pub use mapper::{Mapper, bind_from, map};
pub use plan::{MappingPlan, MappingPlanEntry};
pub use registry::{
    FieldDescriptor, FieldType, Mappable, MappingConfigurator, TypeDescriptor, TypeName,
    TypeRegistry,
};
pub use value::{ArrayRef, EnumValue, ListRef, ObjectRef, ScalarKind, Value};
