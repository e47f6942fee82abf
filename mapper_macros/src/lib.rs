//! Procedural macros for graph_mapper

mod attributes;
mod mappable;

use proc_macro::TokenStream;

/// Derives `graph_mapper::Mappable` for structs with named fields and fieldless enums.
///
/// Types register under their module path, such as `crate_name::orders::Order`, so
/// same-named types in different modules stay apart. Struct fields register under their
/// `UpperCamelCase` names, so `home_city` is addressed as `HomeCity` in binding paths.
/// Enum variants keep their Rust names.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Mappable)]
/// #[mapping(configure = configure_target, default)]
/// pub struct Target {
///     #[bind_to("X")]
///     pub fallback_value: String,
///
///     #[complex_bind(dest = "NestedDestination.Info", source = "Nested.Info")]
///     pub nested_destination: Details,
///
///     #[converter("upper")]
///     pub title: String,
///
///     #[copy_ignore]
///     pub scratch: i32,
/// }
/// ```
///
/// Field attributes:
/// - `#[bind_to("A, B")]` tries each source path in order, then the field's own name
/// - `#[bind_to("A.B", literal)]` resolves the candidates from the source root
/// - `#[complex_bind(dest = "...", source = "...")]` is repeatable; an omitted `dest`
///   targets the field itself
/// - `#[copy_ignore]` drops name-based matching for the field
/// - `#[converter("name")]` runs a registered converter before assignment
///
/// Container attributes inside `#[mapping(...)]`:
/// - `name = "..."` registers the type under this exact name instead of its module path
/// - `configure = path` attaches a `fn(&mut MappingConfigurator)` hook
/// - `default` builds new instances from `Default::default()`
#[proc_macro_derive(
    Mappable,
    attributes(mapping, bind_to, complex_bind, copy_ignore, converter)
)]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    mappable::derive_mappable_impl(input)
}
