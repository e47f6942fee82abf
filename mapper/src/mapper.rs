//! Public mapping entry points
//!
//! A [`Mapper`] owns the type registry, the plan caches and the converter registries.
//! Typed calls go through [`Mappable`]; dynamic calls work on [`Value`]s directly.

use std::sync::{Arc, LazyLock};

use error_stack::Report;
use tracing::debug;

use crate::compiled::CompiledCache;
use crate::config::MapperConfig;
use crate::convert::{ConversionRegistry, ConverterRegistry, PropertyConverter};
use crate::engine::ExecutionEngine;
use crate::error::{Error, Result};
use crate::flatten::{FlattenResult, Flattener};
use crate::plan::{MappingPlan, PlanCache};
use crate::registry::{FieldType, Mappable, TypeDescriptor, TypeName, TypeRegistry};
use crate::value::{ListRef, ScalarKind, Value};

/// Process-wide mapper behind [`map`] and [`bind_from`]
static GLOBAL_MAPPER: LazyLock<Mapper> = LazyLock::new(Mapper::new);

/// Object-graph mapper
///
/// All caches are safe for concurrent use; a single instance can serve every thread.
#[derive(Debug)]
pub struct Mapper {
    config:      MapperConfig,
    registry:    TypeRegistry,
    plans:       PlanCache,
    compiled:    CompiledCache,
    converters:  ConverterRegistry,
    conversions: ConversionRegistry,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// Mapper with the default configuration and the built-in conversions
    pub fn new() -> Self {
        Self::from_parts(MapperConfig::default())
    }

    /// Mapper with a validated configuration
    pub fn with_config(config: MapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: MapperConfig) -> Self {
        Self {
            config,
            registry: TypeRegistry::new(),
            plans: PlanCache::new(),
            compiled: CompiledCache::new(),
            converters: ConverterRegistry::new(),
            conversions: ConversionRegistry::with_builtins(),
        }
    }

    /// The shared process-wide mapper
    pub fn global() -> &'static Self {
        &GLOBAL_MAPPER
    }

    /// Active configuration
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Type registry
    pub const fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register or replace a hand-built descriptor
    ///
    /// Cached plans are dropped since they may describe the old shape.
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        let descriptor = self.registry.register(descriptor);
        self.invalidate();
        descriptor
    }

    /// Register a Rust type and every type it reaches
    pub fn register_type<T: Mappable>(&self) -> FieldType {
        self.registry.register_type::<T>()
    }

    /// Register or replace a named converter
    pub fn register_converter(
        &self,
        name: impl Into<String>,
        converter: impl PropertyConverter + 'static,
    ) {
        self.converters.register(name, converter);
        self.compiled.clear();
    }

    /// Register or replace a scalar conversion tried before the general fallback
    pub fn register_conversion<F>(&self, from: ScalarKind, to: ScalarKind, conversion: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.conversions.register(from, to, conversion);
    }

    fn invalidate(&self) {
        self.plans.clear();
        self.compiled.clear();
    }

    fn engine(&self) -> ExecutionEngine<'_> {
        ExecutionEngine::new(
            &self.registry,
            &self.plans,
            &self.compiled,
            &self.converters,
            &self.conversions,
            &self.config,
        )
    }

    fn flattener(&self) -> Flattener<'_> {
        Flattener::new(&self.registry, &self.config.separator, self.config.max_depth)
    }

    // Typed API

    /// Map `source` into a new `D`
    ///
    /// `D` starts from `D::default()`, so fields the plan never writes keep their
    /// defaults.
    pub fn map<D, S>(&self, source: &S) -> Result<D>
    where
        D: Mappable + Default,
        S: Mappable,
    {
        self.bind_from(D::default(), source)
    }

    /// Map `source` onto an existing `destination`, keeping fields the plan never writes
    pub fn bind_from<D, S>(&self, destination: D, source: &S) -> Result<D>
    where
        D: Mappable,
        S: Mappable,
    {
        self.registry.register_type::<S>();
        self.registry.register_type::<D>();

        let destination = destination.to_value();
        self.bind_value(&destination, &source.to_value())?;
        D::from_value(&destination).ok_or_else(|| {
            Report::new(Error::Conversion(format!(
                "mapped value does not fit {}",
                D::field_type()
            )))
        })
    }

    /// Map every element of `sources` into a new `D`
    pub fn map_all<'s, D, S>(&self, sources: impl IntoIterator<Item = &'s S>) -> Result<Vec<D>>
    where
        D: Mappable + Default,
        S: Mappable,
    {
        sources.into_iter().map(|source| self.map(source)).collect()
    }

    // Dynamic API

    /// Map a source object into a new instance of `destination`
    ///
    /// The source is checked before the destination is looked up or constructed.
    pub fn map_value(&self, source: &Value, destination: &TypeName) -> Result<Value> {
        if !source.is_composite() {
            return Err(Report::new(Error::invalid(
                "source",
                format!("expected an object, got {}", source.variant_name()),
            )));
        }
        let instance = self.registry.instantiate(destination)?;
        let instance = Value::Object(instance);
        self.bind_value(&instance, source)?;
        Ok(instance)
    }

    /// Map a source object onto an existing destination object in place
    pub fn bind_value(&self, destination: &Value, source: &Value) -> Result<()> {
        let Value::Object(target) = destination else {
            return Err(Report::new(Error::invalid(
                "destination",
                format!("expected an object, got {}", destination.variant_name()),
            )));
        };
        debug!(
            source = source.as_object().map_or("null", |object| object.type_name().as_str()),
            destination = %target.type_name(),
            "mapping"
        );
        self.engine().map_into(source, target)
    }

    /// Map each element of a list or array into a new `destination` instance
    ///
    /// Null elements stay null. The result is a list.
    pub fn map_values(&self, sources: &Value, destination: &TypeName) -> Result<Value> {
        let Some(elements) = sources.elements() else {
            return Err(Report::new(Error::invalid(
                "sources",
                format!("expected a list or array, got {}", sources.variant_name()),
            )));
        };
        let mapped = elements
            .iter()
            .map(|element| {
                if element.is_null() {
                    Ok(Value::Null)
                } else {
                    self.map_value(element, destination)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(ListRef::new(mapped)))
    }

    // Introspection

    /// Cached plan for the pair, built on first use
    pub fn plan(&self, source: &TypeName, destination: &TypeName) -> Result<Arc<MappingPlan>> {
        self.engine().plan(source, destination)
    }

    /// Number of cached plans
    pub fn plan_cache_len(&self) -> usize {
        self.plans.len()
    }

    /// Number of compiled plans
    pub fn compiled_cache_len(&self) -> usize {
        self.compiled.len()
    }

    // Flatten and rehydrate

    /// Flatten a dynamic value, typed by its runtime shape
    pub fn flatten(&self, value: &Value) -> FlattenResult {
        self.flattener().flatten(value, None)
    }

    /// Flatten a typed value
    pub fn flatten_typed<T: Mappable>(&self, value: &T) -> FlattenResult {
        let declared = self.registry.register_type::<T>();
        self.flattener().flatten(&value.to_value(), Some(&declared))
    }

    /// Every path a registered type can hold, with null values
    pub fn flatten_structure(&self, type_name: &TypeName) -> Result<FlattenResult> {
        self.flattener().flatten_structure(type_name)
    }

    /// Rebuild a graph from a flattened map
    pub fn rehydrate(&self, flattened: &FlattenResult) -> Result<Value> {
        flattened.rehydrate(&self.registry, &self.conversions)
    }

    /// Rebuild a typed value from a flattened map
    pub fn rehydrate_typed<T: Mappable>(&self, flattened: &FlattenResult) -> Result<T> {
        self.registry.register_type::<T>();
        let value = self.rehydrate(flattened)?;
        T::from_value(&value).ok_or_else(|| {
            Report::new(Error::Conversion(format!(
                "rehydrated value does not fit {}",
                T::field_type()
            )))
        })
    }
}

/// Map `source` into a new `D` with the global mapper
pub fn map<D, S>(source: &S) -> Result<D>
where
    D: Mappable + Default,
    S: Mappable,
{
    Mapper::global().map(source)
}

/// Map `source` onto `destination` with the global mapper
pub fn bind_from<D, S>(destination: D, source: &S) -> Result<D>
where
    D: Mappable,
    S: Mappable,
{
    Mapper::global().bind_from(destination, source)
}
