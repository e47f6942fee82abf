//! Plan execution
//!
//! Applies a [`MappingPlan`] to one (source, destination) pair. For each entry the
//! candidates are read in order and the first non-null value is converted and written;
//! the rest are skipped. Complex binds run after every entry.
//!
//! A composite whose fields the plan expanded is only made to exist; its own entries
//! fill it from the source root. Composites the plan could not expand are mapped
//! recursively through the plan for their own type pair, and a source object already
//! being mapped higher up the branch is left out, which is what bounds cyclic graphs.
//!
//! Only root-level misuse is an error. Everything that goes wrong for a single field is
//! logged and the field is left as it was.

mod mapping_context;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use error_stack::Report;
pub use mapping_context::MappingContext;
use tracing::{debug, trace, warn};

use crate::compiled::CompiledCache;
use crate::config::{ExecutionMode, MapperConfig};
use crate::convert::{
    ConversionPipeline, ConversionRegistry, ConverterRegistry, SharedConverter, ValueCoercer,
};
use crate::error::{Error, Result};
use crate::path::{ArrayMode, FieldPath, PathResolver};
use crate::plan::{MappingPlan, PlanBuilder, PlanCache};
use crate::registry::{FieldType, TypeName, TypeRegistry};
use crate::value::{ArrayRef, ListRef, ObjectRef, Value};

/// Borrowed view of a mapper's registries and caches
#[derive(Debug, Clone, Copy)]
pub struct ExecutionEngine<'a> {
    registry:    &'a TypeRegistry,
    plans:       &'a PlanCache,
    compiled:    &'a CompiledCache,
    converters:  &'a ConverterRegistry,
    conversions: &'a ConversionRegistry,
    config:      &'a MapperConfig,
}

impl<'a> ExecutionEngine<'a> {
    /// Engine over the given parts
    pub const fn new(
        registry: &'a TypeRegistry,
        plans: &'a PlanCache,
        compiled: &'a CompiledCache,
        converters: &'a ConverterRegistry,
        conversions: &'a ConversionRegistry,
        config: &'a MapperConfig,
    ) -> Self {
        Self {
            registry,
            plans,
            compiled,
            converters,
            conversions,
            config,
        }
    }

    /// Type registry
    pub const fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Named converters
    pub const fn converters(&self) -> &'a ConverterRegistry {
        self.converters
    }

    /// Path resolver using the configured separator
    pub fn resolver(&self) -> PathResolver<'a> {
        PathResolver::new(self.registry, &self.config.separator)
    }

    /// Scalar and collection coercion without composite mapping
    pub const fn pipeline(&self) -> ConversionPipeline<'a> {
        ConversionPipeline::new(self.registry, self.conversions)
    }

    /// Cached plan for the pair, built on first use
    pub fn plan(&self, source: &TypeName, destination: &TypeName) -> Result<Arc<MappingPlan>> {
        self.plans.get_or_build(source, destination, || {
            PlanBuilder::new(self.registry, &self.config.separator, self.config.max_depth)
                .with_converters(self.converters)
                .build(source, destination)
        })
    }

    /// Map `source` onto an existing destination object
    ///
    /// Fails only when `source` is not an object or no plan can be built for the pair.
    pub fn map_into(&self, source: &Value, destination: &ObjectRef) -> Result<()> {
        let Value::Object(source) = source else {
            return Err(Report::new(Error::invalid(
                "source",
                format!("expected an object, got {}", source.variant_name()),
            )));
        };
        // Surface plan errors at the root; nested failures are only logged
        self.plan(source.type_name(), destination.type_name())?;

        let mut context = MappingContext::new();
        self.apply(source, destination, &mut context)
    }

    /// Run the plan for the pair in the configured execution mode
    pub(crate) fn apply(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
        context: &mut MappingContext,
    ) -> Result<()> {
        if context.depth() > self.config.max_depth {
            debug!(
                source = %source.type_name(),
                depth = context.depth(),
                "mapping depth limit reached, branch skipped"
            );
            return Ok(());
        }
        if !context.enter(source.id()) {
            debug!(source = %source.type_name(), "cycle detected, branch skipped");
            return Ok(());
        }

        let result = self
            .plan(source.type_name(), destination.type_name())
            .map(|plan| match self.config.execution {
                ExecutionMode::Interpreted => {
                    self.run_plan(&plan, source, destination, context);
                }
                ExecutionMode::Compiled => {
                    self.compiled
                        .get_or_compile(self, &plan)
                        .run(self, source, destination, context);
                }
            });

        context.leave(source.id());
        result
    }

    /// Walk the plan resolving every path by name
    fn run_plan(
        &self,
        plan: &MappingPlan,
        source: &ObjectRef,
        destination: &ObjectRef,
        context: &mut MappingContext,
    ) {
        let resolver = self.resolver();
        let source_value = Value::Object(source.clone());

        for entry in plan.entries() {
            let Some(path) = resolver.resolve(plan.destination(), entry.destination()) else {
                trace!(path = entry.destination(), "destination path not found");
                continue;
            };
            let converter = entry.converter().and_then(|name| self.converters.get(name));

            for candidate in entry.candidates() {
                let value = resolver.get(&source_value, candidate);
                if value.is_null() {
                    trace!(path = entry.destination(), candidate = %candidate, "candidate is null");
                    continue;
                }
                if let Some(value) =
                    self.run_converter(entry.converter(), converter.as_ref(), value)
                {
                    self.write_entry(destination, &path, value, entry.is_expanded(), context);
                }
                break;
            }
        }

        for group in plan.complex_binds() {
            for rule in &group.rules {
                let value = resolver.get(&source_value, &rule.source);
                if value.is_null() {
                    continue;
                }
                match resolver.resolve(plan.destination(), &rule.destination) {
                    Some(path) => {
                        self.write(destination, &path, value, context);
                    }
                    None => debug!(
                        declared_on = %group.declaring_path,
                        path = %rule.destination,
                        "complex-bind destination not found"
                    ),
                }
                break;
            }
        }
    }

    /// Apply the field's converter, `None` when it fails and the field must be skipped
    ///
    /// A named converter that is not registered passes the value through.
    pub(crate) fn run_converter(
        &self,
        name: Option<&str>,
        converter: Option<&SharedConverter>,
        value: Value,
    ) -> Option<Value> {
        let Some(converter) = converter else {
            if let Some(name) = name {
                trace!(converter = name, "converter not registered, value passed through");
            }
            return Some(value);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| converter.convert(value))) {
            Ok(Ok(converted)) => Some(converted),
            Ok(Err(report)) => {
                debug!(converter = ?name, error = ?report, "converter failed, field skipped");
                None
            }
            Err(_) => {
                warn!(converter = ?name, "converter panicked, field skipped");
                None
            }
        }
    }

    /// Write the value an entry resolved
    ///
    /// For an expanded composite the source object only decides that the destination
    /// object must exist.
    pub(crate) fn write_entry(
        &self,
        destination: &ObjectRef,
        path: &FieldPath,
        value: Value,
        expanded: bool,
        context: &mut MappingContext,
    ) -> bool {
        if expanded && value.is_composite() {
            let mut coercer = EnsureObject {
                registry: self.registry,
            };
            return self
                .resolver()
                .set(destination, path, value, &mut coercer, ArrayMode::Immediate);
        }
        self.write(destination, path, value, context)
    }

    /// Coerce and write `value` at a resolved destination path
    fn write(
        &self,
        destination: &ObjectRef,
        path: &FieldPath,
        value: Value,
        context: &mut MappingContext,
    ) -> bool {
        let mut coercer = EngineCoercer {
            engine: self,
            context,
        };
        self.resolver()
            .set(destination, path, value, &mut coercer, ArrayMode::Immediate)
    }
}

/// Keeps an existing destination object of the declared type or constructs one
struct EnsureObject<'a> {
    registry: &'a TypeRegistry,
}

impl ValueCoercer for EnsureObject<'_> {
    fn coerce(&mut self, _value: Value, target: &FieldType, existing: &Value) -> Option<Value> {
        let type_name = target.composite_type()?;
        match existing {
            Value::Object(object) if object.type_name() == type_name => Some(existing.clone()),
            _ => self.registry.construct(target),
        }
    }
}

/// Coercion that maps composites and collections of composites through the engine
struct EngineCoercer<'e, 'a> {
    engine:  &'e ExecutionEngine<'a>,
    context: &'e mut MappingContext,
}

impl EngineCoercer<'_, '_> {
    fn map_composite(
        &mut self,
        source: &ObjectRef,
        destination_type: &TypeName,
        existing: &Value,
    ) -> Option<Value> {
        if self.context.is_active(source.id()) {
            debug!(type_name = %source.type_name(), "cycle detected, reference left unset");
            return None;
        }

        let target = match existing {
            Value::Object(object) if object.type_name() == destination_type => object.clone(),
            _ => match self.engine.registry.instantiate(destination_type) {
                Ok(object) => object,
                Err(report) => {
                    debug!(type_name = %destination_type, error = ?report, "cannot construct destination");
                    return None;
                }
            },
        };

        if let Err(report) = self.engine.apply(source, &target, self.context) {
            debug!(
                source = %source.type_name(),
                destination = %destination_type,
                error = ?report,
                "nested mapping failed"
            );
            return None;
        }
        Some(Value::Object(target))
    }

    fn map_elements(&mut self, value: &Value, element_type: &FieldType) -> Option<Vec<Value>> {
        let composite = element_type.composite_type().is_some();
        value
            .elements()?
            .into_iter()
            .map(|item| {
                if item.is_null() {
                    return Some(Value::Null);
                }
                match self.coerce(item, element_type, &Value::Null) {
                    Some(mapped) => Some(mapped),
                    // Cyclic or unbuildable composite elements keep their position
                    None if composite => Some(Value::Null),
                    None => None,
                }
            })
            .collect()
    }
}

impl ValueCoercer for EngineCoercer<'_, '_> {
    fn coerce(&mut self, value: Value, target: &FieldType, existing: &Value) -> Option<Value> {
        let inner = target.non_nullable();

        if let (FieldType::Object(destination_type), Value::Object(source)) = (inner, &value) {
            return self.map_composite(source, destination_type, existing);
        }

        if value.is_collection()
            && let Some(element_type) = inner.element_type()
        {
            let items = self.map_elements(&value, element_type)?;
            if !inner.accepts_len(items.len()) {
                trace!(target = %inner, len = items.len(), "array length does not fit");
                return None;
            }
            return Some(match inner {
                FieldType::Array(..) => Value::Array(ArrayRef::new(items)),
                _ => Value::List(ListRef::new(items)),
            });
        }

        self.engine.pipeline().convert(value, target)
    }
}
