//! Compiled execution
//!
//! Turns a [`MappingPlan`] into closures once per type pair so repeated mappings skip
//! path parsing and field-name lookups. Getters bind each step to a field slot of the
//! type the plan was built for and fall back to a name lookup when the runtime object
//! has a different descriptor. Setters capture the resolved destination path; entries
//! whose destination does not resolve are dropped while compiling, just as the
//! interpreted engine skips them before reading any candidate.
//!
//! Behaviour matches the interpreted engine exactly: same candidate order, same
//! short-circuit, same coercion and cycle handling.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::convert::SharedConverter;
use crate::engine::{ExecutionEngine, MappingContext};
use crate::path::{RawSegment, parse_path};
use crate::plan::MappingPlan;
use crate::registry::{FieldType, TypeDescriptor, TypeName, TypeRegistry};
use crate::value::{ObjectRef, Value};

/// Reads one source path from a root value
pub type GetterFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Coerces and writes one destination path under a root object
pub type SetterFn =
    Arc<dyn Fn(&ExecutionEngine<'_>, &ObjectRef, Value, &mut MappingContext) -> bool + Send + Sync>;

/// One step of a compiled getter
enum GetStep {
    Field {
        name: String,
        slot: Option<(Arc<TypeDescriptor>, usize)>,
    },
    Element(usize),
}

struct CompiledEntry {
    destination: String,
    getters:     Vec<GetterFn>,
    setter:      SetterFn,
    converter:   Option<String>,
    resolved:    Option<SharedConverter>,
}

struct CompiledRule {
    getter: GetterFn,
    setter: SetterFn,
}

/// A plan with every path pre-resolved
pub struct CompiledPlan {
    source:        TypeName,
    destination:   TypeName,
    entries:       Vec<CompiledEntry>,
    complex_binds: Vec<Vec<CompiledRule>>,
}

impl CompiledPlan {
    /// Source type the getters were bound to
    pub const fn source(&self) -> &TypeName {
        &self.source
    }

    /// Destination type the setters were bound to
    pub const fn destination(&self) -> &TypeName {
        &self.destination
    }

    /// Apply to one pair
    pub fn run(
        &self,
        engine: &ExecutionEngine<'_>,
        source: &ObjectRef,
        destination: &ObjectRef,
        context: &mut MappingContext,
    ) {
        let source_value = Value::Object(source.clone());

        for entry in &self.entries {
            for getter in &entry.getters {
                let value = getter(&source_value);
                if value.is_null() {
                    continue;
                }
                if let Some(value) =
                    engine.run_converter(entry.converter.as_deref(), entry.resolved.as_ref(), value)
                {
                    (entry.setter)(engine, destination, value, context);
                } else {
                    trace!(path = %entry.destination, "converted value dropped");
                }
                break;
            }
        }

        for group in &self.complex_binds {
            for rule in group {
                let value = (rule.getter)(&source_value);
                if value.is_null() {
                    continue;
                }
                (rule.setter)(engine, destination, value, context);
                break;
            }
        }
    }
}

impl fmt::Debug for CompiledPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("entries", &self.entries.len())
            .field("complex_binds", &self.complex_binds.len())
            .finish()
    }
}

/// Memo key of a setter: destination type, lowercased path, expanded composite
type SetterKey = (TypeName, String, bool);

/// Compiled plans plus the getters and setters they are made of
///
/// Getters and setters are memoized by (type, path) and shared between plans.
#[derive(Default)]
pub struct CompiledCache {
    plans:   DashMap<(TypeName, TypeName), Arc<CompiledPlan>>,
    getters: DashMap<(TypeName, String), GetterFn>,
    setters: DashMap<SetterKey, Option<SetterFn>>,
}

impl CompiledCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled form of `plan`, compiling on first use
    ///
    /// Converters are looked up while compiling; registering a converter afterwards
    /// needs a [`Self::clear`] to take effect.
    pub fn get_or_compile(
        &self,
        engine: &ExecutionEngine<'_>,
        plan: &MappingPlan,
    ) -> Arc<CompiledPlan> {
        let key = (plan.source().clone(), plan.destination().clone());
        if let Some(compiled) = self.plans.get(&key) {
            return Arc::clone(compiled.value());
        }

        let compiled = Arc::new(self.compile(engine, plan));
        debug!(
            source = %plan.source(),
            destination = %plan.destination(),
            entries = compiled.entries.len(),
            "compiled mapping plan"
        );
        let stored = self.plans.entry(key).or_insert(compiled);
        Arc::clone(stored.value())
    }

    fn compile(&self, engine: &ExecutionEngine<'_>, plan: &MappingPlan) -> CompiledPlan {
        let separator = engine.resolver().separator();
        let entries = plan
            .entries()
            .iter()
            .filter_map(|entry| {
                let setter = self.setter(
                    engine,
                    plan.destination(),
                    entry.destination(),
                    entry.is_expanded(),
                )?;
                Some(CompiledEntry {
                    destination: entry.destination().to_string(),
                    getters:     entry
                        .candidates()
                        .iter()
                        .map(|candidate| {
                            self.getter(engine.registry(), separator, plan.source(), candidate)
                        })
                        .collect(),
                    setter,
                    converter:   entry.converter().map(ToString::to_string),
                    resolved:    entry
                        .converter()
                        .and_then(|name| engine.converters().get(name)),
                })
            })
            .collect();

        let complex_binds = plan
            .complex_binds()
            .iter()
            .map(|group| {
                group
                    .rules
                    .iter()
                    .map(|rule| CompiledRule {
                        getter: self.getter(engine.registry(), separator, plan.source(), &rule.source),
                        setter: self
                            .setter(engine, plan.destination(), &rule.destination, false)
                            .unwrap_or_else(unresolved_setter),
                    })
                    .collect()
            })
            .collect();

        CompiledPlan {
            source: plan.source().clone(),
            destination: plan.destination().clone(),
            entries,
            complex_binds,
        }
    }

    fn getter(
        &self,
        registry: &TypeRegistry,
        separator: &str,
        source: &TypeName,
        path: &str,
    ) -> GetterFn {
        let key = (source.clone(), path.to_lowercase());
        let getter = self
            .getters
            .entry(key)
            .or_insert_with(|| compile_getter(registry, separator, source, path));
        Arc::clone(getter.value())
    }

    /// `None` when `path` does not resolve under `destination`
    fn setter(
        &self,
        engine: &ExecutionEngine<'_>,
        destination: &TypeName,
        path: &str,
        expanded: bool,
    ) -> Option<SetterFn> {
        let key = (destination.clone(), path.to_lowercase(), expanded);
        let setter = self
            .setters
            .entry(key)
            .or_insert_with(|| compile_setter(engine, destination, path, expanded));
        setter.value().clone()
    }

    /// Number of compiled plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// No plan compiled yet
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every compiled plan, getter and setter
    pub fn clear(&self) {
        self.plans.clear();
        self.getters.clear();
        self.setters.clear();
    }
}

impl fmt::Debug for CompiledCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCache")
            .field("plans", &self.plans.len())
            .field("getters", &self.getters.len())
            .field("setters", &self.setters.len())
            .finish()
    }
}

/// Bind each step of `path` to a slot of the statically known type
fn compile_getter(
    registry: &TypeRegistry,
    separator: &str,
    source: &TypeName,
    path: &str,
) -> GetterFn {
    let Ok(segments) = parse_path(path, separator) else {
        trace!(path, "unparseable source path compiled to a null getter");
        return Arc::new(|_: &Value| Value::Null);
    };

    let mut current = Some(FieldType::Object(source.clone()));
    let mut steps = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            RawSegment::Field(name) => {
                let slot = current
                    .as_ref()
                    .and_then(FieldType::composite_type)
                    .and_then(|owner| registry.get(owner))
                    .and_then(|descriptor| {
                        let (index, field) = descriptor.field(&name)?;
                        let field_type = field.field_type().clone();
                        Some((Arc::clone(&descriptor), index, field_type))
                    });
                current = slot.as_ref().map(|(_, _, field_type)| field_type.clone());
                steps.push(GetStep::Field {
                    name,
                    slot: slot.map(|(descriptor, index, _)| (descriptor, index)),
                });
            }
            RawSegment::Index(index) => {
                current = current
                    .as_ref()
                    .and_then(FieldType::element_type)
                    .cloned();
                steps.push(GetStep::Element(index));
            }
        }
    }

    Arc::new(move |root: &Value| {
        let mut value = root.clone();
        for step in &steps {
            value = match (step, &value) {
                (
                    GetStep::Field {
                        slot: Some((descriptor, index)),
                        ..
                    },
                    Value::Object(object),
                ) if Arc::ptr_eq(object.descriptor(), descriptor) => object.get(*index),
                (GetStep::Field { name, .. }, Value::Object(object)) => object.get_by_name(name),
                (GetStep::Element(index), Value::List(list)) => list.get(*index),
                (GetStep::Element(index), Value::Array(array)) => array.get(*index),
                _ => None,
            }
            .unwrap_or_default();
            if value.is_null() {
                return Value::Null;
            }
        }
        value
    })
}

fn compile_setter(
    engine: &ExecutionEngine<'_>,
    destination: &TypeName,
    path: &str,
    expanded: bool,
) -> Option<SetterFn> {
    let Some(field_path) = engine.resolver().resolve(destination, path) else {
        trace!(path, "destination path not found");
        return None;
    };
    Some(Arc::new(
        move |engine: &ExecutionEngine<'_>,
              target: &ObjectRef,
              value: Value,
              context: &mut MappingContext| {
            engine.write_entry(target, &field_path, value, expanded, context)
        },
    ))
}

/// Complex-bind rules still consume their group when the destination is missing
fn unresolved_setter() -> SetterFn {
    Arc::new(|_: &ExecutionEngine<'_>, _: &ObjectRef, _: Value, _: &mut MappingContext| false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{person_value, registry_with_people};

    #[test]
    fn getters_match_the_name_walk() {
        let registry = registry_with_people();
        let person = person_value(&registry);
        let source = TypeName::from("Person");
        let resolver = crate::path::PathResolver::new(&registry, ".");

        for path in ["Name", "home.city", "Tags[1]", "Scores[2]", "Work.Street", "Nope", "Tags[x]"] {
            let getter = compile_getter(&registry, ".", &source, path);
            assert_eq!(getter(&person), resolver.get(&person, path), "{path}");
        }
    }

    #[test]
    fn getters_fall_back_to_names_for_other_descriptors() {
        let registry = registry_with_people();
        let getter = compile_getter(&registry, ".", &TypeName::from("Person"), "Name");

        let other = crate::registry::TypeDescriptor::structure("Person")
            .field(crate::registry::FieldDescriptor::new("Nickname", crate::test_support::string()))
            .field(crate::registry::FieldDescriptor::new("Name", crate::test_support::string()))
            .build();
        let object = ObjectRef::new(Arc::new(other), vec![Value::from("Bart"), Value::from("Lisa")]);

        assert_eq!(getter(&Value::Object(object)), Value::from("Lisa"));
    }

    fn configure_badge(configurator: &mut crate::registry::MappingConfigurator) {
        configurator.map_from("Nowhere", "Name");
    }

    #[test]
    fn unresolvable_destinations_are_not_compiled() {
        use crate::config::MapperConfig;
        use crate::convert::{ConversionRegistry, ConverterRegistry};
        use crate::plan::{PlanBuilder, PlanCache};
        use crate::registry::{FieldDescriptor, TypeDescriptor};

        let registry = registry_with_people();
        registry.register(
            TypeDescriptor::structure("Badge")
                .field(FieldDescriptor::new("Name", crate::test_support::string()))
                .configure(configure_badge)
                .build(),
        );
        let plans = PlanCache::new();
        let cache = CompiledCache::new();
        let converters = ConverterRegistry::new();
        let conversions = ConversionRegistry::with_builtins();
        let config = MapperConfig::default();
        let engine =
            ExecutionEngine::new(&registry, &plans, &cache, &converters, &conversions, &config);

        let plan = PlanBuilder::new(&registry, ".", config.max_depth)
            .build(&TypeName::from("Person"), &TypeName::from("Badge"))
            .unwrap();
        assert!(plan.entry("Nowhere").is_some());

        let compiled = cache.get_or_compile(&engine, &plan);
        let destinations: Vec<&str> = compiled
            .entries
            .iter()
            .map(|entry| entry.destination.as_str())
            .collect();
        assert_eq!(destinations, ["Name"]);
    }
}
