//! Resolved paths and the read/write walk over object graphs

use std::fmt;

use tracing::trace;

use super::parser::{RawSegment, parse_path};
use crate::convert::ValueCoercer;
use crate::registry::{FieldType, TypeName, TypeRegistry};
use crate::value::{ArrayRef, ListRef, ObjectRef, Value};

/// How one resolved step reaches its value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Field of a composite, with its canonical name and slot
    Field {
        /// Declared field name
        name: String,
        /// Slot index in the declaring type
        slot: usize,
    },
    /// Element of a list or array
    Element(usize),
}

/// One resolved step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedSegment {
    /// How the step is taken
    pub accessor:   Accessor,
    /// Type declared for the value the step reaches
    pub field_type: FieldType,
}

/// A path resolved against a root type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    root:     TypeName,
    segments: Vec<ResolvedSegment>,
}

impl FieldPath {
    /// Root type the path was resolved against
    pub const fn root(&self) -> &TypeName {
        &self.root
    }

    /// Resolved steps
    pub fn segments(&self) -> &[ResolvedSegment] {
        &self.segments
    }

    /// Declared type at the end of the path
    pub fn leaf_type(&self) -> Option<&FieldType> {
        self.segments.last().map(|segment| &segment.field_type)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.root)?;
        for (position, segment) in self.segments.iter().enumerate() {
            match &segment.accessor {
                Accessor::Field { name, .. } if position == 0 => write!(f, "{name}")?,
                Accessor::Field { name, .. } => write!(f, ".{name}")?,
                Accessor::Element(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// How writes through an indexer treat fixed-size arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMode {
    /// Reallocate the array in place when the index is past the end
    #[default]
    Immediate,
    /// Swap the array for a growable list; a later pass converts it back
    Deferred,
}

/// Where a value lives, so it can be replaced after a read
enum Slot {
    Field(ObjectRef, usize),
    ListElement(ListRef, usize),
    ArrayElement(ArrayRef, usize),
}

impl Slot {
    fn read(&self) -> Value {
        match self {
            Self::Field(object, index) => object.get(*index),
            Self::ListElement(list, index) => list.get(*index),
            Self::ArrayElement(array, index) => array.get(*index),
        }
        .unwrap_or_default()
    }

    fn write(&self, value: Value) -> bool {
        match self {
            Self::Field(object, index) => object.set(*index, value),
            Self::ListElement(list, index) => list.set(*index, value),
            Self::ArrayElement(array, index) => array.set(*index, value),
        }
    }
}

/// Resolves, reads and writes paths against registered types
#[derive(Clone, Copy)]
pub struct PathResolver<'a> {
    registry:  &'a TypeRegistry,
    separator: &'a str,
}

impl<'a> PathResolver<'a> {
    /// Resolver over `registry` splitting paths on `separator`
    pub const fn new(registry: &'a TypeRegistry, separator: &'a str) -> Self {
        Self {
            registry,
            separator,
        }
    }

    /// Configured separator
    pub const fn separator(&self) -> &'a str {
        self.separator
    }

    /// Bind each segment of `path` to a field slot and declared type
    ///
    /// Fails closed: `None` when the path does not parse, a field is missing, or an
    /// indexer is applied to something that is not a collection.
    pub fn resolve(&self, root: &TypeName, path: &str) -> Option<FieldPath> {
        let raw = parse_path(path, self.separator).ok()?;
        let mut current = FieldType::Object(root.clone());
        let mut segments = Vec::with_capacity(raw.len());

        for step in raw {
            let resolved = match step {
                RawSegment::Field(name) => {
                    let owner = current.composite_type()?;
                    let descriptor = self.registry.get(owner)?;
                    let (slot, field) = descriptor.field(&name)?;
                    ResolvedSegment {
                        accessor:   Accessor::Field {
                            name: field.name().to_string(),
                            slot,
                        },
                        field_type: field.field_type().clone(),
                    }
                }
                RawSegment::Index(index) => {
                    if current.fixed_len().is_some_and(|len| index >= len) {
                        return None;
                    }
                    ResolvedSegment {
                        accessor:   Accessor::Element(index),
                        field_type: current.element_type()?.clone(),
                    }
                }
            };
            current = resolved.field_type.clone();
            segments.push(resolved);
        }

        Some(FieldPath {
            root: root.clone(),
            segments,
        })
    }

    /// Read the value at `path` by walking field names on the runtime graph
    ///
    /// Returns null as soon as any step is missing, null, out of range, or not the
    /// shape the step needs.
    pub fn get(&self, root: &Value, path: &str) -> Value {
        let Ok(raw) = parse_path(path, self.separator) else {
            trace!(path, "unparseable source path");
            return Value::Null;
        };
        let mut current = root.clone();
        for step in &raw {
            current = match (step, &current) {
                (RawSegment::Field(name), Value::Object(object)) => {
                    object.get_by_name(name).unwrap_or_default()
                }
                (RawSegment::Index(index), Value::List(list)) => list.get(*index).unwrap_or_default(),
                (RawSegment::Index(index), Value::Array(array)) => {
                    array.get(*index).unwrap_or_default()
                }
                _ => Value::Null,
            };
            if current.is_null() {
                return Value::Null;
            }
        }
        current
    }

    /// Read the value at a resolved path
    ///
    /// Steps use the resolved slot when the runtime object has the declaring type and
    /// fall back to a name lookup otherwise.
    pub fn get_resolved(&self, root: &Value, path: &FieldPath) -> Value {
        let mut owner = path.root();
        let mut current = root.clone();
        for segment in path.segments() {
            current = match (&segment.accessor, &current) {
                (Accessor::Field { name, slot }, Value::Object(object)) => {
                    if object.type_name() == owner {
                        object.get(*slot)
                    } else {
                        object.get_by_name(name)
                    }
                    .unwrap_or_default()
                }
                (Accessor::Element(index), Value::List(list)) => list.get(*index).unwrap_or_default(),
                (Accessor::Element(index), Value::Array(array)) => {
                    array.get(*index).unwrap_or_default()
                }
                _ => Value::Null,
            };
            if current.is_null() {
                return Value::Null;
            }
            if let Some(next_owner) = segment.field_type.composite_type() {
                owner = next_owner;
            }
        }
        current
    }

    /// Write `value` at `path` under `root`
    ///
    /// The terminal value goes through `coercer` first, against whatever currently sits
    /// at the path, so a coercion failure or an unreachable path leaves the destination
    /// untouched. Only then are null intermediates default-constructed and lists grown
    /// with default elements on the way down. Returns whether a write happened.
    pub fn set(
        &self,
        root: &ObjectRef,
        path: &FieldPath,
        value: Value,
        coercer: &mut dyn ValueCoercer,
        arrays: ArrayMode,
    ) -> bool {
        let (Some(existing), Some(leaf_type)) = (self.peek(root, path), path.leaf_type()) else {
            trace!(path = %path, "destination not reachable");
            return false;
        };
        let Some(coerced) = coercer.coerce(value, leaf_type, &existing) else {
            trace!(path = %path, "coercion failed, destination left unchanged");
            return false;
        };
        self.commit(root, path, coerced, arrays)
    }

    /// Current value at `path` without modifying anything
    ///
    /// Null once the walk reaches a null or missing intermediate that [`Self::commit`]
    /// would build; `None` when the path cannot be reached at all.
    fn peek(&self, root: &ObjectRef, path: &FieldPath) -> Option<Value> {
        let segments = path.segments();
        let mut current = Value::Object(root.clone());

        for (position, segment) in segments.iter().enumerate() {
            let next = match (&segment.accessor, &current) {
                (Accessor::Field { name, .. }, Value::Object(object)) => {
                    let (index, _) = object.descriptor().field(name)?;
                    object.get(index).unwrap_or_default()
                }
                (Accessor::Element(index), Value::List(list)) => list.get(*index).unwrap_or_default(),
                (Accessor::Element(index), Value::Array(array)) => {
                    array.get(*index).unwrap_or_default()
                }
                _ => return None,
            };
            if position + 1 == segments.len() {
                return Some(next);
            }
            if next.is_null() {
                let pending = segments.get(position..segments.len() - 1)?;
                return pending
                    .iter()
                    .all(|segment| self.can_construct(&segment.field_type))
                    .then_some(Value::Null);
            }
            current = next;
        }
        None
    }

    fn can_construct(&self, field_type: &FieldType) -> bool {
        match field_type.composite_type() {
            Some(type_name) => self
                .registry
                .get(type_name)
                .is_some_and(|descriptor| !descriptor.is_enum()),
            None => field_type.is_collection(),
        }
    }

    /// Walk `path` building what is missing and store `value` at its end
    fn commit(&self, root: &ObjectRef, path: &FieldPath, value: Value, arrays: ArrayMode) -> bool {
        let segments = path.segments();
        let mut container = Value::Object(root.clone());

        for (position, segment) in segments.iter().enumerate() {
            let Some(slot) = self.slot_for(&container, segment) else {
                trace!(path = %path, position, "destination step not reachable");
                return false;
            };

            if position + 1 == segments.len() {
                return slot.write(value);
            }

            let mut next = slot.read();
            if next.is_null() {
                let Some(built) = self.registry.construct(&segment.field_type) else {
                    trace!(path = %path, position, "cannot construct intermediate");
                    return false;
                };
                slot.write(built.clone());
                next = built;
            }

            // A deferred array about to be indexed becomes a growable placeholder
            if arrays == ArrayMode::Deferred
                && let Value::Array(array) = &next
                && matches!(
                    segments.get(position + 1).map(|s| &s.accessor),
                    Some(Accessor::Element(_))
                )
            {
                let placeholder = Value::List(ListRef::new(array.snapshot()));
                slot.write(placeholder.clone());
                next = placeholder;
            }

            container = next;
        }

        false
    }

    fn slot_for(&self, container: &Value, segment: &ResolvedSegment) -> Option<Slot> {
        match (&segment.accessor, container) {
            (Accessor::Field { name, .. }, Value::Object(object)) => {
                let (index, _) = object.descriptor().field(name)?;
                Some(Slot::Field(object.clone(), index))
            }
            (Accessor::Element(index), Value::List(list)) => {
                list.grow_to(index + 1, || self.registry.default_for(&segment.field_type));
                Some(Slot::ListElement(list.clone(), *index))
            }
            (Accessor::Element(index), Value::Array(array)) => {
                array.grow_to(index + 1, || self.registry.default_for(&segment.field_type));
                Some(Slot::ArrayElement(array.clone(), *index))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::convert::{ConversionPipeline, ConversionRegistry};
    use crate::test_support::{person_value, registry_with_people};
    use crate::value::ScalarKind;

    #[test]
    fn resolve_binds_slots_and_types() {
        let registry = registry_with_people();
        let resolver = PathResolver::new(&registry, ".");
        let path = resolver
            .resolve(&TypeName::from("Person"), "home.street")
            .unwrap();

        assert_eq!(
            path.segments()[1].accessor,
            Accessor::Field {
                name: "Street".into(),
                slot: 0,
            }
        );
        assert_eq!(
            path.leaf_type(),
            Some(&FieldType::Scalar(ScalarKind::String))
        );
        assert_eq!(path.to_string(), "Person:Home.Street");
    }

    #[test]
    fn resolve_fails_closed() {
        let registry = registry_with_people();
        let resolver = PathResolver::new(&registry, ".");
        let person = TypeName::from("Person");
        assert!(resolver.resolve(&person, "Home.Missing").is_none());
        assert!(resolver.resolve(&person, "Name[0]").is_none());
        assert!(resolver.resolve(&person, "Tags[0].Length").is_none());
        assert!(resolver.resolve(&person, "Tags[3]").is_some());
    }

    #[test]
    fn get_walks_names_case_insensitively() {
        let registry = registry_with_people();
        let resolver = PathResolver::new(&registry, ".");
        let person = person_value(&registry);

        assert_eq!(resolver.get(&person, "HOME.city"), Value::from("Springfield"));
        assert_eq!(resolver.get(&person, "Tags[1]"), Value::from("blue"));
        assert!(resolver.get(&person, "Tags[9]").is_null());
        assert!(resolver.get(&person, "Work.City").is_null());
        assert!(resolver.get(&person, "Name.Length").is_null());
    }

    #[test]
    fn get_resolved_matches_get() {
        let registry = registry_with_people();
        let resolver = PathResolver::new(&registry, ".");
        let person = person_value(&registry);
        let path = resolver
            .resolve(&TypeName::from("Person"), "Home.City")
            .unwrap();
        assert_eq!(resolver.get_resolved(&person, &path), resolver.get(&person, "Home.City"));
    }

    #[test]
    fn set_constructs_null_intermediates() {
        let registry = registry_with_people();
        let conversions = ConversionRegistry::with_builtins();
        let mut pipeline = ConversionPipeline::new(&registry, &conversions);
        let resolver = PathResolver::new(&registry, ".");
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();
        let path = resolver
            .resolve(&TypeName::from("Person"), "Work.City")
            .unwrap();

        assert!(resolver.set(&person, &path, Value::from("Shelbyville"), &mut pipeline, ArrayMode::Immediate));
        assert_eq!(
            resolver.get(&Value::Object(person), "Work.City"),
            Value::from("Shelbyville")
        );
    }

    #[test]
    fn set_grows_lists_and_arrays() {
        let registry = registry_with_people();
        let conversions = ConversionRegistry::with_builtins();
        let mut pipeline = ConversionPipeline::new(&registry, &conversions);
        let resolver = PathResolver::new(&registry, ".");
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();
        let root = TypeName::from("Person");

        let tags = resolver.resolve(&root, "Tags[2]").unwrap();
        assert!(resolver.set(&person, &tags, Value::from("green"), &mut pipeline, ArrayMode::Immediate));
        let tags = person.get_by_name("Tags").unwrap();
        assert!(matches!(tags, Value::List(_)));
        assert_eq!(
            tags.elements().unwrap(),
            vec![Value::from(""), Value::from(""), Value::from("green")]
        );

        let scores = resolver.resolve(&root, "Scores[1]").unwrap();
        assert!(resolver.set(&person, &scores, Value::Int(9), &mut pipeline, ArrayMode::Immediate));
        let scores = person.get_by_name("Scores").unwrap();
        assert!(matches!(scores, Value::Array(_)));
        assert_eq!(scores.elements().unwrap(), vec![Value::Int(0), Value::Int(9)]);
    }

    #[test]
    fn deferred_arrays_become_lists() {
        let registry = registry_with_people();
        let conversions = ConversionRegistry::with_builtins();
        let mut pipeline = ConversionPipeline::new(&registry, &conversions);
        let resolver = PathResolver::new(&registry, ".");
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();
        person.set_by_name("Scores", Value::Array(ArrayRef::new(vec![Value::Int(4)])));
        let path = resolver
            .resolve(&TypeName::from("Person"), "Scores[1]")
            .unwrap();

        assert!(resolver.set(&person, &path, Value::Int(5), &mut pipeline, ArrayMode::Deferred));
        let scores = person.get_by_name("Scores").unwrap();
        assert!(matches!(scores, Value::List(_)));
        assert_eq!(scores.elements().unwrap(), vec![Value::Int(4), Value::Int(5)]);
    }

    #[test]
    fn failed_coercion_builds_no_intermediates() {
        let registry = registry_with_people();
        let conversions = ConversionRegistry::with_builtins();
        let mut pipeline = ConversionPipeline::new(&registry, &conversions);
        let resolver = PathResolver::new(&registry, ".");
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();
        let root = TypeName::from("Person");

        let work = resolver.resolve(&root, "Work.Street").unwrap();
        assert!(!resolver.set(&person, &work, Value::Null, &mut pipeline, ArrayMode::Immediate));
        assert!(person.get_by_name("Work").unwrap().is_null());

        let tags = resolver.resolve(&root, "Tags[3]").unwrap();
        assert!(!resolver.set(&person, &tags, Value::Null, &mut pipeline, ArrayMode::Immediate));
        assert_eq!(person.get_by_name("Tags").unwrap().elements().unwrap().len(), 0);
    }

    #[test]
    fn failed_coercion_leaves_destination_untouched() {
        let registry = registry_with_people();
        let conversions = ConversionRegistry::with_builtins();
        let mut pipeline = ConversionPipeline::new(&registry, &conversions);
        let resolver = PathResolver::new(&registry, ".");
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();
        person.set_by_name("Age", Value::Int(41));
        let path = resolver.resolve(&TypeName::from("Person"), "Age").unwrap();

        assert!(!resolver.set(&person, &path, Value::from("forty"), &mut pipeline, ArrayMode::Immediate));
        assert_eq!(person.get_by_name("Age").unwrap(), Value::Int(41));
    }
}
