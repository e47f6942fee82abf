//! Flattened path-to-value maps and their reconstruction

use std::collections::{BTreeMap, HashMap, HashSet};

use error_stack::Report;
use tracing::trace;

use crate::constants::{ELEMENT_WILDCARD, ROOT_VALUE_KEY};
use crate::convert::{ConversionPipeline, ConversionRegistry, ValueCoercer};
use crate::error::{Error, Result};
use crate::path::{ArrayMode, PathResolver};
use crate::registry::{FieldType, TypeRegistry};
use crate::value::{ArrayRef, ListRef, ObjectId, ObjectRef, Value};

/// One flattened entry
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedProperty {
    path:          String,
    value:         Value,
    declared_type: FieldType,
}

impl FlattenedProperty {
    /// Path from the flattened root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stored value; null for structure-only entries
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Type declared where the value was found
    pub const fn declared_type(&self) -> &FieldType {
        &self.declared_type
    }
}

/// Orders entries shallow-first, then lexically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct FlatKey {
    depth: usize,
    path:  String,
}

/// Flat map from path strings to values
///
/// Lookup is case-insensitive. Iteration visits shallower paths first, so parents are
/// always seen before their children.
#[derive(Debug, Clone)]
pub struct FlattenResult {
    root_type:  Option<FieldType>,
    separator:  String,
    properties: BTreeMap<FlatKey, FlattenedProperty>,
    lookup:     HashMap<String, FlatKey>,
}

impl FlattenResult {
    pub(crate) fn new(root_type: Option<FieldType>, separator: &str) -> Self {
        Self {
            root_type,
            separator: separator.to_string(),
            properties: BTreeMap::new(),
            lookup: HashMap::new(),
        }
    }

    /// Add or replace an entry; a later insert of the same path wins
    pub(crate) fn insert(&mut self, path: String, value: Value, declared_type: FieldType) {
        let key = FlatKey {
            depth: segment_count(&path, &self.separator),
            path:  path.clone(),
        };
        if let Some(previous) = self.lookup.insert(path.to_lowercase(), key.clone()) {
            self.properties.remove(&previous);
        }
        self.properties.insert(
            key,
            FlattenedProperty {
                path,
                value,
                declared_type,
            },
        );
    }

    /// Declared type of the flattened root; `None` when a null root was flattened
    pub const fn root_type(&self) -> Option<&FieldType> {
        self.root_type.as_ref()
    }

    /// Separator the paths were built with
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Entry for `path`, matched case-insensitively
    pub fn get(&self, path: &str) -> Option<&FlattenedProperty> {
        let key = self.lookup.get(&path.to_lowercase())?;
        self.properties.get(key)
    }

    /// Value stored for `path`
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.get(path).map(FlattenedProperty::value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// No entries
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Entries shallow-first
    pub fn iter(&self) -> impl Iterator<Item = &FlattenedProperty> {
        self.properties.values()
    }

    /// Paths shallow-first
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.properties.values().map(FlattenedProperty::path)
    }

    /// Build a fresh graph of the root type from the stored entries
    ///
    /// Entries are applied shallow-first. Collections are recreated as empty growable
    /// placeholders that their indexed entries fill; fixed-size arrays are converted back
    /// once every entry is applied. Structure-only `[*]` entries and paths that no
    /// longer resolve are skipped.
    pub fn rehydrate(
        &self,
        registry: &TypeRegistry,
        conversions: &ConversionRegistry,
    ) -> Result<Value> {
        let Some(root_type) = &self.root_type else {
            return Err(Report::new(Error::missing("root type to rehydrate")));
        };
        let pipeline = ConversionPipeline::new(registry, conversions);

        match root_type.non_nullable() {
            FieldType::Object(type_name) => {
                let instance = registry.instantiate(type_name)?;
                let resolver = PathResolver::new(registry, &self.separator);
                let mut coercer = PlaceholderCoercer { pipeline };

                for property in self.iter() {
                    if property.path.contains(ELEMENT_WILDCARD) {
                        continue;
                    }
                    let Some(path) = resolver.resolve(type_name, &property.path) else {
                        trace!(path = %property.path, "flattened path no longer resolves");
                        continue;
                    };
                    let value = if property.value.is_collection() {
                        Value::List(ListRef::default())
                    } else {
                        property.value.clone()
                    };
                    resolver.set(&instance, &path, value, &mut coercer, ArrayMode::Deferred);
                }

                finalize_arrays(registry, &instance, &mut HashSet::new());
                Ok(Value::Object(instance))
            }
            FieldType::Scalar(_) | FieldType::Enum(_) => {
                let value = self.value(ROOT_VALUE_KEY).cloned().unwrap_or_default();
                Ok(pipeline.convert(value, root_type).unwrap_or_default())
            }
            other => Err(Report::new(Error::invalid(
                "rehydrate root",
                format!("{other} is not a composite or scalar"),
            ))),
        }
    }
}

/// Lets empty list placeholders through into list and array slots; everything else goes
/// through the normal pipeline
struct PlaceholderCoercer<'a> {
    pipeline: ConversionPipeline<'a>,
}

impl ValueCoercer for PlaceholderCoercer<'_> {
    fn coerce(&mut self, value: Value, target: &FieldType, _existing: &Value) -> Option<Value> {
        if let Value::List(list) = &value
            && list.is_empty()
            && target.is_collection()
        {
            return Some(value);
        }
        self.pipeline.convert(value, target)
    }
}

/// Convert list placeholders sitting in array-typed slots back into arrays
fn finalize_arrays(registry: &TypeRegistry, object: &ObjectRef, visited: &mut HashSet<ObjectId>) {
    if !visited.insert(object.id()) {
        return;
    }
    for (index, field) in object.descriptor().fields().iter().enumerate() {
        let Some(current) = object.get(index) else {
            continue;
        };
        let current = settle(registry, current, field.field_type());
        if let Some(settled) = &current.replaced {
            object.set(index, settled.clone());
        }
        finalize_value(registry, &current.value, field.field_type(), visited);
    }
}

fn finalize_value(
    registry: &TypeRegistry,
    value: &Value,
    declared: &FieldType,
    visited: &mut HashSet<ObjectId>,
) {
    match value {
        Value::Object(object) => finalize_arrays(registry, object, visited),
        Value::List(_) | Value::Array(_) => {
            let Some(element_type) = declared.element_type() else {
                return;
            };
            let Some(elements) = value.elements() else {
                return;
            };
            for (index, element) in elements.into_iter().enumerate() {
                let element = settle(registry, element, element_type);
                if let Some(settled) = &element.replaced {
                    match value {
                        Value::List(list) => {
                            list.set(index, settled.clone());
                        }
                        Value::Array(array) => {
                            array.set(index, settled.clone());
                        }
                        _ => {}
                    }
                }
                finalize_value(registry, &element.value, element_type, visited);
            }
        }
        _ => {}
    }
}

struct Settled {
    value:    Value,
    replaced: Option<Value>,
}

/// Fixed-size arrays are padded with defaults or cut to their declared length
fn settle(registry: &TypeRegistry, value: Value, declared: &FieldType) -> Settled {
    match (&value, declared.non_nullable()) {
        (Value::List(list), FieldType::Array(element, len)) => {
            let mut items = list.snapshot();
            if let Some(len) = *len {
                items.truncate(len);
                while items.len() < len {
                    items.push(registry.default_for(element));
                }
            }
            let array = Value::Array(ArrayRef::new(items));
            Settled {
                value:    array.clone(),
                replaced: Some(array),
            }
        }
        _ => Settled {
            value,
            replaced: None,
        },
    }
}

/// Depth of a flattened path: one per field segment and one per indexer
fn segment_count(path: &str, separator: &str) -> usize {
    if path.is_empty() {
        return 0;
    }
    let fields = path
        .split(separator)
        .filter(|piece| !piece.is_empty() && !piece.starts_with('['))
        .count();
    fields + path.matches('[').count()
}
