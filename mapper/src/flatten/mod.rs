//! Flattening object graphs into path maps
//!
//! Every reachable leaf ends up under its dotted path. Collections are stored twice: the
//! raw collection under its own path and each element under `path[i]`. Composites have
//! no entry of their own; only their fields do.
//!
//! The cycle guard tracks the handles on the current path only, so a sub-graph shared
//! by two fields is flattened under both while a back-reference is dropped.

mod flatten_result;

use std::collections::HashSet;

pub use flatten_result::{FlattenResult, FlattenedProperty};
use tracing::debug;

use crate::constants::{ELEMENT_WILDCARD, ROOT_VALUE_KEY, RecursionDepth};
use crate::error::Result;
use crate::registry::{FieldType, TypeName, TypeRegistry};
use crate::value::{ObjectId, ScalarKind, Value};

/// Flattens values and type shapes into [`FlattenResult`]s
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    registry:  &'a TypeRegistry,
    separator: &'a str,
    max_depth: usize,
}

impl<'a> Flattener<'a> {
    /// Flattener joining paths with `separator` and giving up below `max_depth`
    pub const fn new(registry: &'a TypeRegistry, separator: &'a str, max_depth: usize) -> Self {
        Self {
            registry,
            separator,
            max_depth,
        }
    }

    /// Flatten `value`
    ///
    /// `declared` is the type the value is known as; without it the runtime type is used.
    /// A null value flattens to an empty result.
    pub fn flatten(&self, value: &Value, declared: Option<&FieldType>) -> FlattenResult {
        if value.is_null() {
            return FlattenResult::new(None, self.separator);
        }
        let root_type = declared.cloned().or_else(|| runtime_type(value));
        let mut result = FlattenResult::new(root_type.clone(), self.separator);
        let mut on_path = HashSet::new();
        self.flatten_value(
            value,
            "",
            root_type.as_ref(),
            &mut on_path,
            RecursionDepth::ZERO,
            &mut result,
        );
        result
    }

    /// Every path the type can hold, each with a null value
    ///
    /// Collection elements appear once under `path[*]`. A type already being expanded
    /// further up the same branch is not expanded again.
    pub fn flatten_structure(&self, root: &TypeName) -> Result<FlattenResult> {
        self.registry.require(root)?;
        let root_type = FieldType::Object(root.clone());
        let mut result = FlattenResult::new(Some(root_type.clone()), self.separator);
        let mut on_path = Vec::new();
        self.flatten_type(
            &root_type,
            "",
            &mut on_path,
            RecursionDepth::ZERO,
            &mut result,
        );
        Ok(result)
    }

    fn flatten_value(
        &self,
        value: &Value,
        prefix: &str,
        declared: Option<&FieldType>,
        on_path: &mut HashSet<ObjectId>,
        depth: RecursionDepth,
        out: &mut FlattenResult,
    ) {
        if depth.exceeds_limit(self.max_depth) {
            debug!(path = prefix, depth = %depth, "flatten depth limit reached");
            return;
        }

        if let Some(id) = value.identity()
            && !on_path.insert(id)
        {
            debug!(path = prefix, "cycle detected, branch omitted");
            return;
        }

        match value {
            Value::Object(object) => {
                let descriptor = object.descriptor();
                for (index, field) in descriptor.fields().iter().enumerate() {
                    let key = self.join(prefix, field.name());
                    let slot = object.get(index).unwrap_or_default();
                    if slot.is_null() || slot.is_scalar() || field.field_type().is_leaf() {
                        out.insert(key, slot, field.field_type().clone());
                    } else {
                        self.flatten_value(
                            &slot,
                            &key,
                            Some(field.field_type()),
                            on_path,
                            depth.increment(),
                            out,
                        );
                    }
                }
            }
            Value::List(_) | Value::Array(_) => {
                let key = root_or(prefix);
                if let Some(field_type) = declared.cloned().or_else(|| runtime_type(value)) {
                    out.insert(key.clone(), value.clone(), field_type);
                }
                let element_type = declared.and_then(FieldType::element_type);
                for (index, element) in value.elements().unwrap_or_default().iter().enumerate() {
                    let element_key = if prefix.is_empty() {
                        format!("[{index}]")
                    } else {
                        format!("{prefix}[{index}]")
                    };
                    self.flatten_value(
                        element,
                        &element_key,
                        element_type,
                        on_path,
                        depth.increment(),
                        out,
                    );
                }
            }
            _ => match declared.cloned().or_else(|| runtime_type(value)) {
                Some(field_type) => out.insert(root_or(prefix), value.clone(), field_type),
                None => debug!(path = prefix, "untyped null element skipped"),
            },
        }

        if let Some(id) = value.identity() {
            on_path.remove(&id);
        }
    }

    fn flatten_type(
        &self,
        field_type: &FieldType,
        prefix: &str,
        on_path: &mut Vec<TypeName>,
        depth: RecursionDepth,
        out: &mut FlattenResult,
    ) {
        if depth.exceeds_limit(self.max_depth) {
            debug!(path = prefix, depth = %depth, "structure depth limit reached");
            return;
        }

        match field_type.non_nullable() {
            FieldType::Scalar(_) | FieldType::Enum(_) => {
                out.insert(root_or(prefix), Value::Null, field_type.clone());
            }
            FieldType::List(element) | FieldType::Array(element, _) => {
                out.insert(root_or(prefix), Value::Null, field_type.clone());
                let element_key = format!("{prefix}{ELEMENT_WILDCARD}");
                self.flatten_type(element, &element_key, on_path, depth.increment(), out);
            }
            FieldType::Object(type_name) => {
                if on_path.contains(type_name) {
                    return;
                }
                let Some(descriptor) = self.registry.get(type_name) else {
                    debug!(type_name = %type_name, "unregistered type skipped in structure");
                    return;
                };
                on_path.push(type_name.clone());
                for field in descriptor.fields() {
                    let key = self.join(prefix, field.name());
                    self.flatten_type(field.field_type(), &key, on_path, depth.increment(), out);
                }
                on_path.pop();
            }
            FieldType::Nullable(_) => {}
        }
    }

    fn join(&self, prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}{}{name}", self.separator)
        }
    }
}

fn root_or(prefix: &str) -> String {
    if prefix.is_empty() {
        ROOT_VALUE_KEY.to_string()
    } else {
        prefix.to_string()
    }
}

/// Declared type inferred from a runtime value
///
/// Collections take the type of their first non-null element; untyped nulls and empty
/// collections have none.
pub fn runtime_type(value: &Value) -> Option<FieldType> {
    match value {
        Value::Null => None,
        Value::Object(object) => Some(FieldType::Object(object.type_name().clone())),
        Value::Enum(enum_value) => Some(FieldType::Enum(enum_value.type_name.clone())),
        Value::List(_) | Value::Array(_) => {
            let element = value
                .elements()?
                .iter()
                .find(|element| !element.is_null())
                .and_then(runtime_type)?;
            Some(if matches!(value, Value::List(_)) {
                FieldType::list(element)
            } else {
                FieldType::array(element)
            })
        }
        scalar => ScalarKind::of(scalar).map(FieldType::Scalar),
    }
}
