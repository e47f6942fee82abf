//! Converter pipeline
//!
//! Turns a source value into something assignable to a declared field type. The order
//! is fixed: null handling for optional targets, enum lookup, same-type passthrough, a
//! registered type-to-type conversion, then the general convertible fallback.
//! Collections are converted element-wise into fresh collections.

mod conversions;
mod converter;

pub use conversions::{ConversionFn, ConversionRegistry, convert_scalar};
pub use converter::{ConverterRegistry, PropertyConverter, SharedConverter};
use tracing::trace;

use crate::registry::{FieldType, TypeName, TypeRegistry};
use crate::value::{ArrayRef, EnumValue, ListRef, ScalarKind, Value};

/// Coerces a value for assignment into a slot of a declared type
///
/// `existing` is the slot's current value, which composite-aware coercers may map into
/// instead of allocating. `None` means the value is not assignable and the slot must be
/// left unchanged.
pub trait ValueCoercer {
    /// Coerce `value` for a slot declared as `target`
    fn coerce(&mut self, value: Value, target: &FieldType, existing: &Value) -> Option<Value>;
}

/// Scalar, enum and collection coercion against a registry
#[derive(Debug, Clone, Copy)]
pub struct ConversionPipeline<'a> {
    registry:    &'a TypeRegistry,
    conversions: &'a ConversionRegistry,
}

impl<'a> ConversionPipeline<'a> {
    /// Pipeline over the given registries
    pub const fn new(registry: &'a TypeRegistry, conversions: &'a ConversionRegistry) -> Self {
        Self {
            registry,
            conversions,
        }
    }

    /// Coerce without composite mapping
    ///
    /// Composites pass through only when they already have the target type.
    pub fn convert(&self, value: Value, target: &FieldType) -> Option<Value> {
        match target {
            FieldType::Nullable(inner) => {
                if value.is_null() || (inner.enum_type().is_some() && is_blank(&value)) {
                    return Some(Value::Null);
                }
                self.convert(value, inner)
            }
            _ if value.is_null() => None,
            FieldType::Scalar(kind) => self.convert_scalar(&value, *kind),
            FieldType::Enum(name) => self.convert_enum(&value, name),
            FieldType::Object(name) => value
                .as_object()
                .is_some_and(|object| object.type_name() == name)
                .then_some(value),
            FieldType::List(element) => {
                let items = self.convert_elements(&value, element)?;
                Some(Value::List(ListRef::new(items)))
            }
            FieldType::Array(element, _) => {
                let items = self.convert_elements(&value, element)?;
                if !target.accepts_len(items.len()) {
                    trace!(target = %target, len = items.len(), "array length does not fit");
                    return None;
                }
                Some(Value::Array(ArrayRef::new(items)))
            }
        }
    }

    /// Convert a non-null scalar into `kind`
    pub fn convert_scalar(&self, value: &Value, kind: ScalarKind) -> Option<Value> {
        if kind.accepts(value) {
            return Some(value.clone());
        }
        if let Value::Enum(enum_value) = value {
            return self.convert_enum_to_scalar(enum_value, kind);
        }
        if let Some(from) = ScalarKind::of(value)
            && let Some(conversion) = self.conversions.get(from, kind)
        {
            return conversion(value);
        }
        convert_scalar(value, kind)
    }

    /// Match a variant by name (case-insensitive), by source enum variant name, or by
    /// ordinal for integer sources
    pub fn convert_enum(&self, value: &Value, enum_type: &TypeName) -> Option<Value> {
        let descriptor = self.registry.get(enum_type)?;
        let variant = match value {
            Value::Enum(source) => descriptor.variant(&source.variant).map(|(_, v)| v),
            Value::String(text) => descriptor.variant(text.trim()).map(|(_, v)| v),
            Value::Int(_) | Value::UInt(_) => {
                let ordinal = match convert_scalar(value, ScalarKind::U64)? {
                    Value::UInt(u) => usize::try_from(u).ok()?,
                    _ => return None,
                };
                descriptor.variant_at(ordinal)
            }
            _ => None,
        };
        if variant.is_none() {
            trace!(enum_type = %enum_type, value = %value, "no matching enum variant");
        }
        variant.map(|name| Value::Enum(EnumValue::new(enum_type, name)))
    }

    fn convert_enum_to_scalar(&self, value: &EnumValue, kind: ScalarKind) -> Option<Value> {
        if kind == ScalarKind::String {
            return Some(Value::String(value.variant.clone()));
        }
        let ordinal = self
            .registry
            .get(&value.type_name)
            .and_then(|descriptor| descriptor.variant(&value.variant).map(|(index, _)| index))?;
        convert_scalar(&Value::UInt(u64::try_from(ordinal).ok()?), kind)
    }

    fn convert_elements(&self, value: &Value, element: &FieldType) -> Option<Vec<Value>> {
        value
            .elements()?
            .into_iter()
            .map(|item| self.convert(item, element))
            .collect()
    }
}

impl ValueCoercer for ConversionPipeline<'_> {
    fn coerce(&mut self, value: Value, target: &FieldType, _existing: &Value) -> Option<Value> {
        self.convert(value, target)
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}
