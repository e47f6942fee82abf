//! Bridge between typed Rust values and the dynamic object model

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{FieldType, TypeDescriptor, TypeRegistry};
use crate::value::{ArrayRef, ListRef, ScalarKind, Value};

/// A Rust type the mapper can read from and write into
///
/// Scalars, `Option`, `Vec`, fixed arrays and `Box` are covered here. Structs and
/// fieldless enums get an implementation from `#[derive(Mappable)]`.
pub trait Mappable: Sized + 'static {
    /// Declared type of a field holding `Self`
    fn field_type() -> FieldType;

    /// Register `Self` and every type it reaches
    ///
    /// Implementations must insert their own descriptor before recursing into field
    /// types so self-referential types terminate.
    fn register(_registry: &TypeRegistry) {}

    /// Descriptor for composite and enum types
    fn descriptor() -> Option<Arc<TypeDescriptor>> {
        None
    }

    /// Lift into the dynamic model
    fn to_value(&self) -> Value;

    /// Lower from the dynamic model; `None` when the shape does not fit
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_mappable_integer {
    ($($ty:ty => $kind:ident, $variant:ident, $wide:ty);* $(;)?) => {
        $(
            impl Mappable for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(<$wide>::from(*self))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => Self::try_from(*i).ok(),
                        Value::UInt(u) => Self::try_from(*u).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_mappable_integer! {
    i8 => I8, Int, i64;
    i16 => I16, Int, i64;
    i32 => I32, Int, i64;
    i64 => I64, Int, i64;
    u8 => U8, UInt, u64;
    u16 => U16, UInt, u64;
    u32 => U32, UInt, u64;
    u64 => U64, UInt, u64;
}

impl Mappable for f64 {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarKind::F64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl Mappable for f32 {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarKind::F32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "f32 fields are written from f32-ranged values"
    )]
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f as Self),
            _ => None,
        }
    }
}

macro_rules! impl_mappable_scalar {
    ($($ty:ty => $kind:ident, $variant:ident);* $(;)?) => {
        $(
            impl Mappable for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_mappable_scalar! {
    bool => Bool, Bool;
    char => Char, Char;
    String => String, String;
    Decimal => Decimal, Decimal;
    DateTime<Utc> => DateTime, DateTime;
    DateTime<FixedOffset> => DateTimeOffset, DateTimeOffset;
    NaiveDate => Date, Date;
    Uuid => Uuid, Uuid;
}

impl<T: Mappable> Mappable for Option<T> {
    fn field_type() -> FieldType {
        FieldType::nullable(T::field_type())
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Mappable::to_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: Mappable> Mappable for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }

    fn descriptor() -> Option<Arc<TypeDescriptor>> {
        T::descriptor()
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }

    fn to_value(&self) -> Value {
        Value::List(ListRef::new(self.iter().map(Mappable::to_value).collect()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .elements()?
            .iter()
            .map(T::from_value)
            .collect::<Option<Self>>()
    }
}

impl<T: Mappable, const N: usize> Mappable for [T; N] {
    fn field_type() -> FieldType {
        FieldType::fixed_array(T::field_type(), N)
    }

    fn register(registry: &TypeRegistry) {
        T::register(registry);
    }

    fn to_value(&self) -> Value {
        Value::Array(ArrayRef::new(self.iter().map(Mappable::to_value).collect()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        let items = value
            .elements()?
            .iter()
            .map(T::from_value)
            .collect::<Option<Vec<T>>>()?;
        items.try_into().ok()
    }
}
