//! Dynamic object model the engine reads and writes
//!
//! Graphs are expressed as [`Value`] trees whose composite nodes are shared handles
//! ([`ObjectRef`], [`ListRef`], [`ArrayRef`]). Sharing lets one graph reuse a sub-graph
//! or point back at an ancestor, and gives every composite an identity the cycle guards
//! key on. Typed structs cross into this model through [`Mappable`](crate::Mappable).

mod handles;
mod scalar;

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
pub use handles::{ArrayRef, ListRef, ObjectId, ObjectRef};
use rust_decimal::Decimal;
pub use scalar::ScalarKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::TypeName;

/// A node in an object graph
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    UInt(u64),
    /// Floating point number of any width
    Float(f64),
    /// Exact decimal
    Decimal(Decimal),
    /// Single character
    Char(char),
    /// Text
    String(String),
    /// Instant in UTC
    DateTime(DateTime<Utc>),
    /// Instant with a fixed offset
    DateTimeOffset(DateTime<FixedOffset>),
    /// Calendar date
    Date(NaiveDate),
    /// UUID
    Uuid(Uuid),
    /// Variant of a registered enum type
    Enum(EnumValue),
    /// Growable collection
    List(ListRef),
    /// Fixed-size collection
    Array(ArrayRef),
    /// Composite instance
    Object(ObjectRef),
}

/// A variant of a registered enum type, by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    /// Enum type the variant belongs to
    pub type_name: TypeName,
    /// Variant name as registered
    pub variant:   String,
}

impl EnumValue {
    /// Create an enum value
    pub fn new(type_name: impl Into<TypeName>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant:   variant.into(),
        }
    }
}

impl Value {
    /// Null check
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Leaf values: everything except null, collections and composites
    pub const fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Self::Null | Self::List(_) | Self::Array(_) | Self::Object(_)
        )
    }

    /// List or array
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Array(_))
    }

    /// Object instance
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Reference identity for collections and composites
    pub fn identity(&self) -> Option<ObjectId> {
        match self {
            Self::List(list) => Some(list.id()),
            Self::Array(array) => Some(array.id()),
            Self::Object(object) => Some(object.id()),
            _ => None,
        }
    }

    /// Composite handle if this is an object
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Text if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Snapshot of the elements of a list or array
    pub fn elements(&self) -> Option<Vec<Self>> {
        match self {
            Self::List(list) => Some(list.snapshot()),
            Self::Array(array) => Some(array.snapshot()),
            _ => None,
        }
    }

    /// Textual rendering of a scalar, `None` for null, collections and composites
    pub fn display_scalar(&self) -> Option<String> {
        let text = match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Char(c) => c.to_string(),
            Self::String(s) => s.clone(),
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::DateTimeOffset(dt) => dt.to_rfc3339(),
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
            Self::Uuid(uuid) => uuid.hyphenated().to_string(),
            Self::Enum(e) => e.variant.clone(),
            Self::Null | Self::List(_) | Self::Array(_) | Self::Object(_) => return None,
        };
        Some(text)
    }

    /// Short label of the variant for logs
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::DateTime(_) => "date_time",
            Self::DateTimeOffset(_) => "date_time_offset",
            Self::Date(_) => "date",
            Self::Uuid(_) => "uuid",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// Structural equality
///
/// Handles that point at the same node are equal without descending, so comparing a
/// cyclic graph with itself terminates. Two distinct cyclic graphs must not be compared.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::DateTimeOffset(a), Self::DateTimeOffset(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.id() == b.id() || a.snapshot() == b.snapshot(),
            (Self::Array(a), Self::Array(b)) => {
                a.id() == b.id() || a.snapshot() == b.snapshot()
            }
            (Self::Object(a), Self::Object(b)) => {
                a.ptr_eq(b) || (a.type_name() == b.type_name() && a.snapshot() == b.snapshot())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::List(list) => write!(f, "[list; {}]", list.len()),
            Self::Array(array) => write!(f, "[array; {}]", array.len()),
            Self::Object(object) => write!(f, "{}{{..}}", object.type_name()),
            scalar => write!(f, "{}", scalar.display_scalar().unwrap_or_default()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    Decimal => Decimal,
    char => Char,
    String => String,
    &str => String,
    DateTime<Utc> => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    NaiveDate => Date,
    Uuid => Uuid,
    EnumValue => Enum,
    ListRef => List,
    ArrayRef => Array,
    ObjectRef => Object,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_classification() {
        assert!(Value::from(3_i32).is_scalar());
        assert!(Value::from(EnumValue::new("Color", "Red")).is_scalar());
        assert!(!Value::Null.is_scalar());
        assert!(Value::List(ListRef::default()).is_collection());
        assert!(Value::Null.identity().is_none());
    }

    #[test]
    fn lists_compare_structurally() {
        let a = Value::List(ListRef::new(vec![Value::Int(1), Value::from("x")]));
        let b = Value::List(ListRef::new(vec![Value::Int(1), Value::from("x")]));
        assert_eq!(a, b);
        assert_ne!(a.identity(), b.identity());
        assert_ne!(a, Value::Array(ArrayRef::new(vec![Value::Int(1)])));
    }

    #[test]
    fn display_scalar_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).map(Value::from);
        assert_eq!(
            date.and_then(|d| d.display_scalar()).as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(Value::from(1.5_f64).to_string(), "1.5");
        assert_eq!(Value::Null.display_scalar(), None);
    }
}
