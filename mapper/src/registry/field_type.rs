//! Declared field types and their coarse kind

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::TypeName;
use crate::value::ScalarKind;

/// Category of a declared type for quick dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum TypeKind {
    /// Fixed-size collection
    Array,
    /// Registered enum
    Enum,
    /// Growable collection
    List,
    /// Optional wrapper
    Nullable,
    /// Registered composite
    Struct,
    /// Scalar leaf (numbers, text, dates, identifiers)
    Value,
}

/// Declared type of a field
///
/// Mirrors the shapes a typed struct can have: scalars, registered enums and composites
/// by name, collections of any of these, and an optional wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Scalar leaf
    Scalar(ScalarKind),
    /// Registered enum type
    Enum(TypeName),
    /// Registered composite type
    Object(TypeName),
    /// Growable collection of the inner type
    List(Box<FieldType>),
    /// Collection of the inner type, with its exact length when the length is part of
    /// the type
    Array(Box<FieldType>, Option<usize>),
    /// Optional inner type; null is a legal value
    Nullable(Box<FieldType>),
}

impl FieldType {
    /// Composite by name
    pub fn object(type_name: impl Into<TypeName>) -> Self {
        Self::Object(type_name.into())
    }

    /// Enum by name
    pub fn enumeration(type_name: impl Into<TypeName>) -> Self {
        Self::Enum(type_name.into())
    }

    /// Growable collection
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Array of any length
    pub fn array(element: Self) -> Self {
        Self::Array(Box::new(element), None)
    }

    /// Array of exactly `len` elements
    pub fn fixed_array(element: Self, len: usize) -> Self {
        Self::Array(Box::new(element), Some(len))
    }

    /// Optional wrapper
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Coarse kind of this declaration
    pub const fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Value,
            Self::Enum(_) => TypeKind::Enum,
            Self::Object(_) => TypeKind::Struct,
            Self::List(_) => TypeKind::List,
            Self::Array(..) => TypeKind::Array,
            Self::Nullable(_) => TypeKind::Nullable,
        }
    }

    /// Strip every optional wrapper
    pub fn non_nullable(&self) -> &Self {
        match self {
            Self::Nullable(inner) => inner.non_nullable(),
            other => other,
        }
    }

    /// Null is a legal value
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Scalar or enum, looking through optional wrappers
    pub fn is_leaf(&self) -> bool {
        matches!(self.non_nullable(), Self::Scalar(_) | Self::Enum(_))
    }

    /// List or array, looking through optional wrappers
    pub fn is_collection(&self) -> bool {
        matches!(self.non_nullable(), Self::List(_) | Self::Array(..))
    }

    /// Composite type name, looking through optional wrappers
    pub fn composite_type(&self) -> Option<&TypeName> {
        match self.non_nullable() {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Enum type name, looking through optional wrappers
    pub fn enum_type(&self) -> Option<&TypeName> {
        match self.non_nullable() {
            Self::Enum(name) => Some(name),
            _ => None,
        }
    }

    /// Exact element count a fixed-size array requires, looking through optional wrappers
    pub fn fixed_len(&self) -> Option<usize> {
        match self.non_nullable() {
            Self::Array(_, len) => *len,
            _ => None,
        }
    }

    /// Whether a collection of `len` elements fits this declaration
    pub fn accepts_len(&self, len: usize) -> bool {
        self.fixed_len().is_none_or(|fixed| fixed == len)
    }

    /// Element type of a collection, looking through optional wrappers
    pub fn element_type(&self) -> Option<&Self> {
        match self.non_nullable() {
            Self::List(element) | Self::Array(element, _) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Enum(name) | Self::Object(name) => write!(f, "{name}"),
            Self::List(element) => write!(f, "List<{element}>"),
            Self::Array(element, None) => write!(f, "[{element}]"),
            Self::Array(element, Some(len)) => write!(f, "[{element}; {len}]"),
            Self::Nullable(inner) => write!(f, "Option<{inner}>"),
        }
    }
}
