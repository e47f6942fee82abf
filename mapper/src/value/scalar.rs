//! Scalar kinds the registry can declare for a field

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::Value;

/// Leaf value kinds
///
/// Every non-composite, non-enum field is declared with one of these. The kind decides
/// which [`Value`] variant a field holds once the engine has written it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `rust_decimal::Decimal`
    Decimal,
    /// `char`
    Char,
    /// `String`
    String,
    /// Instant in UTC
    DateTime,
    /// Instant with a fixed offset
    DateTimeOffset,
    /// Calendar date
    Date,
    /// `uuid::Uuid`
    Uuid,
}

impl ScalarKind {
    /// Natural kind of a scalar value, `None` for null, enums and composites
    pub const fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Bool),
            Value::Int(_) => Some(Self::I64),
            Value::UInt(_) => Some(Self::U64),
            Value::Float(_) => Some(Self::F64),
            Value::Decimal(_) => Some(Self::Decimal),
            Value::Char(_) => Some(Self::Char),
            Value::String(_) => Some(Self::String),
            Value::DateTime(_) => Some(Self::DateTime),
            Value::DateTimeOffset(_) => Some(Self::DateTimeOffset),
            Value::Date(_) => Some(Self::Date),
            Value::Uuid(_) => Some(Self::Uuid),
            Value::Null
            | Value::Enum(_)
            | Value::List(_)
            | Value::Array(_)
            | Value::Object(_) => None,
        }
    }

    /// Zero value a freshly constructed field of this kind holds
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => Value::Int(0),
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => Value::UInt(0),
            Self::F32 | Self::F64 => Value::Float(0.0),
            Self::Decimal => Value::Decimal(Decimal::ZERO),
            Self::Char => Value::Char('\0'),
            Self::String => Value::String(String::new()),
            Self::DateTime => Value::DateTime(DateTime::<Utc>::default()),
            Self::DateTimeOffset => Value::DateTimeOffset(DateTime::<Utc>::default().fixed_offset()),
            Self::Date => Value::Date(NaiveDate::default()),
            Self::Uuid => Value::Uuid(Uuid::nil()),
        }
    }

    /// Inclusive bounds for the integer kinds
    pub const fn integer_bounds(self) -> Option<(i128, i128)> {
        match self {
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// Signed integer kinds are stored as [`Value::Int`]
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Floating point kinds
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// True when `value` already has the representation a field of this kind stores
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::F32 | Self::F64, Value::Float(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::Char, Value::Char(_))
            | (Self::String, Value::String(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::DateTimeOffset, Value::DateTimeOffset(_))
            | (Self::Date, Value::Date(_))
            | (Self::Uuid, Value::Uuid(_)) => true,
            (kind, Value::Int(i)) if kind.is_signed_integer() => kind.in_range(i128::from(*i)),
            (kind, Value::UInt(u)) if kind.integer_bounds().is_some() && !kind.is_signed_integer() => {
                kind.in_range(i128::from(*u))
            }
            _ => false,
        }
    }

    /// Range check for the integer kinds, false for every other kind
    pub fn in_range(self, candidate: i128) -> bool {
        self.integer_bounds()
            .is_some_and(|(min, max)| (min..=max).contains(&candidate))
    }
}
