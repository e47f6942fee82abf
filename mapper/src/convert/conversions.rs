//! Type-to-type scalar conversions
//!
//! Two layers: a registry of explicit `(from, to)` conversions consulted first, and the
//! general convertible fallback in [`convert_scalar`] covering numeric widening and
//! narrowing with range checks, string parsing and rendering.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::value::{ScalarKind, Value};

/// Explicit conversion between two scalar kinds
pub type ConversionFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Registered `(from, to)` scalar conversions
#[derive(Default)]
pub struct ConversionRegistry {
    conversions: DashMap<(ScalarKind, ScalarKind), ConversionFn>,
}

impl ConversionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the date/time conversions
    ///
    /// Offset instants become UTC instants and back, and either instant can become a
    /// calendar date.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(ScalarKind::DateTimeOffset, ScalarKind::DateTime, |value| {
            match value {
                Value::DateTimeOffset(dt) => Some(Value::DateTime(dt.with_timezone(&Utc))),
                _ => None,
            }
        });
        registry.register(ScalarKind::DateTime, ScalarKind::DateTimeOffset, |value| {
            match value {
                Value::DateTime(dt) => Some(Value::DateTimeOffset(dt.fixed_offset())),
                _ => None,
            }
        });
        registry.register(ScalarKind::DateTime, ScalarKind::Date, |value| match value {
            Value::DateTime(dt) => Some(Value::Date(dt.date_naive())),
            _ => None,
        });
        registry.register(ScalarKind::DateTimeOffset, ScalarKind::Date, |value| {
            match value {
                Value::DateTimeOffset(dt) => Some(Value::Date(dt.date_naive())),
                _ => None,
            }
        });
        registry.register(ScalarKind::Date, ScalarKind::DateTime, |value| match value {
            Value::Date(date) => date
                .and_hms_opt(0, 0, 0)
                .map(|midnight| Value::DateTime(midnight.and_utc())),
            _ => None,
        });
        registry
    }

    /// Register or replace the conversion from `from` to `to`
    pub fn register<F>(&self, from: ScalarKind, to: ScalarKind, conversion: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.conversions.insert((from, to), Arc::new(conversion));
    }

    /// Conversion registered for the pair
    pub fn get(&self, from: ScalarKind, to: ScalarKind) -> Option<ConversionFn> {
        self.conversions
            .get(&(from, to))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("conversions", &self.conversions.len())
            .finish()
    }
}

/// General convertible fallback into `target`
///
/// `None` when the value cannot be represented: out-of-range numbers, unparseable text,
/// or kinds with no sensible conversion.
pub fn convert_scalar(value: &Value, target: ScalarKind) -> Option<Value> {
    if let Some((min, max)) = target.integer_bounds() {
        let wide = to_i128(value)?;
        if !(min..=max).contains(&wide) {
            return None;
        }
        return if target.is_signed_integer() {
            i64::try_from(wide).ok().map(Value::Int)
        } else {
            u64::try_from(wide).ok().map(Value::UInt)
        };
    }

    match target {
        ScalarKind::F32 => to_f64(value)
            .filter(|f| f.is_nan() || f.is_infinite() || f.abs() <= f64::from(f32::MAX))
            .map(narrow_to_f32)
            .map(Value::Float),
        ScalarKind::F64 => to_f64(value).map(Value::Float),
        ScalarKind::Decimal => to_decimal(value).map(Value::Decimal),
        ScalarKind::Bool => to_bool(value).map(Value::Bool),
        ScalarKind::Char => match value {
            Value::Char(c) => Some(Value::Char(*c)),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            Value::UInt(u) => u32::try_from(*u).ok().and_then(char::from_u32).map(Value::Char),
            Value::Int(i) => u32::try_from(*i).ok().and_then(char::from_u32).map(Value::Char),
            _ => None,
        },
        ScalarKind::String => value.display_scalar().map(Value::String),
        ScalarKind::DateTime => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
            _ => None,
        },
        ScalarKind::DateTimeOffset => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(Value::DateTimeOffset),
            _ => None,
        },
        ScalarKind::Date => match value {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            _ => None,
        },
        ScalarKind::Uuid => match value {
            Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
            _ => None,
        },
        // Integer kinds returned above
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "range checked against f32::MAX by the caller"
)]
fn narrow_to_f32(f: f64) -> f64 {
    f64::from(f as f32)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "rounded and range checked before the cast"
)]
fn to_i128(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        Value::Bool(b) => Some(i128::from(*b)),
        Value::Float(f) => {
            let rounded = f.round_ties_even();
            // Beyond the i128 range no integer kind can hold the value anyway
            (rounded.is_finite() && rounded.abs() < 1e38).then_some(rounded as i128)
        }
        Value::Decimal(d) => d.round_dp(0).to_i128(),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "integer to float conversion rounds like any numeric cast"
)]
fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Decimal(d) => d.to_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(d) => Some(*d),
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::UInt(u) => Some(Decimal::from(*u)),
        Value::Float(f) => Decimal::from_f64(*f),
        Value::Bool(b) => Some(Decimal::from(u8::from(*b))),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::UInt(u) => Some(*u != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::Decimal(d) => Some(!d.is_zero()),
        Value::String(s) => s.trim().to_ascii_lowercase().parse::<bool>().ok(),
        _ => None,
    }
}
