//! Named property converters
//!
//! A field rule can name a converter; the engine looks it up here and runs it on the
//! source value before coercion. Converters are registered once and shared.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::value::Value;

/// User-supplied value transformation applied before assignment
pub trait PropertyConverter: Send + Sync {
    /// Transform a non-null source value
    fn convert(&self, value: Value) -> Result<Value>;
}

impl<F> PropertyConverter for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn convert(&self, value: Value) -> Result<Value> {
        self(value)
    }
}

/// Shared converter handle
pub type SharedConverter = Arc<dyn PropertyConverter>;

/// Converters by name
#[derive(Default)]
pub struct ConverterRegistry {
    converters: DashMap<String, SharedConverter>,
}

impl ConverterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a converter
    pub fn register(&self, name: impl Into<String>, converter: impl PropertyConverter + 'static) {
        self.converters.insert(name.into(), Arc::new(converter));
    }

    /// Converter registered under `name`
    pub fn get(&self, name: &str) -> Option<SharedConverter> {
        self.converters
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// No converter registered
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .converters
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}
