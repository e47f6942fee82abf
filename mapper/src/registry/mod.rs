//! Type registry
//!
//! Holds one descriptor per registered type name and knows how to default-construct
//! instances from them. Typed callers register through [`Mappable`]; dynamic callers
//! register hand-built [`TypeDescriptor`]s.

mod binding;
mod descriptor;
mod field_type;
mod fluent;
mod mappable;
mod type_name;

use std::any::TypeId;
use std::sync::Arc;

pub use binding::{BindTo, ComplexBind, FieldRules};
use dashmap::DashMap;
pub use descriptor::{
    ConfigureFn, ConstructorFn, FieldDefault, FieldDescriptor, TypeDescriptor,
    TypeDescriptorBuilder,
};
use error_stack::Report;
pub use field_type::{FieldType, TypeKind};
pub use fluent::{MappingConfigurator, MappingOverride};
pub use mappable::Mappable;
use parking_lot::Mutex;
use tracing::debug;
pub use type_name::TypeName;

use crate::error::{Error, Result};
use crate::value::{ArrayRef, EnumValue, ListRef, ObjectRef, Value};

/// Thread-safe store of type descriptors
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Map of type names to descriptors
    types:        DashMap<TypeName, Arc<TypeDescriptor>>,
    /// Rust types whose registration has completed
    rust_types:   DashMap<TypeId, TypeName>,
    /// Serializes typed registration so a type is visible only once its closure is
    registration: Mutex<()>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor
    pub fn register(&self, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        self.register_shared(Arc::new(descriptor))
    }

    /// Insert or replace a shared descriptor
    pub fn register_shared(&self, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        debug!(type_name = %descriptor.name(), "registering type descriptor");
        self.types
            .insert(descriptor.name().clone(), Arc::clone(&descriptor));
        descriptor
    }

    /// Register a Rust type and everything it reaches, once per process type
    pub fn register_type<T: Mappable>(&self) -> FieldType {
        let type_id = TypeId::of::<T>();
        if !self.rust_types.contains_key(&type_id) {
            let _guard = self.registration.lock();
            if !self.rust_types.contains_key(&type_id) {
                T::register(self);
                let name = T::descriptor()
                    .map_or_else(|| TypeName::from(T::field_type().to_string()), |d| {
                        d.name().clone()
                    });
                self.rust_types.insert(type_id, name);
            }
        }
        T::field_type()
    }

    /// Get a descriptor if registered
    pub fn get(&self, type_name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        self.types.get(type_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Get a descriptor or fail with [`Error::TypeNotRegistered`]
    pub fn require(&self, type_name: &TypeName) -> Result<Arc<TypeDescriptor>> {
        self.get(type_name)
            .ok_or_else(|| Report::new(Error::not_registered(type_name)))
    }

    /// A descriptor is registered under `type_name`
    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.types.contains_key(type_name)
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// No descriptor registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Default-construct an instance of a composite type
    ///
    /// A registered constructor wins. Otherwise every field gets its declared initial
    /// value or the default for its type; non-optional composite fields are built
    /// eagerly unless that type is already being built higher up, which is what keeps
    /// self-referential types finite.
    pub fn instantiate(&self, type_name: &TypeName) -> Result<ObjectRef> {
        let mut under_construction = Vec::new();
        self.instantiate_guarded(type_name, &mut under_construction)
    }

    /// Value a newly created slot of `field_type` holds
    pub fn default_for(&self, field_type: &FieldType) -> Value {
        let mut under_construction = Vec::new();
        self.default_guarded(field_type, &mut under_construction)
    }

    /// Materialize a value for an intermediate slot that is currently null
    ///
    /// Unlike [`Self::default_for`], optional wrappers are looked through, so a null
    /// `Option<Address>` yields a fresh `Address`. `None` when the type cannot be built.
    pub fn construct(&self, field_type: &FieldType) -> Option<Value> {
        let value = match field_type.non_nullable() {
            FieldType::Object(name) => match self.instantiate(name) {
                Ok(object) => Value::Object(object),
                Err(report) => {
                    debug!(type_name = %name, error = ?report, "cannot construct intermediate");
                    return None;
                }
            },
            other => self.default_for(other),
        };
        (!value.is_null()).then_some(value)
    }

    fn instantiate_guarded(
        &self,
        type_name: &TypeName,
        under_construction: &mut Vec<TypeName>,
    ) -> Result<ObjectRef> {
        let descriptor = self.require(type_name)?;
        if descriptor.is_enum() {
            return Err(Report::new(Error::construction_failed(
                type_name,
                "enum types have no instances",
            )));
        }

        if let Some(constructor) = descriptor.constructor() {
            return match constructor() {
                Value::Object(object) => Ok(object),
                other => Err(Report::new(Error::construction_failed(
                    type_name,
                    &format!("constructor returned {}", other.variant_name()),
                ))),
            };
        }

        under_construction.push(type_name.clone());
        let slots = descriptor
            .fields()
            .iter()
            .map(|field| match field.initial() {
                Some(FieldDefault::Value(value)) => value.clone(),
                Some(FieldDefault::Construct) => self
                    .construct(field.field_type())
                    .unwrap_or_else(|| self.default_guarded(field.field_type(), under_construction)),
                None => self.default_guarded(field.field_type(), under_construction),
            })
            .collect();
        under_construction.pop();

        Ok(ObjectRef::new(descriptor, slots))
    }

    fn default_guarded(&self, field_type: &FieldType, under_construction: &mut Vec<TypeName>) -> Value {
        match field_type {
            FieldType::Scalar(kind) => kind.default_value(),
            FieldType::Enum(name) => self
                .get(name)
                .and_then(|descriptor| {
                    descriptor
                        .variant_at(0)
                        .map(|variant| Value::Enum(EnumValue::new(name, variant)))
                })
                .unwrap_or_default(),
            FieldType::Object(name) => {
                if under_construction.contains(name) {
                    return Value::Null;
                }
                match self.instantiate_guarded(name, under_construction) {
                    Ok(object) => Value::Object(object),
                    Err(report) => {
                        debug!(type_name = %name, error = ?report, "leaving field null");
                        Value::Null
                    }
                }
            }
            FieldType::List(_) => Value::List(ListRef::default()),
            FieldType::Array(element, len) => Value::Array(ArrayRef::new(
                (0..len.unwrap_or_default())
                    .map(|_| self.default_guarded(element, under_construction))
                    .collect(),
            )),
            FieldType::Nullable(_) => Value::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{node_descriptor, person_descriptor, registry_with_people};
    use crate::value::ScalarKind;

    #[test]
    fn require_reports_unregistered_types() {
        let registry = TypeRegistry::new();
        let report = registry.require(&TypeName::from("Ghost")).unwrap_err();
        assert!(matches!(
            report.current_context(),
            Error::TypeNotRegistered { type_name } if type_name == "Ghost"
        ));
    }

    #[test]
    fn instantiate_fills_defaults() {
        let registry = registry_with_people();
        let person = registry.instantiate(&TypeName::from("Person")).unwrap();

        assert_eq!(person.get_by_name("Name").unwrap(), Value::from(""));
        assert_eq!(person.get_by_name("Age").unwrap(), Value::Int(0));
        assert!(matches!(person.get_by_name("Tags").unwrap(), Value::List(_)));
        // Non-optional composite fields are built eagerly
        let home = person.get_by_name("Home").unwrap();
        assert_eq!(home.as_object().unwrap().type_name().as_str(), "Address");
        // Optional ones stay null
        assert!(person.get_by_name("Work").unwrap().is_null());
    }

    #[test]
    fn self_referential_types_terminate() {
        let registry = TypeRegistry::new();
        registry.register(node_descriptor());
        let node = registry.instantiate(&TypeName::from("Node")).unwrap();
        assert!(node.get_by_name("Next").unwrap().is_null());
    }

    #[test]
    fn declared_initial_values_win() {
        let registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::structure("Flags")
                .field(
                    FieldDescriptor::new("Mode", FieldType::Scalar(ScalarKind::String))
                        .default_value("strict"),
                )
                .field(
                    FieldDescriptor::new("Owner", FieldType::nullable(FieldType::object("Person")))
                        .constructed(),
                )
                .build(),
        );
        registry.register(person_descriptor());
        let flags = registry.instantiate(&TypeName::from("Flags")).unwrap();
        assert_eq!(flags.get_by_name("mode").unwrap(), Value::from("strict"));
        assert!(flags.get_by_name("owner").unwrap().as_object().is_some());
    }

    #[test]
    fn construct_looks_through_optional_wrappers() {
        let registry = registry_with_people();
        let work = registry
            .construct(&FieldType::nullable(FieldType::object("Address")))
            .unwrap();
        assert_eq!(work.as_object().unwrap().type_name().as_str(), "Address");
        assert!(
            registry
                .construct(&FieldType::object("Unregistered"))
                .is_none()
        );
    }

    #[test]
    fn enums_default_to_first_variant_and_cannot_be_instantiated() {
        let registry = TypeRegistry::new();
        registry.register(TypeDescriptor::enumeration("Color", ["Red", "Green"]));
        assert_eq!(
            registry.default_for(&FieldType::enumeration("Color")),
            Value::Enum(EnumValue::new("Color", "Red"))
        );
        let report = registry.instantiate(&TypeName::from("Color")).unwrap_err();
        assert!(matches!(report.current_context(), Error::Construction(_)));
    }

    #[test]
    fn register_type_is_memoized() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.register_type::<Vec<i32>>(),
            FieldType::list(FieldType::Scalar(ScalarKind::I32))
        );
        registry.register_type::<Vec<i32>>();
        assert_eq!(registry.rust_types.len(), 1);
        assert!(registry.is_empty());
    }
}
