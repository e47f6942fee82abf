//! Shared fixtures for unit tests

use std::sync::Once;

use crate::registry::{FieldDescriptor, FieldType, TypeDescriptor, TypeName, TypeRegistry};
use crate::value::{ArrayRef, ListRef, ScalarKind, Value};

/// Route engine logs to the test harness once per process
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn string() -> FieldType {
    FieldType::Scalar(ScalarKind::String)
}

pub fn int() -> FieldType {
    FieldType::Scalar(ScalarKind::I32)
}

pub fn address_descriptor() -> TypeDescriptor {
    TypeDescriptor::structure("Address")
        .field(FieldDescriptor::new("Street", string()))
        .field(FieldDescriptor::new("City", string()))
        .build()
}

pub fn person_descriptor() -> TypeDescriptor {
    TypeDescriptor::structure("Person")
        .field(FieldDescriptor::new("Name", string()))
        .field(FieldDescriptor::new("Age", int()))
        .field(FieldDescriptor::new("Home", FieldType::object("Address")))
        .field(FieldDescriptor::new(
            "Work",
            FieldType::nullable(FieldType::object("Address")),
        ))
        .field(FieldDescriptor::new("Tags", FieldType::list(string())))
        .field(FieldDescriptor::new("Scores", FieldType::array(int())))
        .build()
}

/// `Node` points at itself through a non-optional field
pub fn node_descriptor() -> TypeDescriptor {
    TypeDescriptor::structure("Node")
        .field(FieldDescriptor::new("Name", string()))
        .field(FieldDescriptor::new("Next", FieldType::object("Node")))
        .build()
}

pub fn registry_with_people() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register(address_descriptor());
    registry.register(person_descriptor());
    registry
}

pub fn object(registry: &TypeRegistry, type_name: &str, fields: &[(&str, Value)]) -> Value {
    let Ok(instance) = registry.instantiate(&TypeName::from(type_name)) else {
        return Value::Null;
    };
    for (name, value) in fields {
        instance.set_by_name(name, value.clone());
    }
    Value::Object(instance)
}

pub fn list(items: Vec<Value>) -> Value {
    Value::List(ListRef::new(items))
}

pub fn array(items: Vec<Value>) -> Value {
    Value::Array(ArrayRef::new(items))
}

/// Homer, with a home address, no work address, two tags and three scores
pub fn person_value(registry: &TypeRegistry) -> Value {
    let home = object(
        registry,
        "Address",
        &[
            ("Street", Value::from("742 Evergreen Terrace")),
            ("City", Value::from("Springfield")),
        ],
    );
    object(
        registry,
        "Person",
        &[
            ("Name", Value::from("Homer")),
            ("Age", Value::Int(39)),
            ("Home", home),
            ("Tags", list(vec![Value::from("red"), Value::from("blue")])),
            (
                "Scores",
                array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            ),
        ],
    )
}
