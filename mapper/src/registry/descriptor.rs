//! Type descriptors: the registry's view of a composite or enum type

use std::collections::HashMap;
use std::fmt;

use super::binding::{BindTo, ComplexBind, FieldRules};
use super::fluent::MappingConfigurator;
use super::{FieldType, TypeName};
use crate::value::Value;

/// Fluent configuration hook a destination type may carry
pub type ConfigureFn = fn(&mut MappingConfigurator);

/// Zero-argument constructor producing an [`Value::Object`]
pub type ConstructorFn = fn() -> Value;

/// Initial value of a field in a freshly constructed instance
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// Fixed scalar value
    Value(Value),
    /// Default-construct the declared type, even when it is optional
    Construct,
}

/// One field of a composite type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name:       String,
    field_type: FieldType,
    rules:      FieldRules,
    default:    Option<FieldDefault>,
}

impl FieldDescriptor {
    /// A field with no rules
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            rules: FieldRules::default(),
            default: None,
        }
    }

    /// Redirect to comma-separated candidate paths
    #[must_use]
    pub fn bind_to(mut self, candidates: &str) -> Self {
        self.rules.bind_to = Some(BindTo::new(candidates));
        self
    }

    /// Redirect to candidate paths taken verbatim from the source root
    #[must_use]
    pub fn bind_to_literal(mut self, candidates: &str) -> Self {
        self.rules.bind_to = Some(BindTo::literal(candidates));
        self
    }

    /// Add complex-bind rules; lists are expanded by [`ComplexBind::expand`]
    #[must_use]
    pub fn complex_bind(mut self, destinations: &str, sources: &str) -> Self {
        self.rules
            .complex_binds
            .extend(ComplexBind::expand(destinations, sources));
        self
    }

    /// Exclude from default-name matching
    #[must_use]
    pub const fn ignore(mut self) -> Self {
        self.rules.ignore = true;
        self
    }

    /// Apply a registered converter before assignment
    #[must_use]
    pub fn converter(mut self, name: impl Into<String>) -> Self {
        self.rules.converter = Some(name.into());
        self
    }

    /// Initial value for freshly constructed instances
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Default-construct the field even when it is optional
    #[must_use]
    pub fn constructed(mut self) -> Self {
        self.default = Some(FieldDefault::Construct);
        self
    }

    /// Replace every rule at once
    #[must_use]
    pub fn with_rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    /// Field name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub const fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Binding rules
    pub const fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Declared initial value
    pub const fn initial(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

#[derive(Debug, Clone)]
enum DescriptorKind {
    Struct { fields: Vec<FieldDescriptor> },
    Enum { variants: Vec<String> },
}

/// Registered shape of a composite or enum type
#[derive(Clone)]
pub struct TypeDescriptor {
    name:        TypeName,
    kind:        DescriptorKind,
    /// Lowercased name to position, for case-insensitive lookup
    lookup:      HashMap<String, usize>,
    constructor: Option<ConstructorFn>,
    configure:   Option<ConfigureFn>,
}

impl TypeDescriptor {
    /// Start describing a composite type
    pub fn structure(name: impl Into<TypeName>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            name:        name.into(),
            fields:      Vec::new(),
            constructor: None,
            configure:   None,
        }
    }

    /// Describe an enum type by its variant names, in ordinal order
    pub fn enumeration<I, S>(name: impl Into<TypeName>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
        let lookup = index_names(variants.iter().map(String::as_str));
        Self {
            name: name.into(),
            kind: DescriptorKind::Enum { variants },
            lookup,
            constructor: None,
            configure: None,
        }
    }

    /// Registered name
    pub const fn name(&self) -> &TypeName {
        &self.name
    }

    /// Enum descriptors have variants instead of fields
    pub const fn is_enum(&self) -> bool {
        matches!(self.kind, DescriptorKind::Enum { .. })
    }

    /// Fields in declaration order; empty for enums
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            DescriptorKind::Struct { fields } => fields,
            DescriptorKind::Enum { .. } => &[],
        }
    }

    /// Variant names in ordinal order; empty for composites
    pub fn variants(&self) -> &[String] {
        match &self.kind {
            DescriptorKind::Enum { variants } => variants,
            DescriptorKind::Struct { .. } => &[],
        }
    }

    /// Field and its slot index, matched case-insensitively
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        let DescriptorKind::Struct { fields } = &self.kind else {
            return None;
        };
        let index = *self.lookup.get(&name.to_lowercase())?;
        fields.get(index).map(|field| (index, field))
    }

    /// Field at a slot index
    pub fn field_at(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields().get(index)
    }

    /// Registered variant name and ordinal, matched case-insensitively
    pub fn variant(&self, name: &str) -> Option<(usize, &str)> {
        let DescriptorKind::Enum { variants } = &self.kind else {
            return None;
        };
        let index = *self.lookup.get(&name.to_lowercase())?;
        variants
            .get(index)
            .map(|variant| (index, variant.as_str()))
    }

    /// Variant name at an ordinal
    pub fn variant_at(&self, ordinal: usize) -> Option<&str> {
        self.variants().get(ordinal).map(String::as_str)
    }

    /// Explicit zero-argument constructor
    pub const fn constructor(&self) -> Option<ConstructorFn> {
        self.constructor
    }

    /// Fluent configuration hook
    pub const fn configure(&self) -> Option<ConfigureFn> {
        self.configure
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor.is_some())
            .field("configure", &self.configure.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for composite descriptors
#[derive(Debug, Clone)]
pub struct TypeDescriptorBuilder {
    name:        TypeName,
    fields:      Vec<FieldDescriptor>,
    constructor: Option<ConstructorFn>,
    configure:   Option<ConfigureFn>,
}

impl TypeDescriptorBuilder {
    /// Append a field; slot order follows call order
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Use an explicit constructor instead of field-wise defaults
    #[must_use]
    pub const fn constructor(mut self, constructor: ConstructorFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Attach a fluent configuration hook
    #[must_use]
    pub const fn configure(mut self, configure: ConfigureFn) -> Self {
        self.configure = Some(configure);
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> TypeDescriptor {
        let lookup = index_names(self.fields.iter().map(FieldDescriptor::name));
        TypeDescriptor {
            name: self.name,
            kind: DescriptorKind::Struct {
                fields: self.fields,
            },
            lookup,
            constructor: self.constructor,
            configure: self.configure,
        }
    }
}

/// First declaration wins when two names differ only by case
fn index_names<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut lookup = HashMap::new();
    for (index, name) in names.enumerate() {
        lookup.entry(name.to_lowercase()).or_insert(index);
    }
    lookup
}
