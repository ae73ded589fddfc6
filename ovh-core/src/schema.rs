//! Attribute and resource schemas
//!
//! Handlers describe their configuration surface with a [`ResourceSchema`]:
//! per-attribute types, required/optional/computed flags, environment
//! default rules, and human-readable descriptions.

use std::collections::HashMap;

use crate::value::{Attributes, Value};

/// Attribute type
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check that a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),
            (AttributeType::List(inner), Value::List(items)) => {
                for item in items {
                    inner.validate(item)?;
                }
                Ok(())
            }
            (AttributeType::Map(inner), Value::Map(map)) => {
                for value in map.values() {
                    inner.validate(value)?;
                }
                Ok(())
            }
            _ => Err(SchemaError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name().to_string(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
        }
    }
}

/// Schema validation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}': {inner}")]
    Attribute {
        name: String,
        inner: Box<SchemaError>,
    },
}

/// Schema for a single attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    /// Must be supplied (or resolvable from the environment default)
    pub required: bool,
    /// Produced by the remote API, never supplied in configuration
    pub computed: bool,
    /// Environment variable consulted when no value is supplied
    pub default_env: Option<&'static str>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            default_env: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Resolve a missing value from this environment variable
    pub fn env_default(mut self, var: &'static str) -> Self {
        self.default_env = Some(var);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Schema for a resource, data source, or the provider configuration block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceSchema {
    pub attributes: HashMap<String, AttributeSchema>,
}

impl ResourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    /// Apply environment defaults to attributes the caller did not supply
    ///
    /// Returns a new attribute set: supplied values are kept as-is, and
    /// string attributes with an environment default rule pick up the
    /// variable's value when present and non-empty.
    pub fn resolve(&self, supplied: &Attributes) -> Attributes {
        let mut resolved = supplied.clone();
        for (name, attr) in &self.attributes {
            if resolved.contains(name) {
                continue;
            }
            if let Some(var) = attr.default_env
                && attr.attr_type == AttributeType::String
                && let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                resolved.insert(name.clone(), Value::String(value));
            }
        }
        resolved
    }

    /// Validate attributes against this schema
    ///
    /// Checks that required non-computed attributes are present and that
    /// every known attribute has the declared type. Unknown attributes are
    /// allowed.
    pub fn validate(&self, attributes: &Attributes) -> Result<(), Vec<SchemaError>> {
        let mut errors = Vec::new();

        for (name, attr) in &self.attributes {
            if attr.required && !attr.computed && !attributes.contains(name) {
                errors.push(SchemaError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes.iter() {
            if let Some(attr) = self.attributes.get(name)
                && let Err(e) = attr.attr_type.validate(value)
            {
                errors.push(SchemaError::Attribute {
                    name: name.clone(),
                    inner: Box::new(e),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_list_type() {
        let t = AttributeType::List(Box::new(AttributeType::String));
        assert!(
            t.validate(&Value::List(vec![Value::String("GRA1".to_string())]))
                .is_ok()
        );
        assert!(t.validate(&Value::List(vec![Value::Int(1)])).is_err());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new()
            .attribute(AttributeSchema::new("zone", AttributeType::String).required());

        let result = schema.validate(&Attributes::new());
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            SchemaError::MissingRequired { name } if name == "zone"
        ));
    }

    #[test]
    fn computed_attributes_are_not_required_in_config() {
        let schema = ResourceSchema::new()
            .attribute(AttributeSchema::new("id", AttributeType::Int).required().computed());

        assert!(schema.validate(&Attributes::new()).is_ok());
    }

    #[test]
    fn unknown_attributes_are_allowed() {
        let schema = ResourceSchema::new();
        let attrs = Attributes::new().with("extra", "value");
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn resolve_prefers_supplied_value() {
        let schema = ResourceSchema::new().attribute(
            AttributeSchema::new("endpoint", AttributeType::String).env_default("OVH_ENDPOINT"),
        );

        let supplied = Attributes::new().with("endpoint", "ovh-ca");
        let resolved = schema.resolve(&supplied);
        assert_eq!(resolved.get_string("endpoint"), Some("ovh-ca"));
    }

    #[test]
    fn resolve_reads_environment_default() {
        let schema = ResourceSchema::new().attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .env_default("OVH_CORE_TEST_ENDPOINT"),
        );

        unsafe { std::env::set_var("OVH_CORE_TEST_ENDPOINT", "ovh-eu") };
        let resolved = schema.resolve(&Attributes::new());
        unsafe { std::env::remove_var("OVH_CORE_TEST_ENDPOINT") };

        assert_eq!(resolved.get_string("endpoint"), Some("ovh-eu"));
    }

    #[test]
    fn resolve_skips_absent_environment() {
        let schema = ResourceSchema::new().attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .env_default("OVH_CORE_TEST_ABSENT"),
        );

        let resolved = schema.resolve(&Attributes::new());
        assert_eq!(resolved.get_string("endpoint"), None);
    }
}
