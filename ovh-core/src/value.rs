//! Attribute values for declared configuration and observed remote state

use std::collections::HashMap;

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Name of this value's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Named attribute values for one resource or configuration block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer attribute value
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Get a boolean attribute value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get a boolean attribute with a default value
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Get a list attribute value
    pub fn get_list(&self, key: &str) -> Option<&[Value]> {
        match self.values.get(key) {
            Some(Value::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Get a map attribute value
    pub fn get_map(&self, key: &str) -> Option<&HashMap<String, Value>> {
        match self.values.get(key) {
            Some(Value::Map(map)) => Some(map),
            _ => None,
        }
    }

    /// Get a list of strings, ignoring non-string items
    pub fn get_string_list(&self, key: &str) -> Option<Vec<&str>> {
        self.get_list(key).map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let attrs = Attributes::new()
            .with("name", "zone.example.net")
            .with("ttl", 3600i64)
            .with("enabled", true);

        assert_eq!(attrs.get_string("name"), Some("zone.example.net"));
        assert_eq!(attrs.get_int("ttl"), Some(3600));
        assert_eq!(attrs.get_bool("enabled"), Some(true));
        assert_eq!(attrs.get_string("missing"), None);
    }

    #[test]
    fn accessors_reject_wrong_type() {
        let attrs = Attributes::new().with("ttl", 3600i64);
        assert_eq!(attrs.get_string("ttl"), None);
        assert_eq!(attrs.get_bool("ttl"), None);
    }

    #[test]
    fn string_list_filters_non_strings() {
        let mut attrs = Attributes::new();
        attrs.insert(
            "regions",
            Value::List(vec![Value::String("GRA1".to_string()), Value::Int(1)]),
        );
        assert_eq!(attrs.get_string_list("regions"), Some(vec!["GRA1"]));
    }

    #[test]
    fn get_bool_or_default() {
        let attrs = Attributes::new();
        assert!(attrs.get_bool_or("dhcp", true));
        assert!(!attrs.get_bool_or("dhcp", false));
    }
}
