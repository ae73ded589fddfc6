//! Registry of resource and data-source handlers
//!
//! An explicit table built once at startup mapping public names to handler
//! constructors. Entries can carry a deprecation message: the wrapped
//! handler stays fully functional, the message is purely informational.

use std::collections::HashMap;

use thiserror::Error;

use crate::handler::{DataSourceHandler, ResourceHandler};

/// Constructor for a resource handler
pub type ResourceCtor = fn() -> Box<dyn ResourceHandler>;

/// Constructor for a data-source handler
pub type DataSourceCtor = fn() -> Box<dyn DataSourceHandler>;

/// A named binding from a public name to a handler constructor
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry<C> {
    ctor: C,
    deprecation: Option<&'static str>,
}

impl<C> RegistryEntry<C> {
    pub fn new(ctor: C) -> Self {
        Self {
            ctor,
            deprecation: None,
        }
    }

    /// Mark this entry as superseded, with replacement guidance
    ///
    /// Only the message changes; the constructed handler is identical.
    pub fn deprecated(mut self, message: &'static str) -> Self {
        self.deprecation = Some(message);
        self
    }

    pub fn deprecation(&self) -> Option<&'static str> {
        self.deprecation
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

impl RegistryEntry<ResourceCtor> {
    /// Construct the handler this entry binds
    pub fn build(&self) -> Box<dyn ResourceHandler> {
        (self.ctor)()
    }
}

impl RegistryEntry<DataSourceCtor> {
    /// Construct the handler this entry binds
    pub fn build(&self) -> Box<dyn DataSourceHandler> {
        (self.ctor)()
    }
}

/// Errors raised while building a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate resource name: {0}")]
    DuplicateResource(&'static str),

    #[error("Duplicate data source name: {0}")]
    DuplicateDataSource(&'static str),
}

/// Capability table for one provider
///
/// Read-only after construction; safe for unsynchronized concurrent reads.
#[derive(Debug, Default)]
pub struct Registry {
    resources: HashMap<&'static str, RegistryEntry<ResourceCtor>>,
    data_sources: HashMap<&'static str, RegistryEntry<DataSourceCtor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under a public name
    pub fn register_resource(
        &mut self,
        name: &'static str,
        entry: RegistryEntry<ResourceCtor>,
    ) -> Result<(), RegistryError> {
        if self.resources.contains_key(name) {
            return Err(RegistryError::DuplicateResource(name));
        }
        self.resources.insert(name, entry);
        Ok(())
    }

    /// Register a data source under a public name
    pub fn register_data_source(
        &mut self,
        name: &'static str,
        entry: RegistryEntry<DataSourceCtor>,
    ) -> Result<(), RegistryError> {
        if self.data_sources.contains_key(name) {
            return Err(RegistryError::DuplicateDataSource(name));
        }
        self.data_sources.insert(name, entry);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Option<&RegistryEntry<ResourceCtor>> {
        self.resources.get(name)
    }

    pub fn data_source(&self, name: &str) -> Option<&RegistryEntry<DataSourceCtor>> {
        self.data_sources.get(name)
    }

    /// All registered resource names, sorted
    pub fn resource_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.resources.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// All registered data source names, sorted
    pub fn data_source_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.data_sources.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn data_source_count(&self) -> usize {
        self.data_sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxFuture, HandlerResult, RemoteState};
    use crate::schema::ResourceSchema;
    use crate::value::Attributes;
    use ovh_client::OvhClient;

    struct NullHandler;

    impl ResourceHandler for NullHandler {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new()
        }

        fn create<'a>(
            &'a self,
            _client: &'a OvhClient,
            _desired: &'a Attributes,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            Box::pin(async { Ok(RemoteState::not_found()) })
        }

        fn read<'a>(
            &'a self,
            _client: &'a OvhClient,
            _state: &'a RemoteState,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            Box::pin(async { Ok(RemoteState::not_found()) })
        }

        fn update<'a>(
            &'a self,
            _client: &'a OvhClient,
            _state: &'a RemoteState,
            _desired: &'a Attributes,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            Box::pin(async { Ok(RemoteState::not_found()) })
        }

        fn delete<'a>(
            &'a self,
            _client: &'a OvhClient,
            _state: &'a RemoteState,
        ) -> BoxFuture<'a, HandlerResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn null_handler() -> Box<dyn ResourceHandler> {
        Box::new(NullHandler)
    }

    #[test]
    fn duplicate_resource_name_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register_resource("example", RegistryEntry::new(null_handler as ResourceCtor))
            .unwrap();

        let result =
            registry.register_resource("example", RegistryEntry::new(null_handler as ResourceCtor));
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateResource("example"))
        ));
    }

    #[test]
    fn deprecation_only_changes_the_message() {
        let entry = RegistryEntry::new(null_handler as ResourceCtor);
        let once = entry.deprecated("use the new name");
        let twice = once.deprecated("use the newer name");

        assert!(!entry.is_deprecated());
        assert_eq!(once.deprecation(), Some("use the new name"));
        assert_eq!(twice.deprecation(), Some("use the newer name"));

        // The constructed handlers are behaviorally identical
        assert_eq!(entry.build().schema(), twice.build().schema());
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = Registry::new();
        registry
            .register_resource("zeta", RegistryEntry::new(null_handler as ResourceCtor))
            .unwrap();
        registry
            .register_resource("alpha", RegistryEntry::new(null_handler as ResourceCtor))
            .unwrap();

        assert_eq!(registry.resource_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn lookup_unknown_name() {
        let registry = Registry::new();
        assert!(registry.resource("missing").is_none());
        assert!(registry.data_source("missing").is_none());
    }
}
