//! Resolved client configuration and the endpoint gateway table

use crate::error::{ConfigError, ConfigResult};

/// Known OVH API gateways, keyed by endpoint identifier
const ENDPOINTS: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Look up the gateway base URL for an endpoint identifier
pub fn endpoint_url(endpoint: &str) -> Option<&'static str> {
    ENDPOINTS
        .iter()
        .find(|(name, _)| *name == endpoint)
        .map(|(_, url)| *url)
}

/// All known endpoint identifiers
pub fn known_endpoints() -> Vec<&'static str> {
    ENDPOINTS.iter().map(|(name, _)| *name).collect()
}

/// Fully resolved configuration for an API session
///
/// Built once per session by [`crate::credentials::resolve`] and immutable
/// afterwards. Credential fields stay optional until [`validate`] runs.
///
/// [`validate`]: ClientConfig::validate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint identifier selecting the API gateway (e.g. "ovh-eu")
    pub endpoint: String,
    /// API application key
    pub application_key: String,
    /// API application secret
    pub application_secret: String,
    /// API consumer key
    pub consumer_key: String,
}

impl ClientConfig {
    /// Create a configuration with only the endpoint set
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Check that the endpoint is known and all credential fields are set
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingField("endpoint"));
        }
        if endpoint_url(&self.endpoint).is_none() {
            return Err(ConfigError::UnknownEndpoint(self.endpoint.clone()));
        }
        if self.application_key.is_empty() {
            return Err(ConfigError::MissingField("application_key"));
        }
        if self.application_secret.is_empty() {
            return Err(ConfigError::MissingField("application_secret"));
        }
        if self.consumer_key.is_empty() {
            return Err(ConfigError::MissingField("consumer_key"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_known() {
        assert_eq!(endpoint_url("ovh-eu"), Some("https://eu.api.ovh.com/1.0"));
        assert_eq!(endpoint_url("ovh-ca"), Some("https://ca.api.ovh.com/1.0"));
    }

    #[test]
    fn endpoint_url_unknown() {
        assert_eq!(endpoint_url("ovh-moon"), None);
        assert_eq!(endpoint_url(""), None);
    }

    #[test]
    fn validate_complete_config() {
        let config = ClientConfig {
            endpoint: "ovh-eu".to_string(),
            application_key: "ak".to_string(),
            application_secret: "as".to_string(),
            consumer_key: "ck".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_endpoint() {
        let config = ClientConfig {
            endpoint: "nowhere".to_string(),
            application_key: "ak".to_string(),
            application_secret: "as".to_string(),
            consumer_key: "ck".to_string(),
        };
        match config.validate() {
            Err(ConfigError::UnknownEndpoint(name)) => assert_eq!(name, "nowhere"),
            other => panic!("Expected UnknownEndpoint, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_empty_credentials() {
        let config = ClientConfig::new("ovh-eu");
        match config.validate() {
            Err(ConfigError::MissingField(field)) => assert_eq!(field, "application_key"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }
}
