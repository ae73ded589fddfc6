//! Credential resolution
//!
//! Combines three credential sources with defined precedence, lowest to
//! highest: environment defaults (applied by the caller before resolution),
//! the `~/.ovh.conf` dotfile section matching the endpoint, and explicit
//! configuration values.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ConfigError, ConfigResult};

/// Name of the per-user credentials file, looked up in the home directory
pub const CREDENTIALS_FILE_NAME: &str = ".ovh.conf";

/// Explicitly supplied credential values, which win over the dotfile
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub application_key: Option<String>,
    pub application_secret: Option<String>,
    pub consumer_key: Option<String>,
}

/// One section of the credentials file, keyed by endpoint name
///
/// Transient: copied into a [`ClientConfig`] and discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSection {
    pub application_key: Option<String>,
    pub application_secret: Option<String>,
    pub consumer_key: Option<String>,
}

/// Locate the invoking user's home directory
///
/// Falls back to `$HOME` when the platform lookup fails. Returns `None`
/// when both fail; callers treat that as "no dotfile" rather than an error.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().or_else(|| std::env::var_os("HOME").map(PathBuf::from))
}

/// Read the credentials file section matching `endpoint`
///
/// An absent file is not an error and yields `None`. A present file that
/// cannot be parsed, or that has no section named after the endpoint,
/// is a configuration error.
pub fn read_section(path: &Path, endpoint: &str) -> ConfigResult<Option<CredentialSection>> {
    if !path.exists() {
        return Ok(None);
    }

    let ini = Ini::load_from_file(path).map_err(|e| match e {
        ini::Error::Io(io) => ConfigError::CredentialsUnreadable {
            path: path.display().to_string(),
            message: io.to_string(),
        },
        ini::Error::Parse(parse) => ConfigError::CredentialsParse {
            path: path.display().to_string(),
            message: parse.to_string(),
        },
    })?;

    let section = ini
        .section(Some(endpoint))
        .ok_or_else(|| ConfigError::MissingSection {
            path: path.display().to_string(),
            endpoint: endpoint.to_string(),
        })?;

    Ok(Some(CredentialSection {
        application_key: section.get("application_key").map(str::to_owned),
        application_secret: section.get("application_secret").map(str::to_owned),
        consumer_key: section.get("consumer_key").map(str::to_owned),
    }))
}

/// Produce a resolved configuration for `endpoint`
///
/// `home` is the directory searched for the credentials file; passing
/// `None` skips the dotfile step entirely (degraded home lookup).
pub fn resolve(
    endpoint: &str,
    overrides: &CredentialOverrides,
    home: Option<&Path>,
) -> ConfigResult<ClientConfig> {
    let mut config = ClientConfig::new(endpoint);

    if let Some(home) = home {
        let path = home.join(CREDENTIALS_FILE_NAME);
        if let Some(section) = read_section(&path, endpoint)? {
            debug!(path = %path.display(), endpoint, "loaded credentials file section");
            if let Some(key) = section.application_key {
                config.application_key = key;
            }
            if let Some(secret) = section.application_secret {
                config.application_secret = secret;
            }
            if let Some(consumer) = section.consumer_key {
                config.consumer_key = consumer;
            }
        }
    }

    if let Some(ref key) = overrides.application_key {
        if !key.is_empty() {
            config.application_key = key.clone();
        }
    }
    if let Some(ref secret) = overrides.application_secret {
        if !secret.is_empty() {
            config.application_secret = secret.clone();
        }
    }
    if let Some(ref consumer) = overrides.consumer_key {
        if !consumer.is_empty() {
            config.consumer_key = consumer.clone();
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_credentials(dir: &Path, contents: &str) {
        fs::write(dir.join(CREDENTIALS_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn resolve_without_dotfile_keeps_endpoint_only() {
        let dir = tempdir().unwrap();
        let config = resolve("ovh-eu", &CredentialOverrides::default(), Some(dir.path())).unwrap();

        assert_eq!(config.endpoint, "ovh-eu");
        assert!(config.application_key.is_empty());
        assert!(config.application_secret.is_empty());
        assert!(config.consumer_key.is_empty());
    }

    #[test]
    fn resolve_without_home_skips_dotfile() {
        let overrides = CredentialOverrides {
            application_key: Some("ak".to_string()),
            ..Default::default()
        };
        let config = resolve("ovh-eu", &overrides, None).unwrap();

        assert_eq!(config.endpoint, "ovh-eu");
        assert_eq!(config.application_key, "ak");
    }

    #[test]
    fn resolve_reads_matching_section() {
        let dir = tempdir().unwrap();
        write_credentials(
            dir.path(),
            "[ovh-eu]\n\
             application_key = file-key\n\
             application_secret = file-secret\n\
             consumer_key = file-consumer\n",
        );

        let config = resolve("ovh-eu", &CredentialOverrides::default(), Some(dir.path())).unwrap();
        assert_eq!(config.application_key, "file-key");
        assert_eq!(config.application_secret, "file-secret");
        assert_eq!(config.consumer_key, "file-consumer");
    }

    #[test]
    fn explicit_override_wins_over_dotfile() {
        let dir = tempdir().unwrap();
        write_credentials(
            dir.path(),
            "[ovh-eu]\napplication_key = file-key\napplication_secret = file-secret\n",
        );

        let overrides = CredentialOverrides {
            application_key: Some("explicit-key".to_string()),
            ..Default::default()
        };
        let config = resolve("ovh-eu", &overrides, Some(dir.path())).unwrap();

        assert_eq!(config.application_key, "explicit-key");
        assert_eq!(config.application_secret, "file-secret");
    }

    #[test]
    fn empty_override_does_not_clobber_dotfile() {
        let dir = tempdir().unwrap();
        write_credentials(dir.path(), "[ovh-eu]\napplication_key = file-key\n");

        let overrides = CredentialOverrides {
            application_key: Some(String::new()),
            ..Default::default()
        };
        let config = resolve("ovh-eu", &overrides, Some(dir.path())).unwrap();

        assert_eq!(config.application_key, "file-key");
    }

    #[test]
    fn missing_section_is_an_error() {
        let dir = tempdir().unwrap();
        write_credentials(dir.path(), "[ovh-ca]\napplication_key = file-key\n");

        let result = resolve("ovh-eu", &CredentialOverrides::default(), Some(dir.path()));
        match result {
            Err(ConfigError::MissingSection { endpoint, .. }) => assert_eq!(endpoint, "ovh-eu"),
            other => panic!("Expected MissingSection, got {:?}", other),
        }
    }

    #[test]
    fn malformed_dotfile_is_a_parse_error() {
        let dir = tempdir().unwrap();
        write_credentials(dir.path(), "[ovh-eu\napplication_key");

        let result = resolve("ovh-eu", &CredentialOverrides::default(), Some(dir.path()));
        assert!(matches!(result, Err(ConfigError::CredentialsParse { .. })));
    }

    #[test]
    fn partial_section_leaves_other_fields_empty() {
        let dir = tempdir().unwrap();
        write_credentials(dir.path(), "[ovh-eu]\nconsumer_key = only-consumer\n");

        let config = resolve("ovh-eu", &CredentialOverrides::default(), Some(dir.path())).unwrap();
        assert!(config.application_key.is_empty());
        assert_eq!(config.consumer_key, "only-consumer");
    }
}
