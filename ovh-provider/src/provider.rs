//! Provider bootstrap
//!
//! The configuration schema, the configure entry point producing the
//! per-session API client, and the capability table mapping public
//! resource and data-source names to their handlers.

use std::path::Path;

use tracing::warn;

use ovh_client::{CredentialOverrides, OvhClient, credentials};
use ovh_core::registry::{DataSourceCtor, Registry, RegistryEntry, RegistryError, ResourceCtor};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

use crate::{cloud, domain, ip, loadbalancing, me, vrack};

/// Configuration schema for the provider block
pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new()
        .attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .required()
                .env_default("OVH_ENDPOINT")
                .with_description("The OVH API endpoint to target (ex: \"ovh-eu\")."),
        )
        .attribute(
            AttributeSchema::new("application_key", AttributeType::String)
                .env_default("OVH_APPLICATION_KEY")
                .with_description("The OVH API Application Key."),
        )
        .attribute(
            AttributeSchema::new("application_secret", AttributeType::String)
                .env_default("OVH_APPLICATION_SECRET")
                .with_description("The OVH API Application Secret."),
        )
        .attribute(
            AttributeSchema::new("consumer_key", AttributeType::String)
                .env_default("OVH_CONSUMER_KEY")
                .with_description("The OVH API Consumer key."),
        )
}

/// Resolve credentials and build the per-session API client
///
/// A failed home-directory lookup is degraded, not fatal: the credentials
/// file step is skipped and resolution continues with whatever the
/// configuration supplies.
pub fn configure(config: &Attributes) -> Result<OvhClient, ovh_client::ConfigError> {
    let home = credentials::home_dir();
    if home.is_none() {
        warn!("could not determine home directory; skipping credentials file");
    }
    configure_with_home(config, home.as_deref())
}

/// As [`configure`], with an explicit home directory
pub fn configure_with_home(
    config: &Attributes,
    home: Option<&Path>,
) -> Result<OvhClient, ovh_client::ConfigError> {
    let endpoint = config
        .get_string("endpoint")
        .ok_or(ovh_client::ConfigError::MissingField("endpoint"))?;

    let overrides = CredentialOverrides {
        application_key: config.get_string("application_key").map(str::to_owned),
        application_secret: config.get_string("application_secret").map(str::to_owned),
        consumer_key: config.get_string("consumer_key").map(str::to_owned),
    };

    let resolved = credentials::resolve(endpoint, &overrides, home)?;
    OvhClient::new(resolved)
}

fn resource(ctor: ResourceCtor) -> RegistryEntry<ResourceCtor> {
    RegistryEntry::new(ctor)
}

fn data_source(ctor: DataSourceCtor) -> RegistryEntry<DataSourceCtor> {
    RegistryEntry::new(ctor)
}

/// Build the capability table for this provider
///
/// Legacy `publiccloud` names stay registered as deprecated aliases and
/// construct the same handlers as their replacements.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();

    registry.register_data_source("ovh_cloud_region", data_source(cloud::region::handler))?;
    registry.register_data_source("ovh_cloud_regions", data_source(cloud::region::all_handler))?;
    registry.register_data_source("ovh_domain_zone", data_source(domain::zone::handler))?;
    registry.register_data_source("ovh_iploadbalancing", data_source(loadbalancing::service::handler))?;
    registry.register_data_source(
        "ovh_me_paymentmean_bankaccount",
        data_source(me::bank_account_handler),
    )?;
    registry.register_data_source(
        "ovh_me_paymentmean_creditcard",
        data_source(me::credit_card_handler),
    )?;

    // Legacy naming scheme (publiccloud)
    registry.register_data_source(
        "ovh_publiccloud_region",
        data_source(cloud::region::handler)
            .deprecated("Use ovh_cloud_region data source instead"),
    )?;
    registry.register_data_source(
        "ovh_publiccloud_regions",
        data_source(cloud::region::all_handler)
            .deprecated("Use ovh_cloud_regions data source instead"),
    )?;

    registry.register_resource(
        "ovh_iploadbalancing_tcp_farm",
        resource(loadbalancing::farm::handler),
    )?;
    registry.register_resource(
        "ovh_iploadbalancing_tcp_farm_server",
        resource(loadbalancing::farm_server::handler),
    )?;
    registry.register_resource(
        "ovh_iploadbalancing_tcp_frontend",
        resource(loadbalancing::frontend::handler),
    )?;
    registry.register_resource(
        "ovh_iploadbalancing_http_route",
        resource(loadbalancing::http_route::handler),
    )?;
    registry.register_resource(
        "ovh_iploadbalancing_http_route_rule",
        resource(loadbalancing::http_route_rule::handler),
    )?;
    registry.register_resource(
        "ovh_iploadbalancing_refresh",
        resource(loadbalancing::refresh::handler),
    )?;
    registry.register_resource("ovh_domain_zone_record", resource(domain::record::handler))?;
    registry.register_resource(
        "ovh_domain_zone_redirection",
        resource(domain::redirection::handler),
    )?;
    registry.register_resource("ovh_ip_reverse", resource(ip::handler))?;
    registry.register_resource(
        "ovh_cloud_network_private",
        resource(cloud::network::handler),
    )?;
    registry.register_resource(
        "ovh_cloud_network_private_subnet",
        resource(cloud::subnet::handler),
    )?;
    registry.register_resource("ovh_cloud_user", resource(cloud::user::handler))?;
    registry.register_resource("ovh_vrack_cloudproject", resource(vrack::handler))?;

    // Legacy naming scheme (publiccloud)
    registry.register_resource(
        "ovh_publiccloud_private_network",
        resource(cloud::network::handler)
            .deprecated("Use ovh_cloud_network_private resource instead"),
    )?;
    registry.register_resource(
        "ovh_publiccloud_private_network_subnet",
        resource(cloud::subnet::handler)
            .deprecated("Use ovh_cloud_network_private_subnet resource instead"),
    )?;
    registry.register_resource(
        "ovh_publiccloud_user",
        resource(cloud::user::handler).deprecated("Use ovh_cloud_user resource instead"),
    )?;
    registry.register_resource(
        "ovh_vrack_publiccloud_attachment",
        resource(vrack::handler).deprecated("Use ovh_vrack_cloudproject resource instead"),
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn provider_schema_fields() {
        let schema = provider_schema();

        let endpoint = schema.attributes.get("endpoint").unwrap();
        assert!(endpoint.required);
        assert_eq!(endpoint.default_env, Some("OVH_ENDPOINT"));

        let key = schema.attributes.get("application_key").unwrap();
        assert!(!key.required);
        assert_eq!(key.default_env, Some("OVH_APPLICATION_KEY"));

        assert!(schema.attributes.contains_key("application_secret"));
        assert!(schema.attributes.contains_key("consumer_key"));
    }

    #[test]
    fn configure_without_dotfile_uses_explicit_values() {
        let home = tempdir().unwrap();
        let config = Attributes::new()
            .with("endpoint", "ovh-eu")
            .with("application_key", "ak")
            .with("application_secret", "as")
            .with("consumer_key", "ck");

        let client = configure_with_home(&config, Some(home.path())).unwrap();
        assert_eq!(client.endpoint(), "ovh-eu");
    }

    #[test]
    fn configure_reads_dotfile_section() {
        let home = tempdir().unwrap();
        fs::write(
            home.path().join(".ovh.conf"),
            "[ovh-ca]\n\
             application_key = file-ak\n\
             application_secret = file-as\n\
             consumer_key = file-ck\n",
        )
        .unwrap();

        let config = Attributes::new().with("endpoint", "ovh-ca");
        let client = configure_with_home(&config, Some(home.path())).unwrap();
        assert_eq!(client.endpoint(), "ovh-ca");
    }

    #[test]
    fn configure_fails_on_missing_section() {
        let home = tempdir().unwrap();
        fs::write(home.path().join(".ovh.conf"), "[ovh-eu]\napplication_key = ak\n").unwrap();

        let config = Attributes::new()
            .with("endpoint", "ovh-ca")
            .with("application_key", "ak")
            .with("application_secret", "as")
            .with("consumer_key", "ck");

        let result = configure_with_home(&config, Some(home.path()));
        assert!(matches!(
            result,
            Err(ovh_client::ConfigError::MissingSection { .. })
        ));
    }

    #[test]
    fn configure_fails_without_credentials() {
        let home = tempdir().unwrap();
        let config = Attributes::new().with("endpoint", "ovh-eu");

        let result = configure_with_home(&config, Some(home.path()));
        assert!(matches!(
            result,
            Err(ovh_client::ConfigError::MissingField("application_key"))
        ));
    }

    #[test]
    fn configure_requires_endpoint() {
        let result = configure_with_home(&Attributes::new(), None);
        assert!(matches!(
            result,
            Err(ovh_client::ConfigError::MissingField("endpoint"))
        ));
    }

    #[test]
    fn registry_builds_without_duplicates() {
        let registry = registry().unwrap();
        assert_eq!(registry.resource_count(), 17);
        assert_eq!(registry.data_source_count(), 8);
    }

    #[test]
    fn deprecated_aliases_forward_to_modern_handlers() {
        let registry = registry().unwrap();

        let modern = registry.resource("ovh_cloud_user").unwrap();
        let legacy = registry.resource("ovh_publiccloud_user").unwrap();

        assert!(!modern.is_deprecated());
        assert_eq!(
            legacy.deprecation(),
            Some("Use ovh_cloud_user resource instead")
        );
        assert_eq!(modern.build().schema(), legacy.build().schema());
    }

    #[test]
    fn deprecated_region_alias_matches_modern_data_source() {
        let registry = registry().unwrap();

        let modern = registry.data_source("ovh_cloud_region").unwrap();
        let legacy = registry.data_source("ovh_publiccloud_region").unwrap();

        assert!(legacy.is_deprecated());
        assert_eq!(modern.build().schema(), legacy.build().schema());
    }

    #[test]
    fn every_registered_name_is_prefixed() {
        let registry = registry().unwrap();
        for name in registry
            .resource_names()
            .iter()
            .chain(registry.data_source_names().iter())
        {
            assert!(name.starts_with("ovh_"), "unexpected name {}", name);
        }
    }
}
