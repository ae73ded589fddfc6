//! DNS zone data source

use serde::Deserialize;

use ovh_client::{OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, DataSourceHandler, HandlerError, HandlerResult, RemoteState};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const DATA_SOURCE: &str = "ovh_domain_zone";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Zone {
    name: String,
    dnssec_supported: bool,
    has_dns_anycast: bool,
    #[serde(default)]
    last_update: Option<String>,
    name_servers: Vec<String>,
}

pub struct DomainZone;

pub fn handler() -> Box<dyn DataSourceHandler> {
    Box::new(DomainZone)
}

impl DomainZone {
    async fn read_zone(&self, client: &OvhClient, config: &Attributes) -> HandlerResult<RemoteState> {
        let name = config
            .get_string("name")
            .ok_or_else(|| HandlerError::missing_attribute("name"))?;

        let zone: Zone = client
            .get(&format!("/domain/zone/{}", path_escape(name)))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(DATA_SOURCE))?;

        let mut attrs = Attributes::new()
            .with("name", zone.name.clone())
            .with("dnssec_supported", zone.dnssec_supported)
            .with("has_dns_anycast", zone.has_dns_anycast);
        if let Some(last_update) = zone.last_update {
            attrs.insert("last_update", last_update);
        }
        attrs.insert(
            "name_servers",
            Value::List(zone.name_servers.into_iter().map(Value::String).collect()),
        );

        Ok(RemoteState::existing(attrs).with_id(zone.name))
    }
}

impl DataSourceHandler for DomainZone {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .with_description("The name of the domain zone."),
            )
            .attribute(AttributeSchema::new("dnssec_supported", AttributeType::Bool).computed())
            .attribute(AttributeSchema::new("has_dns_anycast", AttributeType::Bool).computed())
            .attribute(AttributeSchema::new("last_update", AttributeType::String).computed())
            .attribute(
                AttributeSchema::new(
                    "name_servers",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .computed(),
            )
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_zone(client, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_marks_outputs_computed() {
        let schema = DomainZone.schema();
        assert!(schema.attributes.get("name").unwrap().required);
        assert!(schema.attributes.get("name_servers").unwrap().computed);
        assert!(schema.attributes.get("dnssec_supported").unwrap().computed);
    }

    #[test]
    fn zone_deserializes_api_shape() {
        let zone: Zone = serde_json::from_str(
            r#"{
                "name": "example.net",
                "dnssecSupported": true,
                "hasDnsAnycast": false,
                "lastUpdate": "2017-08-01T12:00:00+02:00",
                "nameServers": ["dns100.ovh.net", "ns100.ovh.net"]
            }"#,
        )
        .unwrap();
        assert_eq!(zone.name, "example.net");
        assert!(zone.dnssec_supported);
        assert_eq!(zone.name_servers.len(), 2);
    }
}
