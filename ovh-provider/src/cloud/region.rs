//! Public cloud region data sources

use serde::Deserialize;

use ovh_client::{OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, DataSourceHandler, HandlerError, HandlerResult, RemoteState};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const REGION_DATA_SOURCE: &str = "ovh_cloud_region";
const REGIONS_DATA_SOURCE: &str = "ovh_cloud_regions";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    name: String,
    #[serde(default)]
    continent_code: Option<String>,
    #[serde(default)]
    datacenter_location: Option<String>,
    #[serde(default)]
    services: Vec<RegionService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionService {
    name: String,
    status: String,
}

/// Details of one cloud region
pub struct CloudRegion;

pub fn handler() -> Box<dyn DataSourceHandler> {
    Box::new(CloudRegion)
}

impl CloudRegion {
    async fn read_region(
        &self,
        client: &OvhClient,
        config: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let project_id = config
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let name = config
            .get_string("name")
            .ok_or_else(|| HandlerError::missing_attribute("name"))?;

        let region: Region = client
            .get(&format!(
                "/cloud/project/{}/region/{}",
                path_escape(project_id),
                path_escape(name)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(REGION_DATA_SOURCE))?;

        let mut attrs = Attributes::new()
            .with("project_id", project_id)
            .with("name", region.name.clone());
        if let Some(continent_code) = region.continent_code {
            attrs.insert("continent_code", continent_code);
        }
        if let Some(datacenter_location) = region.datacenter_location {
            attrs.insert("datacenter_location", datacenter_location);
        }
        attrs.insert(
            "services",
            Value::List(
                region
                    .services
                    .into_iter()
                    .map(|s| {
                        let mut entry = std::collections::HashMap::new();
                        entry.insert("name".to_string(), Value::String(s.name));
                        entry.insert("status".to_string(), Value::String(s.status));
                        Value::Map(entry)
                    })
                    .collect(),
            ),
        );

        Ok(RemoteState::existing(attrs).with_id(region.name))
    }
}

impl DataSourceHandler for CloudRegion {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("project_id", AttributeType::String)
                    .required()
                    .env_default("OVH_PROJECT_ID")
                    .with_description("The id of the cloud project."),
            )
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .with_description("The name of the region."),
            )
            .attribute(AttributeSchema::new("continent_code", AttributeType::String).computed())
            .attribute(
                AttributeSchema::new("datacenter_location", AttributeType::String).computed(),
            )
            .attribute(
                AttributeSchema::new(
                    "services",
                    AttributeType::List(Box::new(AttributeType::Map(Box::new(
                        AttributeType::String,
                    )))),
                )
                .computed(),
            )
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_region(client, config))
    }
}

/// Names of all regions of a cloud project
pub struct CloudRegions;

pub fn all_handler() -> Box<dyn DataSourceHandler> {
    Box::new(CloudRegions)
}

impl CloudRegions {
    async fn read_regions(
        &self,
        client: &OvhClient,
        config: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let project_id = config
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        let names: Vec<String> = client
            .get(&format!("/cloud/project/{}/region", path_escape(project_id)))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(REGIONS_DATA_SOURCE))?;

        let attrs = Attributes::new().with("project_id", project_id).with(
            "names",
            Value::List(names.into_iter().map(Value::String).collect()),
        );

        Ok(RemoteState::existing(attrs).with_id(project_id))
    }
}

impl DataSourceHandler for CloudRegions {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("project_id", AttributeType::String)
                    .required()
                    .env_default("OVH_PROJECT_ID")
                    .with_description("The id of the cloud project."),
            )
            .attribute(
                AttributeSchema::new("names", AttributeType::List(Box::new(AttributeType::String)))
                    .computed(),
            )
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_regions(client, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_deserializes_api_shape() {
        let region: Region = serde_json::from_str(
            r#"{
                "name": "GRA1",
                "continentCode": "EU",
                "datacenterLocation": "GRA",
                "services": [{"name": "network", "status": "UP"}]
            }"#,
        )
        .unwrap();
        assert_eq!(region.name, "GRA1");
        assert_eq!(region.continent_code.as_deref(), Some("EU"));
        assert_eq!(region.services.len(), 1);
    }

    #[test]
    fn region_schemas_differ_between_one_and_all() {
        assert!(CloudRegion.schema().attributes.contains_key("name"));
        assert!(CloudRegions.schema().attributes.contains_key("names"));
        assert!(!CloudRegions.schema().attributes.contains_key("name"));
    }
}
