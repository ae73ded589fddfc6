//! Public cloud private network resource

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const RESOURCE: &str = "ovh_cloud_network_private";

const POLL_DELAY: Duration = Duration::from_secs(5);
const MAX_POLL_ATTEMPTS: usize = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regions: Option<Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
struct RenamePayload<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkRegion {
    region: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Network {
    id: String,
    name: String,
    status: String,
    #[serde(default)]
    vlan_id: Option<i64>,
    #[serde(default)]
    regions: Vec<NetworkRegion>,
}

pub struct PrivateNetwork;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(PrivateNetwork)
}

impl PrivateNetwork {
    fn state_from(project_id: &str, network: Network) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("project_id", project_id)
            .with("name", network.name)
            .with("status", network.status);
        if let Some(vlan_id) = network.vlan_id {
            attrs.insert("vlan_id", vlan_id);
        }
        attrs.insert(
            "regions",
            Value::List(
                network
                    .regions
                    .into_iter()
                    .map(|r| Value::String(r.region))
                    .collect(),
            ),
        );
        RemoteState::existing(attrs).with_id(network.id)
    }

    async fn get_network(
        &self,
        client: &OvhClient,
        project_id: &str,
        network_id: &str,
    ) -> HandlerResult<Option<Network>> {
        match client
            .get::<Network>(&format!(
                "/cloud/project/{}/network/private/{}",
                path_escape(project_id),
                path_escape(network_id)
            ))
            .await
        {
            Ok(network) => Ok(Some(network)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    /// Wait until the network leaves its BUILDING state
    async fn wait_for_active(
        &self,
        client: &OvhClient,
        project_id: &str,
        network_id: &str,
    ) -> HandlerResult<Network> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            if let Some(network) = self.get_network(client, project_id, network_id).await? {
                match network.status.as_str() {
                    "ACTIVE" => return Ok(network),
                    "DELETING" => {
                        return Err(HandlerError::new(format!(
                            "Network {} is being deleted",
                            network_id
                        ))
                        .for_resource(RESOURCE));
                    }
                    _ => {}
                }
            }
            tokio::time::sleep(POLL_DELAY).await;
        }
        Err(
            HandlerError::new(format!("Timed out waiting for network {} to activate", network_id))
                .for_resource(RESOURCE),
        )
    }

    async fn create_network(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let project_id = desired
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let payload = NetworkPayload {
            name: desired
                .get_string("name")
                .ok_or_else(|| HandlerError::missing_attribute("name"))?,
            vlan_id: desired.get_int("vlan_id"),
            regions: desired.get_string_list("regions"),
        };

        let created: Network = client
            .post(
                &format!("/cloud/project/{}/network/private", path_escape(project_id)),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        let active = self.wait_for_active(client, project_id, &created.id).await?;
        Ok(Self::state_from(project_id, active))
    }

    async fn read_network(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let network_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        match self.get_network(client, project_id, network_id).await? {
            Some(network) => Ok(Self::state_from(project_id, network)),
            None => Ok(RemoteState::not_found()),
        }
    }

    async fn update_network(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let network_id = state.require_id()?;
        let project_id = desired
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        // Only the display name can change in place
        let payload = RenamePayload {
            name: desired
                .get_string("name")
                .ok_or_else(|| HandlerError::missing_attribute("name"))?,
        };

        client
            .put::<_, ()>(
                &format!(
                    "/cloud/project/{}/network/private/{}",
                    path_escape(project_id),
                    path_escape(network_id)
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_network(client, state).await
    }

    async fn delete_network(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let network_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        client
            .delete::<()>(&format!(
                "/cloud/project/{}/network/private/{}",
                path_escape(project_id),
                path_escape(network_id)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        for _ in 0..MAX_POLL_ATTEMPTS {
            if self.get_network(client, project_id, network_id).await?.is_none() {
                return Ok(());
            }
            tokio::time::sleep(POLL_DELAY).await;
        }
        Err(
            HandlerError::new(format!("Timed out waiting for network {} deletion", network_id))
                .for_resource(RESOURCE),
        )
    }
}

impl ResourceHandler for PrivateNetwork {
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
                    .with_description("The name of the network."),
            )
            .attribute(AttributeSchema::new("vlan_id", AttributeType::Int))
            .attribute(AttributeSchema::new(
                "regions",
                AttributeType::List(Box::new(AttributeType::String)),
            ))
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_network(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_network(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_network(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_network(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_omits_empty_options() {
        let desired = Attributes::new()
            .with("project_id", "abc123")
            .with("name", "backend-net");
        let payload = NetworkPayload {
            name: desired.get_string("name").unwrap(),
            vlan_id: desired.get_int("vlan_id"),
            regions: desired.get_string_list("regions"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["name"], "backend-net");
        assert!(json.get("vlanId").is_none());
        assert!(json.get("regions").is_none());
    }

    #[test]
    fn state_flattens_region_statuses() {
        let network = Network {
            id: "pn-1".to_string(),
            name: "backend-net".to_string(),
            status: "ACTIVE".to_string(),
            vlan_id: Some(42),
            regions: vec![
                NetworkRegion {
                    region: "GRA1".to_string(),
                },
                NetworkRegion {
                    region: "SBG1".to_string(),
                },
            ],
        };

        let state = PrivateNetwork::state_from("abc123", network);
        assert_eq!(state.id.as_deref(), Some("pn-1"));
        assert_eq!(
            state.attributes.get_string_list("regions"),
            Some(vec!["GRA1", "SBG1"])
        );
        assert_eq!(state.attributes.get_int("vlan_id"), Some(42));
    }
}
