//! Public cloud private network subnet resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_cloud_network_private_subnet";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubnetPayload<'a> {
    region: &'a str,
    network: &'a str,
    start: &'a str,
    end: &'a str,
    dhcp: bool,
    no_gateway: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Subnet {
    id: String,
    cidr: String,
    #[serde(default)]
    gateway_ip: Option<String>,
    #[serde(default)]
    ip_pools: Vec<IpPool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpPool {
    #[serde(default)]
    region: Option<String>,
    start: String,
    end: String,
    dhcp: bool,
}

pub struct PrivateSubnet;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(PrivateSubnet)
}

impl PrivateSubnet {
    fn state_from(project_id: &str, network_id: &str, subnet: Subnet) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("project_id", project_id)
            .with("network_id", network_id)
            .with("network", subnet.cidr);
        if let Some(gateway_ip) = subnet.gateway_ip {
            attrs.insert("gateway_ip", gateway_ip);
        }
        if let Some(pool) = subnet.ip_pools.first() {
            if let Some(ref region) = pool.region {
                attrs.insert("region", region.clone());
            }
            attrs.insert("start", pool.start.clone());
            attrs.insert("end", pool.end.clone());
            attrs.insert("dhcp", pool.dhcp);
        }
        RemoteState::existing(attrs).with_id(subnet.id)
    }

    async fn create_subnet(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let project_id = desired
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let network_id = desired
            .get_string("network_id")
            .ok_or_else(|| HandlerError::missing_attribute("network_id"))?;
        let payload = SubnetPayload {
            region: desired
                .get_string("region")
                .ok_or_else(|| HandlerError::missing_attribute("region"))?,
            network: desired
                .get_string("network")
                .ok_or_else(|| HandlerError::missing_attribute("network"))?,
            start: desired
                .get_string("start")
                .ok_or_else(|| HandlerError::missing_attribute("start"))?,
            end: desired
                .get_string("end")
                .ok_or_else(|| HandlerError::missing_attribute("end"))?,
            dhcp: desired.get_bool_or("dhcp", false),
            no_gateway: desired.get_bool_or("no_gateway", false),
        };

        let subnet: Subnet = client
            .post(
                &format!(
                    "/cloud/project/{}/network/private/{}/subnet",
                    path_escape(project_id),
                    path_escape(network_id)
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(project_id, network_id, subnet))
    }

    async fn read_subnet(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let subnet_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let network_id = state
            .attributes
            .get_string("network_id")
            .ok_or_else(|| HandlerError::missing_attribute("network_id"))?;

        // Subnets have no per-id endpoint; list and filter
        let subnets: Vec<Subnet> = match client
            .get(&format!(
                "/cloud/project/{}/network/private/{}/subnet",
                path_escape(project_id),
                path_escape(network_id)
            ))
            .await
        {
            Ok(subnets) => subnets,
            Err(ClientError::Api { status: 404, .. }) => return Ok(RemoteState::not_found()),
            Err(e) => return Err(HandlerError::from(e).for_resource(RESOURCE)),
        };

        match subnets.into_iter().find(|s| s.id == subnet_id) {
            Some(subnet) => Ok(Self::state_from(project_id, network_id, subnet)),
            None => Ok(RemoteState::not_found()),
        }
    }

    async fn delete_subnet(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let subnet_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let network_id = state
            .attributes
            .get_string("network_id")
            .ok_or_else(|| HandlerError::missing_attribute("network_id"))?;

        client
            .delete::<()>(&format!(
                "/cloud/project/{}/network/private/{}/subnet/{}",
                path_escape(project_id),
                path_escape(network_id),
                path_escape(subnet_id)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for PrivateSubnet {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("project_id", AttributeType::String)
                    .required()
                    .env_default("OVH_PROJECT_ID")
                    .with_description("The id of the cloud project."),
            )
            .attribute(
                AttributeSchema::new("network_id", AttributeType::String)
                    .required()
                    .with_description("The id of the private network."),
            )
            .attribute(AttributeSchema::new("region", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("network", AttributeType::String)
                    .required()
                    .with_description("The CIDR of the subnet."),
            )
            .attribute(
                AttributeSchema::new("start", AttributeType::String)
                    .required()
                    .with_description("First allocatable address."),
            )
            .attribute(
                AttributeSchema::new("end", AttributeType::String)
                    .required()
                    .with_description("Last allocatable address."),
            )
            .attribute(AttributeSchema::new("dhcp", AttributeType::Bool))
            .attribute(AttributeSchema::new("no_gateway", AttributeType::Bool))
            .attribute(AttributeSchema::new("gateway_ip", AttributeType::String).computed())
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_subnet(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_subnet(client, state))
    }

    fn update<'a>(
        &'a self,
        _client: &'a OvhClient,
        _state: &'a RemoteState,
        _desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(async {
            Err(HandlerError::new("Subnets cannot be updated in place, delete and recreate")
                .for_resource(RESOURCE))
        })
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_subnet(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_camel_case() {
        let payload = SubnetPayload {
            region: "GRA1",
            network: "10.0.0.0/24",
            start: "10.0.0.10",
            end: "10.0.0.200",
            dhcp: true,
            no_gateway: false,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["noGateway"], false);
        assert_eq!(json["network"], "10.0.0.0/24");
    }

    #[test]
    fn state_copies_first_pool() {
        let subnet = Subnet {
            id: "sn-1".to_string(),
            cidr: "10.0.0.0/24".to_string(),
            gateway_ip: Some("10.0.0.1".to_string()),
            ip_pools: vec![IpPool {
                region: Some("GRA1".to_string()),
                start: "10.0.0.10".to_string(),
                end: "10.0.0.200".to_string(),
                dhcp: true,
            }],
        };

        let state = PrivateSubnet::state_from("abc123", "pn-1", subnet);
        assert_eq!(state.attributes.get_string("region"), Some("GRA1"));
        assert_eq!(state.attributes.get_string("gateway_ip"), Some("10.0.0.1"));
        assert_eq!(state.attributes.get_bool("dhcp"), Some(true));
    }
}
