//! TCP farm resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_iploadbalancing_tcp_farm";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FarmPayload<'a> {
    zone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stickiness: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vrack_network_id: Option<i64>,
}

impl<'a> FarmPayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            zone: desired
                .get_string("zone")
                .ok_or_else(|| HandlerError::missing_attribute("zone"))?,
            balance: desired.get_string("balance"),
            display_name: desired.get_string("display_name"),
            port: desired.get_int("port"),
            stickiness: desired.get_string("stickiness"),
            vrack_network_id: desired.get_int("vrack_network_id"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Farm {
    farm_id: i64,
    zone: String,
    #[serde(default)]
    balance: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    port: Option<i64>,
    #[serde(default)]
    stickiness: Option<String>,
    #[serde(default)]
    vrack_network_id: Option<i64>,
}

pub struct TcpFarm;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(TcpFarm)
}

impl TcpFarm {
    fn state_from(service_name: &str, farm: Farm) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("service_name", service_name)
            .with("zone", farm.zone);
        if let Some(balance) = farm.balance {
            attrs.insert("balance", balance);
        }
        if let Some(display_name) = farm.display_name {
            attrs.insert("display_name", display_name);
        }
        if let Some(port) = farm.port {
            attrs.insert("port", port);
        }
        if let Some(stickiness) = farm.stickiness {
            attrs.insert("stickiness", stickiness);
        }
        if let Some(vrack_network_id) = farm.vrack_network_id {
            attrs.insert("vrack_network_id", vrack_network_id);
        }
        RemoteState::existing(attrs).with_id(farm.farm_id.to_string())
    }

    async fn create_farm(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = FarmPayload::from_attributes(desired)?;

        let farm: Farm = client
            .post(
                &format!("/ipLoadbalancing/{}/tcp/farm", path_escape(service_name)),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(service_name, farm))
    }

    async fn read_farm(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let farm_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        match client
            .get::<Farm>(&format!(
                "/ipLoadbalancing/{}/tcp/farm/{}",
                path_escape(service_name),
                farm_id
            ))
            .await
        {
            Ok(farm) => Ok(Self::state_from(service_name, farm)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_farm(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let farm_id = state.require_id()?;
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = FarmPayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!(
                    "/ipLoadbalancing/{}/tcp/farm/{}",
                    path_escape(service_name),
                    farm_id
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_farm(client, state).await
    }

    async fn delete_farm(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let farm_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        client
            .delete::<()>(&format!(
                "/ipLoadbalancing/{}/tcp/farm/{}",
                path_escape(service_name),
                farm_id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for TcpFarm {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new("zone", AttributeType::String)
                    .required()
                    .with_description("The zone the farm is declared in."),
            )
            .attribute(
                AttributeSchema::new("balance", AttributeType::String)
                    .with_description("The load balancing algorithm (roundrobin, source, ...)."),
            )
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
            .attribute(AttributeSchema::new("port", AttributeType::Int))
            .attribute(AttributeSchema::new("stickiness", AttributeType::String))
            .attribute(AttributeSchema::new("vrack_network_id", AttributeType::Int))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_farm(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_farm(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_farm(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_farm(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_camel_case() {
        let desired = Attributes::new()
            .with("service_name", "loadbalancer-1")
            .with("zone", "GRA")
            .with("display_name", "web-farm")
            .with("port", 8080i64)
            .with("vrack_network_id", 3i64);

        let payload = FarmPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["zone"], "GRA");
        assert_eq!(json["displayName"], "web-farm");
        assert_eq!(json["vrackNetworkId"], 3);
        assert!(json.get("balance").is_none());
    }

    #[test]
    fn state_uses_farm_id() {
        let farm = Farm {
            farm_id: 99,
            zone: "GRA".to_string(),
            balance: Some("roundrobin".to_string()),
            display_name: None,
            port: Some(8080),
            stickiness: None,
            vrack_network_id: None,
        };
        let state = TcpFarm::state_from("loadbalancer-1", farm);
        assert_eq!(state.id.as_deref(), Some("99"));
        assert_eq!(state.attributes.get_string("balance"), Some("roundrobin"));
    }
}
