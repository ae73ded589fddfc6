//! TCP farm server resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_iploadbalancing_tcp_farm_server";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerPayload<'a> {
    address: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_protocol_version: Option<&'a str>,
}

impl<'a> ServerPayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            address: desired
                .get_string("address")
                .ok_or_else(|| HandlerError::missing_attribute("address"))?,
            status: desired
                .get_string("status")
                .ok_or_else(|| HandlerError::missing_attribute("status"))?,
            port: desired.get_int("port"),
            weight: desired.get_int("weight"),
            probe: desired.get_bool("probe"),
            backup: desired.get_bool("backup"),
            ssl: desired.get_bool("ssl"),
            display_name: desired.get_string("display_name"),
            proxy_protocol_version: desired.get_string("proxy_protocol_version"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Server {
    server_id: i64,
    address: String,
    status: String,
    #[serde(default)]
    port: Option<i64>,
    #[serde(default)]
    weight: Option<i64>,
    #[serde(default)]
    probe: Option<bool>,
    #[serde(default)]
    backup: Option<bool>,
    #[serde(default)]
    ssl: Option<bool>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    proxy_protocol_version: Option<String>,
}

pub struct TcpFarmServer;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(TcpFarmServer)
}

impl TcpFarmServer {
    fn base_path(service_name: &str, farm_id: i64) -> String {
        format!(
            "/ipLoadbalancing/{}/tcp/farm/{}/server",
            path_escape(service_name),
            farm_id
        )
    }

    fn state_from(service_name: &str, farm_id: i64, server: Server) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("service_name", service_name)
            .with("farm_id", farm_id)
            .with("address", server.address)
            .with("status", server.status);
        if let Some(port) = server.port {
            attrs.insert("port", port);
        }
        if let Some(weight) = server.weight {
            attrs.insert("weight", weight);
        }
        if let Some(probe) = server.probe {
            attrs.insert("probe", probe);
        }
        if let Some(backup) = server.backup {
            attrs.insert("backup", backup);
        }
        if let Some(ssl) = server.ssl {
            attrs.insert("ssl", ssl);
        }
        if let Some(display_name) = server.display_name {
            attrs.insert("display_name", display_name);
        }
        if let Some(version) = server.proxy_protocol_version {
            attrs.insert("proxy_protocol_version", version);
        }
        RemoteState::existing(attrs).with_id(server.server_id.to_string())
    }

    fn context(attrs: &Attributes) -> HandlerResult<(&str, i64)> {
        let service_name = attrs
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let farm_id = attrs
            .get_int("farm_id")
            .ok_or_else(|| HandlerError::missing_attribute("farm_id"))?;
        Ok((service_name, farm_id))
    }

    async fn create_server(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let (service_name, farm_id) = Self::context(desired)?;
        let payload = ServerPayload::from_attributes(desired)?;

        let server: Server = client
            .post(&Self::base_path(service_name, farm_id), &payload)
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(service_name, farm_id, server))
    }

    async fn read_server(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let server_id = state.require_id()?;
        let (service_name, farm_id) = Self::context(&state.attributes)?;

        match client
            .get::<Server>(&format!(
                "{}/{}",
                Self::base_path(service_name, farm_id),
                server_id
            ))
            .await
        {
            Ok(server) => Ok(Self::state_from(service_name, farm_id, server)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_server(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let server_id = state.require_id()?;
        let (service_name, farm_id) = Self::context(desired)?;
        let payload = ServerPayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!("{}/{}", Self::base_path(service_name, farm_id), server_id),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_server(client, state).await
    }

    async fn delete_server(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let server_id = state.require_id()?;
        let (service_name, farm_id) = Self::context(&state.attributes)?;

        client
            .delete::<()>(&format!(
                "{}/{}",
                Self::base_path(service_name, farm_id),
                server_id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for TcpFarmServer {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new("farm_id", AttributeType::Int)
                    .required()
                    .with_description("The id of the farm the server joins."),
            )
            .attribute(
                AttributeSchema::new("address", AttributeType::String)
                    .required()
                    .with_description("The backend address."),
            )
            .attribute(
                AttributeSchema::new("status", AttributeType::String)
                    .required()
                    .with_description("active or inactive."),
            )
            .attribute(AttributeSchema::new("port", AttributeType::Int))
            .attribute(AttributeSchema::new("weight", AttributeType::Int))
            .attribute(AttributeSchema::new("probe", AttributeType::Bool))
            .attribute(AttributeSchema::new("backup", AttributeType::Bool))
            .attribute(AttributeSchema::new("ssl", AttributeType::Bool))
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
            .attribute(AttributeSchema::new(
                "proxy_protocol_version",
                AttributeType::String,
            ))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_server(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_server(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_server(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_server(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_address_and_status() {
        let desired = Attributes::new()
            .with("service_name", "loadbalancer-1")
            .with("farm_id", 99i64)
            .with("address", "10.0.0.5");
        assert!(ServerPayload::from_attributes(&desired).is_err());
    }

    #[test]
    fn payload_serializes_proxy_protocol_version() {
        let desired = Attributes::new()
            .with("address", "10.0.0.5")
            .with("status", "active")
            .with("proxy_protocol_version", "v2");
        let payload = ServerPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["proxyProtocolVersion"], "v2");
    }

    #[test]
    fn context_needs_farm_id_as_int() {
        let attrs = Attributes::new()
            .with("service_name", "loadbalancer-1")
            .with("farm_id", "not-a-number");
        assert!(TcpFarmServer::context(&attrs).is_err());
    }
}
