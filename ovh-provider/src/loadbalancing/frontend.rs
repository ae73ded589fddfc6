//! TCP frontend resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const RESOURCE: &str = "ovh_iploadbalancing_tcp_frontend";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrontendPayload<'a> {
    /// Port or port range the frontend listens on, e.g. "80" or "80,443"
    port: &'a str,
    zone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_source: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dedicated_ipfo: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_farm_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_ssl_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl<'a> FrontendPayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            port: desired
                .get_string("port")
                .ok_or_else(|| HandlerError::missing_attribute("port"))?,
            zone: desired
                .get_string("zone")
                .ok_or_else(|| HandlerError::missing_attribute("zone"))?,
            allowed_source: desired.get_string_list("allowed_source"),
            dedicated_ipfo: desired.get_string_list("dedicated_ipfo"),
            default_farm_id: desired.get_int("default_farm_id"),
            default_ssl_id: desired.get_int("default_ssl_id"),
            disabled: desired.get_bool("disabled"),
            ssl: desired.get_bool("ssl"),
            display_name: desired.get_string("display_name"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Frontend {
    frontend_id: i64,
    port: String,
    zone: String,
    #[serde(default)]
    allowed_source: Option<Vec<String>>,
    #[serde(default)]
    dedicated_ipfo: Option<Vec<String>>,
    #[serde(default)]
    default_farm_id: Option<i64>,
    #[serde(default)]
    default_ssl_id: Option<i64>,
    #[serde(default)]
    disabled: Option<bool>,
    #[serde(default)]
    ssl: Option<bool>,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct TcpFrontend;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(TcpFrontend)
}

impl TcpFrontend {
    fn state_from(service_name: &str, frontend: Frontend) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("service_name", service_name)
            .with("port", frontend.port)
            .with("zone", frontend.zone);
        if let Some(sources) = frontend.allowed_source {
            attrs.insert(
                "allowed_source",
                Value::List(sources.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(ipfo) = frontend.dedicated_ipfo {
            attrs.insert(
                "dedicated_ipfo",
                Value::List(ipfo.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(default_farm_id) = frontend.default_farm_id {
            attrs.insert("default_farm_id", default_farm_id);
        }
        if let Some(default_ssl_id) = frontend.default_ssl_id {
            attrs.insert("default_ssl_id", default_ssl_id);
        }
        if let Some(disabled) = frontend.disabled {
            attrs.insert("disabled", disabled);
        }
        if let Some(ssl) = frontend.ssl {
            attrs.insert("ssl", ssl);
        }
        if let Some(display_name) = frontend.display_name {
            attrs.insert("display_name", display_name);
        }
        RemoteState::existing(attrs).with_id(frontend.frontend_id.to_string())
    }

    async fn create_frontend(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = FrontendPayload::from_attributes(desired)?;

        let frontend: Frontend = client
            .post(
                &format!(
                    "/ipLoadbalancing/{}/tcp/frontend",
                    path_escape(service_name)
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(service_name, frontend))
    }

    async fn read_frontend(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let frontend_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        match client
            .get::<Frontend>(&format!(
                "/ipLoadbalancing/{}/tcp/frontend/{}",
                path_escape(service_name),
                frontend_id
            ))
            .await
        {
            Ok(frontend) => Ok(Self::state_from(service_name, frontend)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_frontend(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let frontend_id = state.require_id()?;
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = FrontendPayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!(
                    "/ipLoadbalancing/{}/tcp/frontend/{}",
                    path_escape(service_name),
                    frontend_id
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_frontend(client, state).await
    }

    async fn delete_frontend(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let frontend_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        client
            .delete::<()>(&format!(
                "/ipLoadbalancing/{}/tcp/frontend/{}",
                path_escape(service_name),
                frontend_id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for TcpFrontend {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new("port", AttributeType::String)
                    .required()
                    .with_description("Port or port range to listen on (ex: \"80,443\")."),
            )
            .attribute(AttributeSchema::new("zone", AttributeType::String).required())
            .attribute(AttributeSchema::new(
                "allowed_source",
                AttributeType::List(Box::new(AttributeType::String)),
            ))
            .attribute(AttributeSchema::new(
                "dedicated_ipfo",
                AttributeType::List(Box::new(AttributeType::String)),
            ))
            .attribute(AttributeSchema::new("default_farm_id", AttributeType::Int))
            .attribute(AttributeSchema::new("default_ssl_id", AttributeType::Int))
            .attribute(AttributeSchema::new("disabled", AttributeType::Bool))
            .attribute(AttributeSchema::new("ssl", AttributeType::Bool))
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_frontend(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_frontend(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_frontend(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_frontend(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keeps_port_ranges_as_strings() {
        let desired = Attributes::new()
            .with("service_name", "loadbalancer-1")
            .with("port", "80,443")
            .with("zone", "all");
        let payload = FrontendPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["port"], "80,443");
    }

    #[test]
    fn state_round_trips_lists() {
        let frontend = Frontend {
            frontend_id: 5,
            port: "80".to_string(),
            zone: "all".to_string(),
            allowed_source: Some(vec!["192.0.2.0/24".to_string()]),
            dedicated_ipfo: None,
            default_farm_id: Some(99),
            default_ssl_id: None,
            disabled: Some(false),
            ssl: None,
            display_name: None,
        };
        let state = TcpFrontend::state_from("loadbalancer-1", frontend);
        assert_eq!(
            state.attributes.get_string_list("allowed_source"),
            Some(vec!["192.0.2.0/24"])
        );
        assert_eq!(state.attributes.get_int("default_farm_id"), Some(99));
    }
}
