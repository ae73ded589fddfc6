//! HTTP route resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const RESOURCE: &str = "ovh_iploadbalancing_http_route";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<i64>,
}

impl RouteAction {
    /// Build an action from the `action` map attribute
    fn from_attributes(desired: &Attributes) -> HandlerResult<Self> {
        let action = desired
            .get_map("action")
            .ok_or_else(|| HandlerError::missing_attribute("action"))?;

        let kind = match action.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(HandlerError::missing_attribute("action.type")),
        };
        let target = match action.get("target") {
            Some(Value::String(target)) => Some(target.clone()),
            _ => None,
        };
        let status = match action.get("status") {
            Some(Value::Int(status)) => Some(*status),
            _ => None,
        };

        Ok(Self {
            kind,
            target,
            status,
        })
    }

    fn to_value(&self) -> Value {
        let mut map = std::collections::HashMap::new();
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        if let Some(ref target) = self.target {
            map.insert("target".to_string(), Value::String(target.clone()));
        }
        if let Some(status) = self.status {
            map.insert("status".to_string(), Value::Int(status));
        }
        Value::Map(map)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutePayload<'a> {
    action: RouteAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    route_id: i64,
    action: RouteAction,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    weight: Option<i64>,
    #[serde(default)]
    frontend_id: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

pub struct HttpRoute;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(HttpRoute)
}

impl HttpRoute {
    fn state_from(service_name: &str, route: Route) -> RemoteState {
        let mut attrs = Attributes::new().with("service_name", service_name);
        attrs.insert("action", route.action.to_value());
        if let Some(display_name) = route.display_name {
            attrs.insert("display_name", display_name);
        }
        if let Some(weight) = route.weight {
            attrs.insert("weight", weight);
        }
        if let Some(frontend_id) = route.frontend_id {
            attrs.insert("frontend_id", frontend_id);
        }
        if let Some(status) = route.status {
            attrs.insert("status", status);
        }
        RemoteState::existing(attrs).with_id(route.route_id.to_string())
    }

    async fn create_route(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = RoutePayload {
            action: RouteAction::from_attributes(desired)?,
            display_name: desired.get_string("display_name"),
            weight: desired.get_int("weight"),
        };

        let route: Route = client
            .post(
                &format!("/ipLoadbalancing/{}/http/route", path_escape(service_name)),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(service_name, route))
    }

    async fn read_route(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let route_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        match client
            .get::<Route>(&format!(
                "/ipLoadbalancing/{}/http/route/{}",
                path_escape(service_name),
                route_id
            ))
            .await
        {
            Ok(route) => Ok(Self::state_from(service_name, route)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_route(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let route_id = state.require_id()?;
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let payload = RoutePayload {
            action: RouteAction::from_attributes(desired)?,
            display_name: desired.get_string("display_name"),
            weight: desired.get_int("weight"),
        };

        client
            .put::<_, ()>(
                &format!(
                    "/ipLoadbalancing/{}/http/route/{}",
                    path_escape(service_name),
                    route_id
                ),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_route(client, state).await
    }

    async fn delete_route(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let route_id = state.require_id()?;
        let service_name = state
            .attributes
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        client
            .delete::<()>(&format!(
                "/ipLoadbalancing/{}/http/route/{}",
                path_escape(service_name),
                route_id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for HttpRoute {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new("action", AttributeType::Map(Box::new(AttributeType::String)))
                    .required()
                    .with_description("Route action: type, optional target and status."),
            )
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
            .attribute(AttributeSchema::new("weight", AttributeType::Int))
            .attribute(AttributeSchema::new("frontend_id", AttributeType::Int).computed())
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_route(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_route(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_route(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_route(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn redirect_action() -> Value {
        let mut map = HashMap::new();
        map.insert("type".to_string(), Value::String("redirect".to_string()));
        map.insert(
            "target".to_string(),
            Value::String("https://example.net".to_string()),
        );
        map.insert("status".to_string(), Value::Int(302));
        Value::Map(map)
    }

    #[test]
    fn action_from_map_attribute() {
        let mut desired = Attributes::new();
        desired.insert("action", redirect_action());

        let action = RouteAction::from_attributes(&desired).unwrap();
        assert_eq!(action.kind, "redirect");
        assert_eq!(action.status, Some(302));

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "redirect");
        assert_eq!(json["status"], 302);
    }

    #[test]
    fn action_requires_type() {
        let mut desired = Attributes::new();
        desired.insert("action", Value::Map(HashMap::new()));
        assert!(RouteAction::from_attributes(&desired).is_err());
    }

    #[test]
    fn action_round_trips_through_state() {
        let route = Route {
            route_id: 12,
            action: RouteAction {
                kind: "reject".to_string(),
                target: None,
                status: Some(403),
            },
            display_name: None,
            weight: None,
            frontend_id: None,
            status: None,
        };

        let state = HttpRoute::state_from("loadbalancer-1", route);
        let action = state.attributes.get_map("action").unwrap();
        assert_eq!(action.get("type"), Some(&Value::String("reject".to_string())));
        assert_eq!(action.get("status"), Some(&Value::Int(403)));
    }
}
