//! HTTP route rule resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_iploadbalancing_http_route_rule";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RulePayload<'a> {
    field: &'a str,
    #[serde(rename = "match")]
    matcher: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl<'a> RulePayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            field: desired
                .get_string("field")
                .ok_or_else(|| HandlerError::missing_attribute("field"))?,
            matcher: desired
                .get_string("match")
                .ok_or_else(|| HandlerError::missing_attribute("match"))?,
            pattern: desired.get_string("pattern"),
            negate: desired.get_bool("negate"),
            sub_field: desired.get_string("sub_field"),
            display_name: desired.get_string("display_name"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Rule {
    rule_id: i64,
    field: String,
    #[serde(rename = "match")]
    matcher: String,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    negate: Option<bool>,
    #[serde(default)]
    sub_field: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct HttpRouteRule;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(HttpRouteRule)
}

impl HttpRouteRule {
    fn base_path(service_name: &str, route_id: i64) -> String {
        format!(
            "/ipLoadbalancing/{}/http/route/{}/rule",
            path_escape(service_name),
            route_id
        )
    }

    fn state_from(service_name: &str, route_id: i64, rule: Rule) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("service_name", service_name)
            .with("route_id", route_id)
            .with("field", rule.field)
            .with("match", rule.matcher);
        if let Some(pattern) = rule.pattern {
            attrs.insert("pattern", pattern);
        }
        if let Some(negate) = rule.negate {
            attrs.insert("negate", negate);
        }
        if let Some(sub_field) = rule.sub_field {
            attrs.insert("sub_field", sub_field);
        }
        if let Some(display_name) = rule.display_name {
            attrs.insert("display_name", display_name);
        }
        RemoteState::existing(attrs).with_id(rule.rule_id.to_string())
    }

    fn context(attrs: &Attributes) -> HandlerResult<(&str, i64)> {
        let service_name = attrs
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;
        let route_id = attrs
            .get_int("route_id")
            .ok_or_else(|| HandlerError::missing_attribute("route_id"))?;
        Ok((service_name, route_id))
    }

    async fn create_rule(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let (service_name, route_id) = Self::context(desired)?;
        let payload = RulePayload::from_attributes(desired)?;

        let rule: Rule = client
            .post(&Self::base_path(service_name, route_id), &payload)
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(service_name, route_id, rule))
    }

    async fn read_rule(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let rule_id = state.require_id()?;
        let (service_name, route_id) = Self::context(&state.attributes)?;

        match client
            .get::<Rule>(&format!(
                "{}/{}",
                Self::base_path(service_name, route_id),
                rule_id
            ))
            .await
        {
            Ok(rule) => Ok(Self::state_from(service_name, route_id, rule)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_rule(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let rule_id = state.require_id()?;
        let (service_name, route_id) = Self::context(desired)?;
        let payload = RulePayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!("{}/{}", Self::base_path(service_name, route_id), rule_id),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        self.read_rule(client, state).await
    }

    async fn delete_rule(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let rule_id = state.require_id()?;
        let (service_name, route_id) = Self::context(&state.attributes)?;

        client
            .delete::<()>(&format!(
                "{}/{}",
                Self::base_path(service_name, route_id),
                rule_id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for HttpRouteRule {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new("route_id", AttributeType::Int)
                    .required()
                    .with_description("The id of the route the rule belongs to."),
            )
            .attribute(
                AttributeSchema::new("field", AttributeType::String)
                    .required()
                    .with_description("The request element to inspect (host, path, ...)."),
            )
            .attribute(
                AttributeSchema::new("match", AttributeType::String)
                    .required()
                    .with_description("The comparison operator (is, contains, ...)."),
            )
            .attribute(AttributeSchema::new("pattern", AttributeType::String))
            .attribute(AttributeSchema::new("negate", AttributeType::Bool))
            .attribute(AttributeSchema::new("sub_field", AttributeType::String))
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_rule(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_rule(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_rule(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_rule(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_match_keyword() {
        let desired = Attributes::new()
            .with("service_name", "loadbalancer-1")
            .with("route_id", 12i64)
            .with("field", "host")
            .with("match", "is")
            .with("pattern", "example.net");

        let payload = RulePayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["match"], "is");
        assert_eq!(json["field"], "host");
        assert!(json.get("matcher").is_none());
    }

    #[test]
    fn rule_deserializes_match_keyword() {
        let rule: Rule = serde_json::from_str(
            r#"{"ruleId": 3, "field": "path", "match": "startswith", "pattern": "/api"}"#,
        )
        .unwrap();
        assert_eq!(rule.rule_id, 3);
        assert_eq!(rule.matcher, "startswith");
    }
}
