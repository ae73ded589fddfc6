//! DNS zone redirection resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

use super::refresh_zone;

const RESOURCE: &str = "ovh_domain_zone_redirection";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RedirectionPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_domain: Option<&'a str>,
    #[serde(rename = "type")]
    kind: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

impl<'a> RedirectionPayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            sub_domain: desired.get_string("subdomain"),
            kind: desired
                .get_string("type")
                .ok_or_else(|| HandlerError::missing_attribute("type"))?,
            target: desired
                .get_string("target")
                .ok_or_else(|| HandlerError::missing_attribute("target"))?,
            description: desired.get_string("description"),
            keywords: desired.get_string("keywords"),
            title: desired.get_string("title"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Redirection {
    id: i64,
    zone: String,
    #[serde(default)]
    sub_domain: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    target: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

pub struct ZoneRedirection;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(ZoneRedirection)
}

impl ZoneRedirection {
    fn state_from(redirection: Redirection) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("zone", redirection.zone)
            .with("type", redirection.kind)
            .with("target", redirection.target);
        if let Some(sub) = redirection.sub_domain {
            attrs.insert("subdomain", sub);
        }
        if let Some(description) = redirection.description {
            attrs.insert("description", description);
        }
        if let Some(keywords) = redirection.keywords {
            attrs.insert("keywords", keywords);
        }
        if let Some(title) = redirection.title {
            attrs.insert("title", title);
        }
        RemoteState::existing(attrs).with_id(redirection.id.to_string())
    }

    async fn create_redirection(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let zone = desired
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;
        let payload = RedirectionPayload::from_attributes(desired)?;

        let redirection: Redirection = client
            .post(
                &format!("/domain/zone/{}/redirection", path_escape(zone)),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await?;

        Ok(Self::state_from(redirection))
    }

    async fn read_redirection(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let id = state.require_id()?;
        let zone = state
            .attributes
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;

        match client
            .get::<Redirection>(&format!(
                "/domain/zone/{}/redirection/{}",
                path_escape(zone),
                id
            ))
            .await
        {
            Ok(redirection) => Ok(Self::state_from(redirection)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_redirection(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let id = state.require_id()?;
        let zone = desired
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;
        let payload = RedirectionPayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!("/domain/zone/{}/redirection/{}", path_escape(zone), id),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await?;

        self.read_redirection(client, state).await
    }

    async fn delete_redirection(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<()> {
        let id = state.require_id()?;
        let zone = state
            .attributes
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;

        client
            .delete::<()>(&format!(
                "/domain/zone/{}/redirection/{}",
                path_escape(zone),
                id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await
    }
}

impl ResourceHandler for ZoneRedirection {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("zone", AttributeType::String)
                    .required()
                    .with_description("The domain to add the redirection to."),
            )
            .attribute(AttributeSchema::new("subdomain", AttributeType::String))
            .attribute(
                AttributeSchema::new("type", AttributeType::String)
                    .required()
                    .with_description(
                        "The type of the redirection (visible, invisible, visiblePermanent).",
                    ),
            )
            .attribute(
                AttributeSchema::new("target", AttributeType::String)
                    .required()
                    .with_description("The URL to redirect to."),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String))
            .attribute(AttributeSchema::new("keywords", AttributeType::String))
            .attribute(AttributeSchema::new("title", AttributeType::String))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_redirection(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_redirection(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_redirection(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_redirection(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_renames_type_field() {
        let desired = Attributes::new()
            .with("zone", "example.net")
            .with("type", "visible")
            .with("target", "https://example.org");

        let payload = RedirectionPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "visible");
        assert_eq!(json["target"], "https://example.org");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn missing_type_is_rejected() {
        let desired = Attributes::new()
            .with("zone", "example.net")
            .with("target", "https://example.org");
        assert!(RedirectionPayload::from_attributes(&desired).is_err());
    }
}
