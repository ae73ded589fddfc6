//! Reverse DNS resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_ip_reverse";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReversePayload<'a> {
    ip_reverse: &'a str,
    reverse: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reverse {
    ip_reverse: String,
    reverse: String,
}

pub struct IpReverse;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(IpReverse)
}

impl IpReverse {
    fn state_from(block: &str, reverse: Reverse) -> RemoteState {
        let attrs = Attributes::new()
            .with("ip", block)
            .with("ip_reverse", reverse.ip_reverse.clone())
            .with("reverse", reverse.reverse);
        RemoteState::existing(attrs).with_id(reverse.ip_reverse)
    }

    async fn create_reverse(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let block = desired
            .get_string("ip")
            .ok_or_else(|| HandlerError::missing_attribute("ip"))?;
        // The targeted address defaults to the block itself for /32 entries
        let address = desired.get_string("ip_reverse").unwrap_or(block);
        let payload = ReversePayload {
            ip_reverse: address,
            reverse: desired
                .get_string("reverse")
                .ok_or_else(|| HandlerError::missing_attribute("reverse"))?,
        };

        let reverse: Reverse = client
            .post(&format!("/ip/{}/reverse", path_escape(block)), &payload)
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(block, reverse))
    }

    async fn read_reverse(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let address = state.require_id()?;
        let block = state
            .attributes
            .get_string("ip")
            .ok_or_else(|| HandlerError::missing_attribute("ip"))?;

        match client
            .get::<Reverse>(&format!(
                "/ip/{}/reverse/{}",
                path_escape(block),
                path_escape(address)
            ))
            .await
        {
            Ok(reverse) => Ok(Self::state_from(block, reverse)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_reverse(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        // A reverse entry is replaced by posting the same address again
        self.delete_reverse(client, state).await?;
        self.create_reverse(client, desired).await
    }

    async fn delete_reverse(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let address = state.require_id()?;
        let block = state
            .attributes
            .get_string("ip")
            .ok_or_else(|| HandlerError::missing_attribute("ip"))?;

        client
            .delete::<()>(&format!(
                "/ip/{}/reverse/{}",
                path_escape(block),
                path_escape(address)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for IpReverse {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("ip", AttributeType::String)
                    .required()
                    .with_description("The IP block the reverse entry belongs to."),
            )
            .attribute(
                AttributeSchema::new("ip_reverse", AttributeType::String)
                    .with_description("The address inside the block; defaults to the block."),
            )
            .attribute(
                AttributeSchema::new("reverse", AttributeType::String)
                    .required()
                    .with_description("The hostname the address resolves back to."),
            )
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_reverse(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_reverse(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_reverse(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_reverse(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_field_names() {
        let payload = ReversePayload {
            ip_reverse: "192.0.2.1",
            reverse: "host.example.net.",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["ipReverse"], "192.0.2.1");
        assert_eq!(json["reverse"], "host.example.net.");
    }

    #[test]
    fn state_uses_address_as_identifier() {
        let reverse = Reverse {
            ip_reverse: "192.0.2.1".to_string(),
            reverse: "host.example.net.".to_string(),
        };
        let state = IpReverse::state_from("192.0.2.0/24", reverse);
        assert_eq!(state.id.as_deref(), Some("192.0.2.1"));
        assert_eq!(state.attributes.get_string("ip"), Some("192.0.2.0/24"));
    }
}
