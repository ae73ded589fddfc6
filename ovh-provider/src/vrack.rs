//! vRack public cloud project attachment resource
//!
//! Attach and detach operations run as asynchronous vRack tasks; a task
//! that can no longer be fetched has completed and been garbage collected.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_vrack_cloudproject";

const POLL_DELAY: Duration = Duration::from_secs(5);
const MAX_POLL_ATTEMPTS: usize = 120;

#[derive(Debug, Serialize)]
struct AttachPayload<'a> {
    project: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VrackTask {
    id: i64,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attachment {
    vrack: String,
    project: String,
}

pub struct VrackAttachment;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(VrackAttachment)
}

impl VrackAttachment {
    fn state_from(attachment: Attachment) -> RemoteState {
        let id = format!("vrack_{}-cloudproject_{}", attachment.vrack, attachment.project);
        let attrs = Attributes::new()
            .with("vrack_id", attachment.vrack)
            .with("project_id", attachment.project);
        RemoteState::existing(attrs).with_id(id)
    }

    /// Wait for a vRack task to finish; a vanished task is a finished task
    async fn wait_for_task(
        &self,
        client: &OvhClient,
        vrack_id: &str,
        task_id: i64,
    ) -> HandlerResult<()> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            let task = match client
                .get::<VrackTask>(&format!(
                    "/vrack/{}/task/{}",
                    path_escape(vrack_id),
                    task_id
                ))
                .await
            {
                Ok(task) => task,
                Err(ClientError::Api { status: 404, .. }) => return Ok(()),
                Err(e) => return Err(HandlerError::from(e).for_resource(RESOURCE)),
            };

            match task.status.as_str() {
                "done" => return Ok(()),
                "cancelled" | "error" => {
                    return Err(HandlerError::new(format!(
                        "vRack task {} ended with status {}",
                        task.id, task.status
                    ))
                    .for_resource(RESOURCE));
                }
                _ => tokio::time::sleep(POLL_DELAY).await,
            }
        }
        Err(
            HandlerError::new(format!("Timed out waiting for vRack task {}", task_id))
                .for_resource(RESOURCE),
        )
    }

    async fn attach(&self, client: &OvhClient, desired: &Attributes) -> HandlerResult<RemoteState> {
        let vrack_id = desired
            .get_string("vrack_id")
            .ok_or_else(|| HandlerError::missing_attribute("vrack_id"))?;
        let project_id = desired
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        let task: VrackTask = client
            .post(
                &format!("/vrack/{}/cloudProject", path_escape(vrack_id)),
                &AttachPayload { project: project_id },
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        self.wait_for_task(client, vrack_id, task.id).await?;

        let attachment: Attachment = client
            .get(&format!(
                "/vrack/{}/cloudProject/{}",
                path_escape(vrack_id),
                path_escape(project_id)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        Ok(Self::state_from(attachment))
    }

    async fn read_attachment(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let vrack_id = state
            .attributes
            .get_string("vrack_id")
            .ok_or_else(|| HandlerError::missing_attribute("vrack_id"))?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        match client
            .get::<Attachment>(&format!(
                "/vrack/{}/cloudProject/{}",
                path_escape(vrack_id),
                path_escape(project_id)
            ))
            .await
        {
            Ok(attachment) => Ok(Self::state_from(attachment)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn detach(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let vrack_id = state
            .attributes
            .get_string("vrack_id")
            .ok_or_else(|| HandlerError::missing_attribute("vrack_id"))?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        let task: VrackTask = client
            .delete(&format!(
                "/vrack/{}/cloudProject/{}",
                path_escape(vrack_id),
                path_escape(project_id)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        self.wait_for_task(client, vrack_id, task.id).await
    }
}

impl ResourceHandler for VrackAttachment {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("vrack_id", AttributeType::String)
                    .required()
                    .env_default("OVH_VRACK_ID")
                    .with_description("The id of the vRack."),
            )
            .attribute(
                AttributeSchema::new("project_id", AttributeType::String)
                    .required()
                    .env_default("OVH_PROJECT_ID")
                    .with_description("The id of the cloud project to attach."),
            )
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.attach(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_attachment(client, state))
    }

    fn update<'a>(
        &'a self,
        _client: &'a OvhClient,
        _state: &'a RemoteState,
        _desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(async {
            Err(HandlerError::new(
                "Attachments cannot be updated in place, detach and attach again",
            )
            .for_resource(RESOURCE))
        })
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.detach(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_identifier_combines_both_sides() {
        let state = VrackAttachment::state_from(Attachment {
            vrack: "pn-00042".to_string(),
            project: "abc123".to_string(),
        });
        assert_eq!(
            state.id.as_deref(),
            Some("vrack_pn-00042-cloudproject_abc123")
        );
        assert_eq!(state.attributes.get_string("vrack_id"), Some("pn-00042"));
    }

    #[test]
    fn task_deserializes_api_shape() {
        let task: VrackTask =
            serde_json::from_str(r#"{"id": 9, "status": "doing", "function": "add"}"#).unwrap();
        assert_eq!(task.id, 9);
        assert_eq!(task.status, "doing");
    }
}
