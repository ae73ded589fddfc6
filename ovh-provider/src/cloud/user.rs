//! Public cloud user resource
//!
//! User creation is asynchronous on the OVH side: the account is polled
//! until it leaves its creating state. The password is only returned by
//! the creation call and is carried forward in state afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

const RESOURCE: &str = "ovh_cloud_user";

const POLL_DELAY: Duration = Duration::from_secs(5);
const MAX_POLL_ATTEMPTS: usize = 60;

#[derive(Debug, Serialize)]
struct UserPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    id: i64,
    username: String,
    status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    creation_date: Option<String>,
}

pub struct CloudUser;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(CloudUser)
}

impl CloudUser {
    fn state_from(project_id: &str, user: User, password: Option<String>) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("project_id", project_id)
            .with("username", user.username)
            .with("status", user.status);
        if let Some(description) = user.description {
            attrs.insert("description", description);
        }
        if let Some(creation_date) = user.creation_date {
            attrs.insert("creation_date", creation_date);
        }
        if let Some(password) = password {
            attrs.insert("password", password);
        }
        RemoteState::existing(attrs).with_id(user.id.to_string())
    }

    async fn get_user(
        &self,
        client: &OvhClient,
        project_id: &str,
        user_id: &str,
    ) -> HandlerResult<Option<User>> {
        match client
            .get::<User>(&format!(
                "/cloud/project/{}/user/{}",
                path_escape(project_id),
                path_escape(user_id)
            ))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    /// Wait for the asynchronous account creation to settle
    async fn wait_for_ok(
        &self,
        client: &OvhClient,
        project_id: &str,
        user_id: &str,
    ) -> HandlerResult<User> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            if let Some(user) = self.get_user(client, project_id, user_id).await? {
                match user.status.as_str() {
                    "ok" => return Ok(user),
                    "error" => {
                        return Err(HandlerError::new(format!(
                            "User {} creation ended in error",
                            user_id
                        ))
                        .for_resource(RESOURCE));
                    }
                    _ => {}
                }
            }
            tokio::time::sleep(POLL_DELAY).await;
        }
        Err(
            HandlerError::new(format!("Timed out waiting for user {} creation", user_id))
                .for_resource(RESOURCE),
        )
    }

    async fn create_user(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let project_id = desired
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;
        let payload = UserPayload {
            description: desired.get_string("description"),
        };

        let created: User = client
            .post(
                &format!("/cloud/project/{}/user", path_escape(project_id)),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;

        let password = created.password.clone();
        let settled = self
            .wait_for_ok(client, project_id, &created.id.to_string())
            .await?;

        Ok(Self::state_from(project_id, settled, password))
    }

    async fn read_user(
        &self,
        client: &OvhClient,
        state: &RemoteState,
    ) -> HandlerResult<RemoteState> {
        let user_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        match self.get_user(client, project_id, user_id).await? {
            Some(user) => {
                // The API never returns the password again; keep the known one
                let password = state
                    .attributes
                    .get_string("password")
                    .map(str::to_owned);
                Ok(Self::state_from(project_id, user, password))
            }
            None => Ok(RemoteState::not_found()),
        }
    }

    async fn delete_user(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let user_id = state.require_id()?;
        let project_id = state
            .attributes
            .get_string("project_id")
            .ok_or_else(|| HandlerError::missing_attribute("project_id"))?;

        client
            .delete::<()>(&format!(
                "/cloud/project/{}/user/{}",
                path_escape(project_id),
                path_escape(user_id)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        Ok(())
    }
}

impl ResourceHandler for CloudUser {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("project_id", AttributeType::String)
                    .required()
                    .env_default("OVH_PROJECT_ID")
                    .with_description("The id of the cloud project."),
            )
            .attribute(
                AttributeSchema::new("description", AttributeType::String)
                    .with_description("A description for the user."),
            )
            .attribute(AttributeSchema::new("username", AttributeType::String).computed())
            .attribute(AttributeSchema::new("password", AttributeType::String).computed())
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
            .attribute(AttributeSchema::new("creation_date", AttributeType::String).computed())
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_user(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_user(client, state))
    }

    fn update<'a>(
        &'a self,
        _client: &'a OvhClient,
        _state: &'a RemoteState,
        _desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(async {
            Err(HandlerError::new("Users cannot be updated in place, delete and recreate")
                .for_resource(RESOURCE))
        })
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_user(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_keeps_creation_password() {
        let user = User {
            id: 7,
            username: "user-7".to_string(),
            status: "ok".to_string(),
            description: Some("backend".to_string()),
            password: None,
            creation_date: None,
        };

        let state = CloudUser::state_from("abc123", user, Some("secret".to_string()));
        assert_eq!(state.attributes.get_string("password"), Some("secret"));
        assert_eq!(state.id.as_deref(), Some("7"));
    }

    #[test]
    fn empty_payload_serializes_to_empty_object() {
        let payload = UserPayload { description: None };
        assert_eq!(serde_json::to_string(&payload).unwrap(), "{}");
    }
}
