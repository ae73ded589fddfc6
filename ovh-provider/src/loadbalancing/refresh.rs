//! Load balancer refresh resource
//!
//! Applying farm or frontend changes requires a refresh of the load
//! balancer configuration. The refresh runs as a task; creation waits for
//! it to finish. The `keepers` list retriggers a refresh when it changes.

use std::time::Duration;

use serde::Deserialize;

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const RESOURCE: &str = "ovh_iploadbalancing_refresh";

const POLL_DELAY: Duration = Duration::from_secs(5);
const MAX_POLL_ATTEMPTS: usize = 120;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    id: i64,
    status: String,
}

pub struct LoadBalancerRefresh;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(LoadBalancerRefresh)
}

impl LoadBalancerRefresh {
    async fn wait_for_task(
        &self,
        client: &OvhClient,
        service_name: &str,
        task_id: i64,
    ) -> HandlerResult<()> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            let task = match client
                .get::<Task>(&format!(
                    "/ipLoadbalancing/{}/task/{}",
                    path_escape(service_name),
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
                "error" | "blocked" | "cancelled" => {
                    return Err(HandlerError::new(format!(
                        "Refresh task {} ended with status {}",
                        task.id, task.status
                    ))
                    .for_resource(RESOURCE));
                }
                _ => tokio::time::sleep(POLL_DELAY).await,
            }
        }
        Err(
            HandlerError::new(format!("Timed out waiting for refresh task {}", task_id))
                .for_resource(RESOURCE),
        )
    }

    async fn run_refresh(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let service_name = desired
            .get_string("service_name")
            .ok_or_else(|| HandlerError::missing_attribute("service_name"))?;

        let task: Task = client
            .post_empty(&format!(
                "/ipLoadbalancing/{}/refresh",
                path_escape(service_name)
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        self.wait_for_task(client, service_name, task.id).await?;

        let mut attrs = Attributes::new().with("service_name", service_name);
        if let Some(keepers) = desired.get_string_list("keepers") {
            attrs.insert(
                "keepers",
                Value::List(
                    keepers
                        .into_iter()
                        .map(|k| Value::String(k.to_string()))
                        .collect(),
                ),
            );
        }
        Ok(RemoteState::existing(attrs).with_id(task.id.to_string()))
    }
}

impl ResourceHandler for LoadBalancerRefresh {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .required()
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(
                AttributeSchema::new(
                    "keepers",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .required()
                .with_description("Values whose change retriggers the refresh."),
            )
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.run_refresh(client, desired))
    }

    /// A refresh has no remote object to observe; the last applied state stands
    fn read<'a>(
        &'a self,
        _client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(async move { Ok(state.clone()) })
    }

    /// A changed keeper list means a new refresh
    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        _state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.run_refresh(client, desired))
    }

    /// Nothing to tear down remotely
    fn delete<'a>(
        &'a self,
        _client: &'a OvhClient,
        _state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_keepers() {
        let schema = LoadBalancerRefresh.schema();
        assert!(schema.attributes.get("keepers").unwrap().required);
    }

    #[test]
    fn task_deserializes_api_shape() {
        let task: Task = serde_json::from_str(
            r#"{"id": 71, "status": "todo", "action": "refreshIplb", "progress": 0}"#,
        )
        .unwrap();
        assert_eq!(task.id, 71);
        assert_eq!(task.status, "todo");
    }
}
