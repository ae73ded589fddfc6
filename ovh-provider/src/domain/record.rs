//! DNS zone record resource

use serde::{Deserialize, Serialize};

use ovh_client::{ClientError, OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, HandlerError, HandlerResult, RemoteState, ResourceHandler};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::Attributes;

use super::refresh_zone;

const RESOURCE: &str = "ovh_domain_zone_record";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordPayload<'a> {
    field_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_domain: Option<&'a str>,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
}

impl<'a> RecordPayload<'a> {
    fn from_attributes(desired: &'a Attributes) -> HandlerResult<Self> {
        Ok(Self {
            field_type: desired
                .get_string("fieldtype")
                .ok_or_else(|| HandlerError::missing_attribute("fieldtype"))?,
            sub_domain: desired.get_string("subdomain"),
            target: desired
                .get_string("target")
                .ok_or_else(|| HandlerError::missing_attribute("target"))?,
            ttl: desired.get_int("ttl"),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    id: i64,
    zone: String,
    field_type: String,
    #[serde(default)]
    sub_domain: Option<String>,
    target: String,
    #[serde(default)]
    ttl: Option<i64>,
}

pub struct ZoneRecord;

pub fn handler() -> Box<dyn ResourceHandler> {
    Box::new(ZoneRecord)
}

impl ZoneRecord {
    fn state_from(record: Record) -> RemoteState {
        let mut attrs = Attributes::new()
            .with("zone", record.zone)
            .with("fieldtype", record.field_type)
            .with("target", record.target);
        if let Some(sub) = record.sub_domain {
            attrs.insert("subdomain", sub);
        }
        if let Some(ttl) = record.ttl {
            attrs.insert("ttl", ttl);
        }
        RemoteState::existing(attrs).with_id(record.id.to_string())
    }

    async fn create_record(
        &self,
        client: &OvhClient,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let zone = desired
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;
        let payload = RecordPayload::from_attributes(desired)?;

        let record: Record = client
            .post(&format!("/domain/zone/{}/record", path_escape(zone)), &payload)
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await?;

        Ok(Self::state_from(record))
    }

    async fn read_record(
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
            .get::<Record>(&format!(
                "/domain/zone/{}/record/{}",
                path_escape(zone),
                id
            ))
            .await
        {
            Ok(record) => Ok(Self::state_from(record)),
            Err(ClientError::Api { status: 404, .. }) => Ok(RemoteState::not_found()),
            Err(e) => Err(HandlerError::from(e).for_resource(RESOURCE)),
        }
    }

    async fn update_record(
        &self,
        client: &OvhClient,
        state: &RemoteState,
        desired: &Attributes,
    ) -> HandlerResult<RemoteState> {
        let id = state.require_id()?;
        let zone = desired
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;
        let payload = RecordPayload::from_attributes(desired)?;

        client
            .put::<_, ()>(
                &format!("/domain/zone/{}/record/{}", path_escape(zone), id),
                &payload,
            )
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await?;

        self.read_record(client, state).await
    }

    async fn delete_record(&self, client: &OvhClient, state: &RemoteState) -> HandlerResult<()> {
        let id = state.require_id()?;
        let zone = state
            .attributes
            .get_string("zone")
            .ok_or_else(|| HandlerError::missing_attribute("zone"))?;

        client
            .delete::<()>(&format!(
                "/domain/zone/{}/record/{}",
                path_escape(zone),
                id
            ))
            .await
            .map_err(|e| HandlerError::from(e).for_resource(RESOURCE))?;
        refresh_zone(client, zone).await
    }
}

impl ResourceHandler for ZoneRecord {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("zone", AttributeType::String)
                    .required()
                    .with_description("The domain to add the record to."),
            )
            .attribute(
                AttributeSchema::new("fieldtype", AttributeType::String)
                    .required()
                    .with_description("The type of the record (A, AAAA, CNAME, TXT, ...)."),
            )
            .attribute(
                AttributeSchema::new("subdomain", AttributeType::String)
                    .with_description("The name of the record."),
            )
            .attribute(
                AttributeSchema::new("target", AttributeType::String)
                    .required()
                    .with_description("The value of the record."),
            )
            .attribute(AttributeSchema::new("ttl", AttributeType::Int))
    }

    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.create_record(client, desired))
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_record(client, state))
    }

    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.update_record(client, state, desired))
    }

    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(self.delete_record(client, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_core_fields() {
        let schema = ZoneRecord.schema();
        let errors = schema.validate(&Attributes::new()).unwrap_err();
        let missing: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                ovh_core::schema::SchemaError::MissingRequired { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert!(missing.contains(&"zone"));
        assert!(missing.contains(&"fieldtype"));
        assert!(missing.contains(&"target"));
    }

    #[test]
    fn payload_uses_api_field_names() {
        let desired = Attributes::new()
            .with("zone", "example.net")
            .with("fieldtype", "A")
            .with("subdomain", "www")
            .with("target", "192.0.2.1")
            .with("ttl", 3600i64);

        let payload = RecordPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["fieldType"], "A");
        assert_eq!(json["subDomain"], "www");
        assert_eq!(json["target"], "192.0.2.1");
        assert_eq!(json["ttl"], 3600);
    }

    #[test]
    fn payload_omits_optional_fields() {
        let desired = Attributes::new()
            .with("zone", "example.net")
            .with("fieldtype", "TXT")
            .with("target", "\"v=spf1\"");

        let payload = RecordPayload::from_attributes(&desired).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("subDomain").is_none());
        assert!(json.get("ttl").is_none());
    }

    #[test]
    fn record_state_includes_identifier() {
        let record = Record {
            id: 42,
            zone: "example.net".to_string(),
            field_type: "A".to_string(),
            sub_domain: Some("www".to_string()),
            target: "192.0.2.1".to_string(),
            ttl: None,
        };

        let state = ZoneRecord::state_from(record);
        assert!(state.exists);
        assert_eq!(state.id.as_deref(), Some("42"));
        assert_eq!(state.attributes.get_string("subdomain"), Some("www"));
        assert!(!state.attributes.contains("ttl"));
    }
}
