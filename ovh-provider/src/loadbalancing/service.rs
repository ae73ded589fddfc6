//! Load balancer service data source
//!
//! Looks a service up by its internal name, or scans all services and
//! filters on the supplied attributes. Exactly one service must match.

use serde::Deserialize;

use ovh_client::{OvhClient, path_escape};
use ovh_core::handler::{BoxFuture, DataSourceHandler, HandlerError, HandlerResult, RemoteState};
use ovh_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use ovh_core::value::{Attributes, Value};

const DATA_SOURCE: &str = "ovh_iploadbalancing";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancer {
    service_name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    ip_loadbalancing: Option<String>,
    #[serde(default)]
    ipv4: Option<String>,
    #[serde(default)]
    ipv6: Option<String>,
    #[serde(default)]
    offer: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    zone: Vec<String>,
    #[serde(default)]
    ssl_configuration: Option<String>,
}

pub struct IpLoadBalancing;

pub fn handler() -> Box<dyn DataSourceHandler> {
    Box::new(IpLoadBalancing)
}

impl IpLoadBalancing {
    fn matches(config: &Attributes, lb: &LoadBalancer) -> bool {
        let filters: [(&str, Option<&str>); 6] = [
            ("display_name", lb.display_name.as_deref()),
            ("ip_loadbalancing", lb.ip_loadbalancing.as_deref()),
            ("ipv4", lb.ipv4.as_deref()),
            ("ipv6", lb.ipv6.as_deref()),
            ("offer", lb.offer.as_deref()),
            ("state", lb.state.as_deref()),
        ];
        filters.iter().all(|(name, actual)| {
            match config.get_string(name) {
                Some(wanted) => *actual == Some(wanted),
                None => true,
            }
        })
    }

    fn state_from(lb: LoadBalancer) -> RemoteState {
        let mut attrs = Attributes::new().with("service_name", lb.service_name.clone());
        if let Some(display_name) = lb.display_name {
            attrs.insert("display_name", display_name);
        }
        if let Some(ip) = lb.ip_loadbalancing {
            attrs.insert("ip_loadbalancing", ip);
        }
        if let Some(ipv4) = lb.ipv4 {
            attrs.insert("ipv4", ipv4);
        }
        if let Some(ipv6) = lb.ipv6 {
            attrs.insert("ipv6", ipv6);
        }
        if let Some(offer) = lb.offer {
            attrs.insert("offer", offer);
        }
        if let Some(state) = lb.state {
            attrs.insert("state", state);
        }
        attrs.insert(
            "zone",
            Value::List(lb.zone.into_iter().map(Value::String).collect()),
        );
        if let Some(ssl) = lb.ssl_configuration {
            attrs.insert("ssl_configuration", ssl);
        }
        RemoteState::existing(attrs).with_id(lb.service_name)
    }

    async fn read_service(
        &self,
        client: &OvhClient,
        config: &Attributes,
    ) -> HandlerResult<RemoteState> {
        if let Some(service_name) = config.get_string("service_name") {
            let lb: LoadBalancer = client
                .get(&format!("/ipLoadbalancing/{}", path_escape(service_name)))
                .await
                .map_err(|e| HandlerError::from(e).for_resource(DATA_SOURCE))?;
            return Ok(Self::state_from(lb));
        }

        let names: Vec<String> = client
            .get("/ipLoadbalancing")
            .await
            .map_err(|e| HandlerError::from(e).for_resource(DATA_SOURCE))?;

        let mut matches = Vec::new();
        for name in names {
            let lb: LoadBalancer = client
                .get(&format!("/ipLoadbalancing/{}", path_escape(&name)))
                .await
                .map_err(|e| HandlerError::from(e).for_resource(DATA_SOURCE))?;
            if Self::matches(config, &lb) {
                matches.push(lb);
            }
        }

        match matches.len() {
            0 => Err(HandlerError::new("No load balancer matches the given attributes")
                .for_resource(DATA_SOURCE)),
            1 => Ok(Self::state_from(matches.remove(0))),
            n => Err(HandlerError::new(format!(
                "{} load balancers match the given attributes, narrow the filters",
                n
            ))
            .for_resource(DATA_SOURCE)),
        }
    }
}

impl DataSourceHandler for IpLoadBalancing {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new()
            .attribute(
                AttributeSchema::new("service_name", AttributeType::String)
                    .with_description("The internal name of the load balancer."),
            )
            .attribute(AttributeSchema::new("display_name", AttributeType::String))
            .attribute(AttributeSchema::new("ip_loadbalancing", AttributeType::String))
            .attribute(AttributeSchema::new("ipv4", AttributeType::String))
            .attribute(AttributeSchema::new("ipv6", AttributeType::String))
            .attribute(AttributeSchema::new("offer", AttributeType::String))
            .attribute(AttributeSchema::new("state", AttributeType::String))
            .attribute(
                AttributeSchema::new("zone", AttributeType::List(Box::new(AttributeType::String)))
                    .computed(),
            )
            .attribute(AttributeSchema::new("ssl_configuration", AttributeType::String).computed())
    }

    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
        Box::pin(self.read_service(client, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoadBalancer {
        LoadBalancer {
            service_name: "loadbalancer-1".to_string(),
            display_name: Some("front".to_string()),
            ip_loadbalancing: Some("203.0.113.10".to_string()),
            ipv4: Some("203.0.113.10".to_string()),
            ipv6: None,
            offer: Some("advanced".to_string()),
            state: Some("ok".to_string()),
            zone: vec!["gra".to_string(), "rbx".to_string()],
            ssl_configuration: None,
        }
    }

    #[test]
    fn empty_filters_match_everything() {
        assert!(IpLoadBalancing::matches(&Attributes::new(), &sample()));
    }

    #[test]
    fn filter_on_state_and_offer() {
        let config = Attributes::new().with("state", "ok").with("offer", "advanced");
        assert!(IpLoadBalancing::matches(&config, &sample()));

        let config = Attributes::new().with("state", "suspended");
        assert!(!IpLoadBalancing::matches(&config, &sample()));
    }

    #[test]
    fn state_exposes_zones() {
        let state = IpLoadBalancing::state_from(sample());
        assert_eq!(state.id.as_deref(), Some("loadbalancer-1"));
        assert_eq!(
            state.attributes.get_string_list("zone"),
            Some(vec!["gra", "rbx"])
        );
    }
}
