//! IP load balancing resources and data source

pub mod farm;
pub mod farm_server;
pub mod frontend;
pub mod http_route;
pub mod http_route_rule;
pub mod refresh;
pub mod service;
