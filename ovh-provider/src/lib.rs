//! OVH provider
//!
//! Declares the provider configuration schema, resolves credentials into an
//! API session, and wires every resource and data source into the registry
//! consulted by the host orchestrator.
//!
//! ## Module Structure
//!
//! - `provider` - Configuration schema, configure entry point, registry table
//! - `cloud` - Public cloud resources and data sources
//! - `domain` - DNS zone resources and data source
//! - `ip` - Reverse DNS resource
//! - `loadbalancing` - IP load balancing resources and data source
//! - `me` - Account payment mean data sources
//! - `vrack` - vRack attachment resource

pub mod cloud;
pub mod domain;
pub mod ip;
pub mod loadbalancing;
pub mod me;
pub mod provider;
pub mod vrack;

pub use provider::{configure, configure_with_home, provider_schema, registry};
