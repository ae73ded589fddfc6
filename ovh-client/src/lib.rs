//! OVH REST API client
//!
//! A small client for the OVH API gateways: endpoint selection, request
//! signing, server clock drift correction, and credential resolution from
//! environment, dotfile, and explicit configuration.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;

pub use client::{OvhClient, path_escape};
pub use config::{ClientConfig, endpoint_url, known_endpoints};
pub use credentials::{CredentialOverrides, CredentialSection, home_dir, resolve};
pub use error::{ClientError, ClientResult, ConfigError, ConfigResult};
