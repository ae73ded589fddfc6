//! Contract types for the OVH provider
//!
//! Attribute values and schemas, the resource/data-source handler traits,
//! and the registry that maps public names to handler constructors.

pub mod handler;
pub mod registry;
pub mod schema;
pub mod value;
