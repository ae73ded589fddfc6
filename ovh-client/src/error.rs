//! Client and configuration error types

use thiserror::Error;

/// Errors that can occur while resolving the client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The endpoint does not name a known OVH API gateway
    #[error("Unknown OVH endpoint '{0}'")]
    UnknownEndpoint(String),

    /// A field required for authenticated API calls is empty
    #[error("Missing required configuration field '{0}'")]
    MissingField(&'static str),

    /// The credentials file exists but could not be read
    #[error("Failed to read credentials file {path}: {message}")]
    CredentialsUnreadable { path: String, message: String },

    /// The credentials file exists but is not valid INI
    #[error("Failed to parse credentials file {path}: {message}")]
    CredentialsParse { path: String, message: String },

    /// The credentials file exists but has no section for the endpoint
    #[error("Credentials file {path} has no section for endpoint '{endpoint}'")]
    MissingSection { path: String, endpoint: String },
}

/// Result type for configuration resolution
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur when talking to the OVH API
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration was invalid when building the client
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport-level failure (connection, TLS, timeout)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("OVH API error ({status}) on {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// The request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(serde_json::Error),

    /// The response body could not be deserialized
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Result type for API calls
pub type ClientResult<T> = Result<T, ClientError>;
