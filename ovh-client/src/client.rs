//! Signed HTTP client for the OVH API
//!
//! Every authenticated request carries the application key, a timestamp
//! corrected for server clock drift, and a SHA-1 signature over the
//! credentials, method, URL, and body.

use chrono::Utc;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::{ClientConfig, endpoint_url};
use crate::error::{ClientError, ClientResult, ConfigError};

/// Characters escaped when interpolating a value into a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'+');

/// Escape a value for use as a single URL path segment
pub fn path_escape(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Shape of OVH API error bodies
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for one OVH API session
///
/// Holds the resolved credentials and the gateway base URL. Cheap to share
/// behind a reference; all methods take `&self`.
pub struct OvhClient {
    http: reqwest::Client,
    endpoint: String,
    base_url: &'static str,
    application_key: String,
    application_secret: String,
    consumer_key: String,
    /// Server time minus local time, fetched once from `/auth/time`
    time_delta: OnceCell<i64>,
}

impl std::fmt::Debug for OvhClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvhClient")
            .field("endpoint", &self.endpoint)
            .field("application_key", &self.application_key)
            .finish_non_exhaustive()
    }
}

impl OvhClient {
    /// Build a client from a resolved configuration
    ///
    /// Validates the configuration first; an unknown endpoint or empty
    /// credential field is rejected here rather than on first request.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = endpoint_url(&config.endpoint)
            .ok_or_else(|| ConfigError::UnknownEndpoint(config.endpoint.clone()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint,
            base_url,
            application_key: config.application_key,
            application_secret: config.application_secret,
            consumer_key: config.consumer_key,
            time_delta: OnceCell::new(),
        })
    }

    /// Endpoint identifier this client targets
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform a GET request against an API path
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(Method::GET, path, None).await
    }

    /// Perform a POST request with a JSON body
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_string(body).map_err(ClientError::Encode)?;
        self.request(Method::POST, path, Some(body)).await
    }

    /// Perform a POST request without a body
    ///
    /// Task-style endpoints (zone refresh, vrack attachments) take no
    /// payload; the signature is computed over an empty body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(Method::POST, path, None).await
    }

    /// Perform a PUT request with a JSON body
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_string(body).map_err(ClientError::Encode)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    /// Perform a DELETE request against an API path
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(Method::DELETE, path, None).await
    }

    /// Offset to apply to local timestamps, fetched lazily from the gateway
    async fn time_delta(&self) -> ClientResult<i64> {
        self.time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.base_url);
                let server: i64 = self
                    .http
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Ok::<_, ClientError>(server - Utc::now().timestamp())
            })
            .await
            .copied()
    }

    /// Compute the request signature for the given parameters
    fn sign(&self, method: &str, url: &str, body: &str, timestamp: i64) -> String {
        let payload = format!(
            "{}+{}+{}+{}+{}+{}",
            self.application_secret, self.consumer_key, method, url, body, timestamp
        );
        let mut hasher = Sha1::new();
        hasher.update(payload.as_bytes());
        format!("$1${}", hex::encode(hasher.finalize()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = body.unwrap_or_default();
        let timestamp = Utc::now().timestamp() + self.time_delta().await?;
        let signature = self.sign(method.as_str(), &url, &body, timestamp);

        debug!(method = %method, url = %url, "sending OVH API request");

        let mut request = self
            .http
            .request(method, &url)
            .header("X-Ovh-Application", &self.application_key)
            .header("X-Ovh-Consumer", &self.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature);
        if !body.is_empty() {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(ClientError::Api {
                status: status.as_u16(),
                url,
                message,
            });
        }

        // DELETE and task endpoints answer with a bare `null`
        let text = if text.is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| ClientError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> OvhClient {
        OvhClient::new(ClientConfig {
            endpoint: "ovh-eu".to_string(),
            application_key: "ak".to_string(),
            application_secret: "as".to_string(),
            consumer_key: "ck".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn signature_shape() {
        let client = test_client();
        let sig = client.sign("GET", "https://eu.api.ovh.com/1.0/me", "", 1457018875);
        assert!(sig.starts_with("$1$"));
        // "$1$" prefix plus 40 hex characters of SHA-1 digest
        assert_eq!(sig.len(), 43);
        assert!(sig[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_deterministic() {
        let client = test_client();
        let a = client.sign("GET", "https://eu.api.ovh.com/1.0/me", "", 1457018875);
        let b = client.sign("GET", "https://eu.api.ovh.com/1.0/me", "", 1457018875);
        assert_eq!(a, b);
    }

    #[test]
    fn signature_depends_on_every_input() {
        let client = test_client();
        let base = client.sign("GET", "https://eu.api.ovh.com/1.0/me", "", 1457018875);
        assert_ne!(
            base,
            client.sign("POST", "https://eu.api.ovh.com/1.0/me", "", 1457018875)
        );
        assert_ne!(
            base,
            client.sign("GET", "https://eu.api.ovh.com/1.0/domain", "", 1457018875)
        );
        assert_ne!(
            base,
            client.sign("GET", "https://eu.api.ovh.com/1.0/me", "{}", 1457018875)
        );
        assert_ne!(
            base,
            client.sign("GET", "https://eu.api.ovh.com/1.0/me", "", 1457018876)
        );
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = OvhClient::new(ClientConfig::new("ovh-eu"));
        assert!(result.is_err());
    }

    #[test]
    fn path_escape_reserved_characters() {
        assert_eq!(path_escape("192.0.2.0/24"), "192.0.2.0%2F24");
        assert_eq!(path_escape("plain"), "plain");
        assert_eq!(path_escape("a b"), "a%20b");
    }
}
