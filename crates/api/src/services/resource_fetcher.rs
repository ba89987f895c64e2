//! Authenticated fetches of named resource collections.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use domain::models::{Resource, UserId};

/// Query parameter carrying the identity hint.
pub const USER_ID_PARAM: &str = "userId";

/// Errors that can occur while fetching a collection.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("Invalid collection payload: {0}")]
    Decode(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),
}

/// Credentials attached to every fetch in one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Primary credential, sent as a bearer token.
    pub token: Option<String>,
    /// Secondary identity hint, resolved by the server if the token is stripped.
    pub user_id: Option<UserId>,
}

impl Credentials {
    pub fn new(token: Option<String>, user_id: Option<UserId>) -> Self {
        Self { token, user_id }
    }
}

/// One request per named collection.
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_collection(
        &self,
        resource: Resource,
        credentials: &Credentials,
    ) -> Result<Vec<Value>, FetchError>;
}

/// Fetches collections from `{base_url}/api/{resource}` over HTTP.
pub struct HttpResourceFetcher {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpResourceFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn collection_url(&self, resource: Resource) -> String {
        format!("{}/api/{}", self.base_url, resource.path())
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch_collection(
        &self,
        resource: Resource,
        credentials: &Credentials,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.collection_url(resource);
        debug!(resource = %resource, url = %url, "Fetching collection");

        let mut request = self.client.get(&url);
        if let Some(token) = &credentials.token {
            request = request.bearer_auth(token);
        }
        if let Some(user_id) = credentials.user_id {
            request = request.query(&[(USER_ID_PARAM, user_id)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_ms)
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_ms)
            } else {
                FetchError::Http(e)
            }
        })?;
        decode_collection(&body)
    }
}

/// Decodes a collection body, which must be a JSON array.
pub fn decode_collection(body: &str) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(FetchError::Decode(format!(
            "expected an array, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(FetchError::Decode(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
