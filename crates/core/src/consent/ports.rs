//! Port interfaces for the consent service
//!
//! These traits define the boundaries between the consent logic and the
//! HTTP stack / session state that supply it.

use async_trait::async_trait;
use consentflow_domain::Result;
use serde_json::Value;

/// A JSON POST against an absolute URI
#[derive(Debug, Clone, PartialEq)]
pub struct PostRequest {
    pub uri: String,
    pub content: Value,
    pub query_parameters: Vec<(String, String)>,
}

/// HTTP client capable of JSON POSTs
#[async_trait]
pub trait HttpPost: Send + Sync {
    /// Send the request and return the decoded JSON body.
    ///
    /// Implementations map non-success statuses to `ConsentError::Remote`
    /// and transport failures to `ConsentError::Network`. An empty body
    /// decodes to `Value::Null`.
    async fn post(&self, request: PostRequest) -> Result<Value>;
}

/// Source of the current ARM bearer token
pub trait TokenSource: Send + Sync {
    /// The raw token, or `None` when no session is signed in.
    fn bearer_token(&self) -> Option<String>;
}
