//! ARM adapter for the consent service's `HttpPost` port
//!
//! Sends JSON POSTs with the session's bearer token and decodes the body
//! into a `serde_json::Value`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use consentflow_core::{HttpPost, PostRequest, TokenSource};
use consentflow_domain::{ConsentError, HttpConfig, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::http::HttpClient;

const BEARER_PREFIX: &str = "Bearer ";

/// Reqwest-backed ARM client
pub struct ArmClient {
    http: HttpClient,
    tokens: Arc<dyn TokenSource>,
}

impl ArmClient {
    /// Build a client from HTTP settings and a token source.
    ///
    /// # Errors
    /// Returns `ConsentError::Config` if the underlying client cannot be built.
    pub fn new(config: &HttpConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("consentflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, tokens })
    }

    fn authorization_header(&self) -> Option<String> {
        self.tokens.bearer_token().map(|token| {
            if token.starts_with(BEARER_PREFIX) {
                token
            } else {
                format!("{BEARER_PREFIX}{token}")
            }
        })
    }
}

#[async_trait]
impl HttpPost for ArmClient {
    #[instrument(skip(self, request), fields(uri = %request.uri))]
    async fn post(&self, request: PostRequest) -> Result<Value> {
        let mut builder = self
            .http
            .request(Method::POST, &request.uri)
            .query(&request.query_parameters)
            .header(CONTENT_TYPE, "application/json")
            .json(&request.content);

        if let Some(header) = self.authorization_header() {
            builder = builder.header(AUTHORIZATION, header);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ConsentError::Network(format!("failed to read ARM response: {err}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "ARM request rejected");
            return Err(ConsentError::Remote { status: status.as_u16(), body });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "ARM request succeeded");
        Ok(decode_body(body))
    }
}

fn decode_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::StaticTokenSource;

    fn client(token: Option<&str>) -> ArmClient {
        let tokens: Arc<dyn TokenSource> = Arc::new(match token {
            Some(token) => StaticTokenSource::new(token),
            None => StaticTokenSource::empty(),
        });
        ArmClient::new(&HttpConfig::default(), tokens).expect("arm client")
    }

    fn request(server: &MockServer, content: Value) -> PostRequest {
        PostRequest {
            uri: format!("{}/connections/c1/listConsentLinks", server.uri()),
            content,
            query_parameters: vec![("api-version".into(), "2018-07-01-preview".into())],
        }
    }

    #[tokio::test]
    async fn posts_json_with_bearer_and_api_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connections/c1/listConsentLinks"))
            .and(query_param("api-version", "2018-07-01-preview"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(json!({"parameters": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client(Some("abc")).post(request(&server, json!({"parameters": []}))).await;

        assert_eq!(value.unwrap(), json!({"value": []}));
    }

    #[tokio::test]
    async fn keeps_existing_bearer_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let value = client(Some("Bearer abc")).post(request(&server, json!({}))).await;

        assert_eq!(value.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let value = client(None).post(request(&server, json!({}))).await.unwrap();
        assert_eq!(value, Value::String("ok".into()));

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn non_success_maps_to_remote_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(Some("abc")).post(request(&server, json!({}))).await.unwrap_err();

        assert_eq!(err, ConsentError::Remote { status: 503, body: "unavailable".into() });
    }
}
