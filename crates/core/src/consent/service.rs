//! OAuth consent service facade
//!
//! Wraps the two `Microsoft.Web/connections` consent actions and opens login
//! popups. Both actions POST side effects against the connection resource,
//! so nothing here retries; callers own any retry policy.

use std::sync::Arc;

use consentflow_domain::constants::{
    API_VERSION_QUERY_PARAM, CONFIRM_CONSENT_CODE_ACTION, CONNECTIONS_PROVIDER,
    LIST_CONSENT_LINKS_ACTION,
};
use consentflow_domain::{
    ConfirmConsentCodeRequest, ConsentError, ConsentLinkRequest, ConsentLinkResponse,
    OAuthPopupOptions, OAuthServiceOptions, PopupId, PopupSettings, Result,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::ports::{HttpPost, PostRequest, TokenSource};
use crate::popup::ports::PopupHost;
use crate::popup::OAuthPopup;
use crate::redirect::RedirectResolver;
use crate::token::{JwtTokenHelper, TokenClaims};

/// Consent operations for managed API connections
pub struct OAuthService {
    options: OAuthServiceOptions,
    http: Arc<dyn HttpPost>,
    tokens: Arc<dyn TokenSource>,
    resolver: RedirectResolver,
    popup_host: Arc<dyn PopupHost>,
    popup_settings: PopupSettings,
}

impl OAuthService {
    /// Create a new consent service
    pub fn new(
        options: OAuthServiceOptions,
        http: Arc<dyn HttpPost>,
        tokens: Arc<dyn TokenSource>,
        resolver: RedirectResolver,
        popup_host: Arc<dyn PopupHost>,
    ) -> Self {
        Self {
            options,
            http,
            tokens,
            resolver,
            popup_host,
            popup_settings: PopupSettings::default(),
        }
    }

    /// Override popup geometry and polling policy.
    #[must_use]
    pub fn with_popup_settings(mut self, settings: PopupSettings) -> Self {
        self.popup_settings = settings;
        self
    }

    #[must_use]
    pub const fn resolver(&self) -> &RedirectResolver {
        &self.resolver
    }

    /// Open a login popup for `options` and start its handshake.
    pub fn open_login_popup(&self, options: OAuthPopupOptions) -> OAuthPopup {
        OAuthPopup::new(options, self.popup_host.clone(), self.popup_settings)
    }

    /// Fetch the consent link for a connection.
    ///
    /// # Errors
    /// - `Unauthenticated` if no bearer token is available (no request is sent)
    /// - `InvalidToken` if the token payload cannot be decoded
    /// - `ConsentUrlUnavailable` if the response holds no link
    /// - transport and remote errors from the HTTP client, unchanged
    pub async fn fetch_consent_url_for_connection(&self, connection_name: &str) -> Result<String> {
        let claims = self.identity_claims()?;
        let body = ConsentLinkRequest::for_token_parameter(
            self.resolver.redirect_uri(&PopupId::fixed()),
            claims.object_id,
            claims.tenant_id,
        );
        let uri = self.action_uri(connection_name, LIST_CONSENT_LINKS_ACTION);

        debug!(connection = connection_name, "requesting consent links");
        let response = self.post(uri, &body).await.map_err(|err| {
            error!(connection = connection_name, error = %err, "failed to fetch consent URL");
            err
        })?;

        let links: ConsentLinkResponse = serde_json::from_value(response).map_err(|err| {
            warn!(connection = connection_name, error = %err, "unexpected consent link response");
            ConsentError::ConsentUrlUnavailable
        })?;

        match links.first_link() {
            Some(link) => {
                info!(connection = connection_name, "consent URL fetched");
                Ok(link.to_string())
            }
            None => {
                warn!(connection = connection_name, "consent link response was empty");
                Err(ConsentError::ConsentUrlUnavailable)
            }
        }
    }

    /// Exchange a consent code for a confirmed connection.
    ///
    /// Returns the raw ARM response.
    ///
    /// # Errors
    /// - `Unauthenticated` if no bearer token is available (no request is sent)
    /// - `InvalidToken` if the token lacks the object or tenant id claim
    /// - transport and remote errors from the HTTP client, unchanged
    pub async fn confirm_consent_code_for_connection(
        &self,
        connection_name: &str,
        code: &str,
    ) -> Result<Value> {
        let claims = self.identity_claims()?;
        let (object_id, tenant_id) = claims.require()?;
        let body = ConfirmConsentCodeRequest {
            code: code.to_string(),
            object_id: object_id.to_string(),
            tenant_id: tenant_id.to_string(),
        };
        let uri = self.action_uri(connection_name, CONFIRM_CONSENT_CODE_ACTION);

        debug!(connection = connection_name, "confirming consent code");
        let response = self.post(uri, &body).await?;
        info!(connection = connection_name, "consent code confirmed");
        Ok(response)
    }

    fn identity_claims(&self) -> Result<TokenClaims> {
        let token = self
            .tokens
            .bearer_token()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConsentError::Unauthenticated)?;
        JwtTokenHelper::claims(&token)
    }

    /// ARM host: the base URL up to its first `/subscriptions` segment.
    fn host_name(&self) -> &str {
        let base = self.options.base_url.split("/subscriptions").next().unwrap_or_default();
        base.trim_end_matches('/')
    }

    fn connection_request_path(&self, connection_name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.options.subscription_id,
            self.options.resource_group,
            CONNECTIONS_PROVIDER,
            connection_name
        )
    }

    fn action_uri(&self, connection_name: &str, action: &str) -> String {
        format!("{}{}/{}", self.host_name(), self.connection_request_path(connection_name), action)
    }

    async fn post<T: Serialize + Sync>(&self, uri: String, body: &T) -> Result<Value> {
        let content = serde_json::to_value(body)
            .map_err(|err| ConsentError::Internal(format!("failed to encode request: {err}")))?;

        self.http
            .post(PostRequest {
                uri,
                content,
                query_parameters: vec![(
                    API_VERSION_QUERY_PARAM.to_string(),
                    self.options.api_version.clone(),
                )],
            })
            .await
    }
}
