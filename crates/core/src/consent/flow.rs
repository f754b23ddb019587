//! End-to-end consent flow for one connection
//!
//! fetch consent link → popup handshake → confirm consent code.

use std::sync::Arc;

use consentflow_domain::{ConsentError, Result};
use serde_json::Value;
use tracing::{info, warn};

use super::service::OAuthService;

/// Runs the consent handshake for connections
pub struct ConsentFlow {
    service: Arc<OAuthService>,
}

impl ConsentFlow {
    /// Create a flow over a configured consent service.
    pub fn new(service: Arc<OAuthService>) -> Self {
        Self { service }
    }

    /// Obtain consent for `connection_name` and return the confirm response.
    ///
    /// Each call opens its own popup with a fresh popup id.
    ///
    /// # Errors
    /// Propagates the first failing step's error; nothing is retried.
    pub async fn run(&self, connection_name: &str) -> Result<Value> {
        let consent_url = self.service.fetch_consent_url_for_connection(connection_name).await?;

        let options = self.service.resolver().popup_options(consent_url);
        let popup = self.service.open_login_popup(options);
        info!(
            connection = connection_name,
            popup_id = %popup.popup_id(),
            "starting consent handshake"
        );

        let login = match popup.login().await {
            Ok(login) => login,
            Err(err) => {
                warn!(
                    connection = connection_name,
                    error = err.error_label(),
                    "consent handshake did not complete"
                );
                return Err(err);
            }
        };
        let code = login
            .code
            .ok_or_else(|| ConsentError::MalformedMessage("login result carries no code".into()))?;

        self.service.confirm_consent_code_for_connection(connection_name, &code).await
    }
}
