//! Redirect URI resolution
//!
//! The identity provider sends the consent popup back to
//! `<origin>/oauthredirect.html?pid=<popup id>`. The same origin gates which
//! window messages the popup controller accepts.

use consentflow_domain::constants::{
    DEFAULT_REDIRECT_ORIGIN, POPUP_ID_QUERY_PARAM, REDIRECT_PAGE_PATH,
};
use consentflow_domain::{ConsentError, OAuthPopupOptions, PopupId, Result};
use url::Url;

/// Computes redirect URIs for one redirect origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResolver {
    origin: String,
}

impl RedirectResolver {
    /// Create a resolver for the given origin.
    ///
    /// Any path or query on `origin` is discarded.
    ///
    /// # Errors
    /// Returns `ConsentError::Config` if `origin` is not an absolute
    /// `http`/`https` URL with a host.
    pub fn new(origin: &str) -> Result<Self> {
        let url = Url::parse(origin)
            .map_err(|err| ConsentError::Config(format!("invalid redirect origin: {err}")))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConsentError::Config(format!(
                "redirect origin must be an http(s) URL with a host: {origin}"
            )));
        }

        Ok(Self { origin: url.origin().ascii_serialization() })
    }

    /// Redirect URI for the popup addressed by `popup_id`.
    #[must_use]
    pub fn redirect_uri(&self, popup_id: &PopupId) -> String {
        format!(
            "{}{}?{}={}",
            self.origin,
            REDIRECT_PAGE_PATH,
            POPUP_ID_QUERY_PARAM,
            urlencoding::encode(popup_id.as_str())
        )
    }

    /// Serialised origin, e.g. `https://localhost:4200`.
    #[must_use]
    pub fn redirect_origin(&self) -> &str {
        &self.origin
    }

    /// Popup options for a new handshake attempt with its own popup id.
    #[must_use]
    pub fn popup_options(&self, consent_url: impl Into<String>) -> OAuthPopupOptions {
        let popup_id = PopupId::unique();
        OAuthPopupOptions {
            consent_url: consent_url.into(),
            redirect_url: self.redirect_uri(&popup_id),
            popup_id,
        }
    }
}

impl Default for RedirectResolver {
    fn default() -> Self {
        Self { origin: DEFAULT_REDIRECT_ORIGIN.to_string() }
    }
}

/// Origin of an absolute URL, serialised the way browsers report it.
pub(crate) fn origin_of(url: &str) -> Result<String> {
    Url::parse(url)
        .map(|parsed| parsed.origin().ascii_serialization())
        .map_err(|err| ConsentError::Config(format!("invalid redirect URL {url}: {err}")))
}
