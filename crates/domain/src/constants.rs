//! Domain constants
//!
//! Values shared by the redirect resolver, the popup controller and the
//! consent service.

/// Base name of the consent popup window.
pub const POPUP_ID: &str = "msla-logicapps-oauthpopup";

/// Path of the redirect page the identity provider sends the popup back to.
pub const REDIRECT_PAGE_PATH: &str = "/oauthredirect.html";

/// Query parameter carrying the popup correlation id on the redirect URI.
pub const POPUP_ID_QUERY_PARAM: &str = "pid";

/// Query parameter the popup controller sets on the consent URL.
pub const REDIRECT_URI_QUERY_PARAM: &str = "redirect_uri";

/// Default origin of the redirect page (designer standalone host).
pub const DEFAULT_REDIRECT_ORIGIN: &str = "https://localhost:4200";

// Popup geometry and polling
pub const DEFAULT_POPUP_WIDTH: u32 = 600;
pub const DEFAULT_POPUP_HEIGHT: u32 = 600;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_TICKS: u32 = 300;

// Consent link request
pub const CONSENT_PARAMETER_NAME: &str = "token";

// ARM
pub const DEFAULT_API_VERSION: &str = "2018-07-01-preview";
pub const DEFAULT_ARM_BASE_URL: &str = "https://management.azure.com";
pub const API_VERSION_QUERY_PARAM: &str = "api-version";
pub const CONNECTIONS_PROVIDER: &str = "Microsoft.Web/connections";
pub const LIST_CONSENT_LINKS_ACTION: &str = "listConsentLinks";
pub const CONFIRM_CONSENT_CODE_ACTION: &str = "confirmConsentCode";

// Environment
pub const ARM_TOKEN_ENV: &str = "CONSENTFLOW_ARM_TOKEN";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";
