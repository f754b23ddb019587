//! Configuration structures
//!
//! Every section has serde defaults so partial TOML/JSON files load. Values
//! that identify the ARM scope (subscription, resource group) have no usable
//! default and are checked by [`ConsentConfig::validate`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_ARM_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_TICKS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POPUP_HEIGHT, DEFAULT_POPUP_WIDTH,
    DEFAULT_REDIRECT_ORIGIN,
};
use crate::errors::{ConsentError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    pub service: OAuthServiceOptions,
    pub redirect: RedirectConfig,
    pub popup: PopupSettings,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl ConsentConfig {
    /// Check the values that have no sensible default.
    ///
    /// # Errors
    /// Returns `ConsentError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.service.subscription_id.trim().is_empty() {
            return Err(ConsentError::Config("service.subscription_id is required".into()));
        }
        if self.service.resource_group.trim().is_empty() {
            return Err(ConsentError::Config("service.resource_group is required".into()));
        }
        if self.service.api_version.trim().is_empty() {
            return Err(ConsentError::Config("service.api_version is required".into()));
        }
        if self.popup.max_ticks == 0 {
            return Err(ConsentError::Config("popup.max_ticks must be at least 1".into()));
        }
        if self.popup.poll_interval_ms == 0 {
            return Err(ConsentError::Config("popup.poll_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

/// ARM scope of the connections the consent service talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthServiceOptions {
    pub api_version: String,
    /// ARM base URL. Anything from `/subscriptions` onward is ignored.
    pub base_url: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
}

impl Default for OAuthServiceOptions {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: DEFAULT_ARM_BASE_URL.to_string(),
            subscription_id: String::new(),
            resource_group: String::new(),
            location: String::new(),
        }
    }
}

/// Where the identity provider sends the popup back to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub origin: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self { origin: DEFAULT_REDIRECT_ORIGIN.to_string() }
    }
}

/// Popup geometry and closure polling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupSettings {
    pub width: u32,
    pub height: u32,
    pub poll_interval_ms: u64,
    /// Ticks without closure before the handshake times out.
    pub max_ticks: u32,
}

impl PopupSettings {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Total time the handshake waits before timing out.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.saturating_mul(self.max_ticks as u64))
    }
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_POPUP_WIDTH,
            height: DEFAULT_POPUP_HEIGHT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
