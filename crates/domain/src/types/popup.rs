//! Values describing one popup consent handshake

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PopupSettings;
use crate::constants::POPUP_ID;

/// Name used to address the consent popup window
///
/// [`PopupId::fixed`] is the legacy process-wide name; hosts that open two
/// popups with the same name reuse one window. [`PopupId::unique`] allocates
/// a per-attempt name so concurrent handshakes cannot interfere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopupId(String);

impl PopupId {
    /// The legacy `msla-logicapps-oauthpopup` name.
    #[must_use]
    pub fn fixed() -> Self {
        Self(POPUP_ID.to_string())
    }

    /// A fresh `msla-logicapps-oauthpopup-<uuid>` name.
    #[must_use]
    pub fn unique() -> Self {
        Self(format!("{POPUP_ID}-{}", Uuid::new_v4()))
    }

    /// The window name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PopupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs of a popup handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthPopupOptions {
    /// Consent link as returned by `listConsentLinks`.
    pub consent_url: String,
    /// Redirect URI appended to the consent URL; its origin gates messages.
    pub redirect_url: String,
    pub popup_id: PopupId,
}

/// Outcome of a successful handshake
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A cross-window message received by the hosting window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMessage {
    /// ASCII-serialised origin of the sender, e.g. `https://localhost:4200`.
    pub origin: String,
    pub data: String,
}

impl WindowMessage {
    #[must_use]
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self { origin: origin.into(), data: data.into() }
    }
}

/// Available screen area reported by a popup host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Window features requested for the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupFeatures {
    pub width: u32,
    pub height: u32,
}

impl PopupFeatures {
    /// Feature string in `window.open` syntax.
    #[must_use]
    pub fn to_feature_string(&self) -> String {
        format!(
            "scrollbars=1, resizable=1, width={}, height={}, popup=1",
            self.width, self.height
        )
    }

    /// Offset that moves a popup opened at the origin to the screen center.
    #[must_use]
    pub fn centering_offset(&self, screen: ScreenSize) -> (i32, i32) {
        let half = |outer: u32, inner: u32| (i64::from(outer) / 2 - i64::from(inner) / 2) as i32;
        (half(screen.width, self.width), half(screen.height, self.height))
    }
}

impl From<&PopupSettings> for PopupFeatures {
    fn from(settings: &PopupSettings) -> Self {
        Self { width: settings.width, height: settings.height }
    }
}
