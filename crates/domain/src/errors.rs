//! Error types used throughout the consent handshake

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for consentflow
///
/// Display strings for the handshake outcomes match the messages the designer
/// surfaces to users ("The browser is closed", "Timeout").
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ConsentError {
    #[error("The browser has blocked the popup window.")]
    PopupBlocked,

    #[error("The browser is closed")]
    BrowserClosed,

    #[error("Timeout")]
    Timeout,

    #[error("No ARM token found")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Error fetching consent URL")]
    ConsentUrlUnavailable,

    #[error("Malformed consent message: {0}")]
    MalformedMessage(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsentError {
    /// Stable label suitable for structured log fields.
    #[must_use]
    pub const fn error_label(&self) -> &'static str {
        match self {
            Self::PopupBlocked => "popup_blocked",
            Self::BrowserClosed => "browser_closed",
            Self::Timeout => "timeout",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidToken(_) => "invalid_token",
            Self::ConsentUrlUnavailable => "consent_url_unavailable",
            Self::MalformedMessage(_) => "malformed_message",
            Self::Provider(_) => "provider",
            Self::Network(_) => "network",
            Self::Remote { .. } => "remote",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for consentflow operations
pub type Result<T> = std::result::Result<T, ConsentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_messages_match_designer_text() {
        assert_eq!(ConsentError::BrowserClosed.to_string(), "The browser is closed");
        assert_eq!(ConsentError::Timeout.to_string(), "Timeout");
        assert_eq!(
            ConsentError::PopupBlocked.to_string(),
            "The browser has blocked the popup window."
        );
        assert_eq!(ConsentError::ConsentUrlUnavailable.to_string(), "Error fetching consent URL");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(ConsentError::Network("reset".into())).unwrap();
        assert_eq!(json["type"], "Network");
        assert_eq!(json["message"], "reset");

        let unit = serde_json::to_value(ConsentError::Timeout).unwrap();
        assert_eq!(unit["type"], "Timeout");
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ConsentError::Timeout.error_label(), "timeout");
        assert_eq!(ConsentError::Provider("denied".into()).error_label(), "provider");
        assert_eq!(ConsentError::Remote { status: 400, body: String::new() }.error_label(), "remote");
    }
}
