//! Payloads exchanged with the `Microsoft.Web/connections` consent actions
//!
//! Field names follow the ARM wire format (camelCase).

use serde::{Deserialize, Serialize};

use crate::constants::CONSENT_PARAMETER_NAME;

/// One entry of a `listConsentLinks` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentLinkParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Body of `POST .../listConsentLinks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentLinkRequest {
    pub parameters: Vec<ConsentLinkParameter>,
}

impl ConsentLinkRequest {
    /// Request a single link for the connection's `token` parameter.
    #[must_use]
    pub fn for_token_parameter(
        redirect_url: String,
        object_id: Option<String>,
        tenant_id: Option<String>,
    ) -> Self {
        Self {
            parameters: vec![ConsentLinkParameter {
                parameter_name: Some(CONSENT_PARAMETER_NAME.to_string()),
                redirect_url,
                object_id,
                tenant_id,
            }],
        }
    }
}

/// A consent link returned by ARM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentLink {
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response envelope of `listConsentLinks`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentLinkResponse {
    #[serde(default)]
    pub value: Vec<ConsentLink>,
}

impl ConsentLinkResponse {
    /// First non-empty link, if any.
    #[must_use]
    pub fn first_link(&self) -> Option<&str> {
        self.value.first().map(|link| link.link.as_str()).filter(|link| !link.is_empty())
    }
}

/// Body of `POST .../confirmConsentCode`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmConsentCodeRequest {
    pub code: String,
    pub object_id: String,
    pub tenant_id: String,
}
