//! Bearer token claim extraction
//!
//! Only the payload segment of the JWT is decoded. Signatures are not
//! verified here; ARM validates the token on every call.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use consentflow_domain::{ConsentError, Result};
use serde_json::{Map, Value};

/// Identity claims the consent requests carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub object_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl TokenClaims {
    /// Both claims, or `InvalidToken` naming the missing one.
    ///
    /// # Errors
    /// Returns `ConsentError::InvalidToken` if either claim is absent.
    pub fn require(&self) -> Result<(&str, &str)> {
        let object_id = self.object_id.as_deref().ok_or_else(|| {
            ConsentError::InvalidToken(format!("missing claim {}", JwtTokenHelper::OBJECT_ID))
        })?;
        let tenant_id = self.tenant_id.as_deref().ok_or_else(|| {
            ConsentError::InvalidToken(format!("missing claim {}", JwtTokenHelper::TENANT_ID))
        })?;
        Ok((object_id, tenant_id))
    }
}

/// Decodes JWT payloads
pub struct JwtTokenHelper;

impl JwtTokenHelper {
    /// Object id of the signed-in principal.
    pub const OBJECT_ID: &'static str = "oid";
    /// Directory (tenant) id of the signed-in principal.
    pub const TENANT_ID: &'static str = "tid";

    /// Decode the payload segment of a compact JWT into a JSON object.
    ///
    /// A leading `Bearer ` scheme is ignored.
    ///
    /// # Errors
    /// Returns `ConsentError::InvalidToken` if the token is not three
    /// dot-separated segments or the payload is not base64url JSON object.
    pub fn extract_payload(token: &str) -> Result<Map<String, Value>> {
        let token = token.trim();
        let token = token
            .strip_prefix("Bearer ")
            .or_else(|| token.strip_prefix("bearer "))
            .unwrap_or(token);

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(ConsentError::InvalidToken("invalid JWT format".into()));
        }

        let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).map_err(|err| {
            ConsentError::InvalidToken(format!("failed to decode token payload: {err}"))
        })?;

        match serde_json::from_slice::<Value>(&payload_bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ConsentError::InvalidToken("token payload is not an object".into())),
            Err(err) => {
                Err(ConsentError::InvalidToken(format!("failed to parse token payload: {err}")))
            }
        }
    }

    /// Read the object and tenant id claims.
    ///
    /// # Errors
    /// Propagates [`JwtTokenHelper::extract_payload`] failures.
    pub fn claims(token: &str) -> Result<TokenClaims> {
        let payload = Self::extract_payload(token)?;
        let claim = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);

        Ok(TokenClaims { object_id: claim(Self::OBJECT_ID), tenant_id: claim(Self::TENANT_ID) })
    }
}
