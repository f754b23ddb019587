//! # consentflow Core
//!
//! Consent handshake logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The redirect resolver and JWT claim helper
//! - The popup handshake state machine and its Tokio driver
//! - The OAuth consent service facade and the end-to-end consent flow
//! - Port interfaces (traits) for HTTP, bearer tokens and popup hosts
//!
//! ## Architecture Principles
//! - Only depends on `consentflow-domain`
//! - No HTTP, browser or platform code
//! - All external capabilities via traits
//! - Polling period and timeout come from configuration, so handshakes run
//!   on a paused Tokio clock in tests

pub mod consent;
pub mod popup;
pub mod redirect;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

// Re-export specific items to avoid ambiguity
pub use consent::ports::{HttpPost, PostRequest, TokenSource};
pub use consent::{ConsentFlow, OAuthService};
pub use popup::ports::{PopupHost, PopupWindow};
pub use popup::{Handshake, HandshakeState, OAuthPopup};
pub use redirect::RedirectResolver;
pub use token::{JwtTokenHelper, TokenClaims};
