//! Popup consent handshake
//!
//! [`Handshake`] is the synchronous state machine; [`OAuthPopup`] drives it
//! from a popup host's message stream and a polling interval.

pub mod controller;
pub mod handshake;
pub mod ports;

pub use controller::OAuthPopup;
pub use handshake::{Handshake, HandshakeState};
