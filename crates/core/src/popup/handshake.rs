//! Handshake state machine
//!
//! Two inputs reach a handshake: window messages and polling ticks. Only a
//! tick can settle it, and only once.

use consentflow_domain::{ConsentError, LoginResult, Result, WindowMessage};

/// Lifecycle of a single handshake attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Popup open, no settlement yet.
    Waiting,
    /// Popup closed after a message was captured.
    ClosedWithMessage,
    /// Popup closed before any message arrived.
    ClosedWithoutMessage,
    /// Popup stayed open for the maximum number of ticks.
    TimedOut,
}

/// State machine for one popup consent handshake
#[derive(Debug)]
pub struct Handshake {
    redirect_origin: String,
    max_ticks: u32,
    ticks: u32,
    captured: Option<String>,
    state: HandshakeState,
}

impl Handshake {
    /// Create a handshake that accepts messages from `redirect_origin` and
    /// times out after `max_ticks` polling ticks.
    #[must_use]
    pub fn new(redirect_origin: impl Into<String>, max_ticks: u32) -> Self {
        Self {
            redirect_origin: redirect_origin.into(),
            max_ticks: max_ticks.max(1),
            ticks: 0,
            captured: None,
            state: HandshakeState::Waiting,
        }
    }

    /// Offer a window message.
    ///
    /// Returns `true` when the message was captured; the caller then stops
    /// listening and closes the popup. Messages from other origins, messages
    /// after a capture and messages after settlement are ignored.
    pub fn accept_message(&mut self, message: &WindowMessage) -> bool {
        if self.is_settled() || self.captured.is_some() {
            return false;
        }
        if message.origin != self.redirect_origin {
            return false;
        }

        self.captured = Some(message.data.clone());
        true
    }

    /// Process one polling tick.
    ///
    /// Returns the settlement exactly once; every later call returns `None`
    /// without counting.
    pub fn tick(&mut self, popup_closed: bool) -> Option<Result<LoginResult>> {
        if self.is_settled() {
            return None;
        }
        self.ticks = self.ticks.saturating_add(1);

        if popup_closed {
            return Some(match self.captured.take() {
                Some(raw) => {
                    self.state = HandshakeState::ClosedWithMessage;
                    parse_login_message(&raw)
                }
                None => {
                    self.state = HandshakeState::ClosedWithoutMessage;
                    Err(ConsentError::BrowserClosed)
                }
            });
        }

        if self.ticks >= self.max_ticks {
            self.state = HandshakeState::TimedOut;
            return Some(Err(ConsentError::Timeout));
        }

        None
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Whether a message has been captured and not yet consumed.
    #[must_use]
    pub fn has_message(&self) -> bool {
        self.captured.is_some()
    }

    /// Whether the handshake has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state != HandshakeState::Waiting
    }
}

/// Decode a redirect page message: percent-encoded JSON `{code}` or `{error}`.
pub(crate) fn parse_login_message(raw: &str) -> Result<LoginResult> {
    let decoded = urlencoding::decode(raw)
        .map_err(|err| ConsentError::MalformedMessage(format!("invalid percent-encoding: {err}")))?;
    let message: LoginResult = serde_json::from_str(&decoded)
        .map_err(|err| ConsentError::MalformedMessage(format!("invalid JSON: {err}")))?;

    match (message.code, message.error) {
        (Some(code), _) if !code.is_empty() => Ok(LoginResult { code: Some(code), error: None }),
        (_, Some(error)) => Err(ConsentError::Provider(error)),
        _ => Err(ConsentError::MalformedMessage("message carries no code".into())),
    }
}
