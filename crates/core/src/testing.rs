//! Test doubles for the consent ports

// Test mocks: poisoned mutexes fail the test anyway
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use consentflow_domain::{
    ConsentError, PopupFeatures, PopupId, Result, ScreenSize, WindowMessage,
};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::consent::ports::{HttpPost, PostRequest, TokenSource};
use crate::popup::ports::{PopupHost, PopupWindow};

/// Unsigned JWT carrying `payload`.
pub fn jwt_with_payload(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

pub struct StaticTokens(Option<String>);

impl StaticTokens {
    pub const fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

impl TokenSource for StaticTokens {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Records requests and replays queued responses (the last one repeats).
pub struct MockHttpPost {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<PostRequest>>,
}

impl MockHttpPost {
    pub fn responding(response: Result<Value>) -> Self {
        Self::with_responses(vec![response])
    }

    pub fn with_responses(responses: Vec<Result<Value>>) -> Self {
        Self { responses: Mutex::new(responses.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpPost for MockHttpPost {
    async fn post(&self, request: PostRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            return responses.pop_front().unwrap();
        }
        responses
            .front()
            .cloned()
            .unwrap_or_else(|| Err(ConsentError::Internal("no mock response".into())))
    }
}

#[derive(Default)]
pub struct MockPopupWindow {
    closed: AtomicBool,
    close_calls: AtomicUsize,
    closed_checks: AtomicUsize,
    moves: Mutex<Vec<(i32, i32)>>,
}

impl MockPopupWindow {
    /// Simulate the user closing the window.
    pub fn close_by_user(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn closed_checks(&self) -> usize {
        self.closed_checks.load(Ordering::SeqCst)
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.moves.lock().unwrap().clone()
    }
}

impl PopupWindow for MockPopupWindow {
    fn move_by(&self, dx: i32, dy: i32) {
        self.moves.lock().unwrap().push((dx, dy));
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed_checks.fetch_add(1, Ordering::SeqCst);
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct OpenedPopup {
    pub url: String,
    pub popup_id: PopupId,
    pub features: PopupFeatures,
}

pub struct MockPopupHost {
    window: Arc<MockPopupWindow>,
    sender: broadcast::Sender<WindowMessage>,
    opened: Mutex<Vec<OpenedPopup>>,
    screen: Option<ScreenSize>,
    blocked: bool,
}

impl MockPopupHost {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            window: Arc::new(MockPopupWindow::default()),
            sender,
            opened: Mutex::new(Vec::new()),
            screen: None,
            blocked: false,
        }
    }

    pub fn blocking() -> Self {
        Self { blocked: true, ..Self::new() }
    }

    pub fn with_screen(mut self, screen: ScreenSize) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn window(&self) -> Arc<MockPopupWindow> {
        self.window.clone()
    }

    pub fn opened(&self) -> Vec<OpenedPopup> {
        self.opened.lock().unwrap().clone()
    }

    /// Post a message to the hosting window.
    pub fn post(&self, message: WindowMessage) {
        let _ = self.sender.send(message);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl PopupHost for MockPopupHost {
    fn open(
        &self,
        url: &str,
        popup_id: &PopupId,
        features: &PopupFeatures,
    ) -> Option<Arc<dyn PopupWindow>> {
        if self.blocked {
            return None;
        }
        self.opened.lock().unwrap().push(OpenedPopup {
            url: url.to_string(),
            popup_id: popup_id.clone(),
            features: *features,
        });
        Some(self.window.clone())
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }

    fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.sender.subscribe()
    }
}
