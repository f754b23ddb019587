//! Loopback popup host
//!
//! Opens the consent page in a browser and serves the redirect page on a
//! local `http` listener. A redirect carrying `code` or `error` is relayed to
//! subscribers as a percent-encoded JSON message from the listener's origin,
//! after which the popup it names counts as closed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use consentflow_core::{PopupHost, PopupWindow};
use consentflow_domain::constants::{
    DEFAULT_REDIRECT_ORIGIN, POPUP_ID_QUERY_PARAM, REDIRECT_PAGE_PATH,
};
use consentflow_domain::{
    ConsentError, LoginResult, PopupFeatures, PopupId, Result, ScreenSize, WindowMessage,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use super::browser::BrowserLauncher;
use crate::errors::InfraError;

const MESSAGE_CAPACITY: usize = 16;

/// Origin used when the configured one is the designer's `https` default.
pub const DEFAULT_LOOPBACK_ORIGIN: &str = "http://127.0.0.1:0";

/// Origin to bind for `configured`.
///
/// The designer default (`https://localhost:4200`) cannot be served by a
/// plain listener, so it maps to an ephemeral loopback port. Any other value
/// is used as given.
pub fn loopback_origin(configured: &str) -> &str {
    if configured.trim_end_matches('/') == DEFAULT_REDIRECT_ORIGIN {
        DEFAULT_LOOPBACK_ORIGIN
    } else {
        configured
    }
}

const COMPLETE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Consent Complete</title></head>
<body><h1>Consent received</h1><p>You can close this window.</p></body>
</html>"#;

const INVALID_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Consent Failed</title></head>
<body><h1>Consent failed</h1><p>The redirect carried no authorization code.</p></body>
</html>"#;

/// Browser window tracked by the loopback host
///
/// Closing it removes it from the host's registry.
#[derive(Debug)]
struct LoopbackWindow {
    id: String,
    closed: AtomicBool,
    host: Weak<HostState>,
}

impl LoopbackWindow {
    fn new(id: String, host: Weak<HostState>) -> Self {
        Self { id, closed: AtomicBool::new(false), host }
    }
}

impl PopupWindow for LoopbackWindow {
    fn move_by(&self, _dx: i32, _dy: i32) {}

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(host) = self.host.upgrade() else {
            return;
        };
        let mut windows = host.windows();
        if windows.get(&self.id).is_some_and(|tracked| std::ptr::eq(Arc::as_ptr(tracked), self)) {
            windows.remove(&self.id);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct HostState {
    origin: String,
    messages: broadcast::Sender<WindowMessage>,
    windows: StdMutex<HashMap<String, Arc<LoopbackWindow>>>,
}

impl HostState {
    fn windows(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<LoopbackWindow>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Popup host that uses a browser plus a local redirect listener
pub struct LoopbackPopupHost {
    state: Arc<HostState>,
    launcher: Arc<dyn BrowserLauncher>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl LoopbackPopupHost {
    /// Bind the redirect listener for `origin`.
    ///
    /// The origin must be `http` with a host. Port `0` binds an ephemeral
    /// port; [`LoopbackPopupHost::origin`] reports the bound one.
    ///
    /// # Errors
    /// - `Config` for a non-`http` or host-less origin
    /// - `Network` if the listener cannot be bound
    pub async fn start(origin: &str, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let mut url = Url::parse(origin)
            .map_err(|err| ConsentError::Config(format!("invalid redirect origin: {err}")))?;

        if url.scheme() != "http" {
            return Err(ConsentError::Config(format!(
                "loopback redirect origin must use http, got {origin}; \
                 set CONSENTFLOW_REDIRECT_ORIGIN (or redirect.origin) to e.g. {DEFAULT_LOOPBACK_ORIGIN}"
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ConsentError::Config("redirect origin missing host".into()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((host.as_str(), port)).await.map_err(|err| {
            ConsentError::from(InfraError::Io(err))
        })?;
        let bound = listener.local_addr().map_err(InfraError::Io)?.port();

        url.set_port(Some(bound))
            .map_err(|()| ConsentError::Config("redirect origin cannot carry a port".into()))?;
        let origin = url.origin().ascii_serialization();

        let (messages, _) = broadcast::channel(MESSAGE_CAPACITY);
        let state = Arc::new(HostState {
            origin: origin.clone(),
            messages,
            windows: StdMutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route(REDIRECT_PAGE_PATH, get(handle_redirect))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "redirect listener failed");
            }
        });

        info!(%origin, "redirect listener started");

        Ok(Self { state, launcher, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    /// Origin the redirect page is served from.
    pub fn origin(&self) -> &str {
        &self.state.origin
    }

    #[cfg(test)]
    fn tracked_windows(&self) -> usize {
        self.state.windows().len()
    }

    /// Stop the listener and wait for it to exit.
    ///
    /// # Errors
    /// Returns `Internal` if the listener task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(ConsentError::Internal(format!(
                        "redirect listener panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl PopupHost for LoopbackPopupHost {
    fn open(
        &self,
        url: &str,
        popup_id: &PopupId,
        features: &PopupFeatures,
    ) -> Option<Arc<dyn PopupWindow>> {
        debug!(%popup_id, features = %features.to_feature_string(), "opening consent page");

        if let Err(err) = self.launcher.launch(url) {
            warn!(%popup_id, error = %err, "browser launch failed");
            return None;
        }

        let window =
            Arc::new(LoopbackWindow::new(popup_id.to_string(), Arc::downgrade(&self.state)));
        self.state.windows().insert(popup_id.to_string(), window.clone());
        Some(window)
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        None
    }

    fn subscribe(&self) -> broadcast::Receiver<WindowMessage> {
        self.state.messages.subscribe()
    }
}

impl Drop for LoopbackPopupHost {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_redirect(
    State(state): State<Arc<HostState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let result = LoginResult {
        code: params.get("code").cloned(),
        error: params.get("error").cloned(),
    };
    if result.code.is_none() && result.error.is_none() {
        warn!("redirect without code or error ignored");
        return Html(INVALID_PAGE);
    }

    let payload = match serde_json::to_string(&result) {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "failed to encode redirect message");
            return Html(INVALID_PAGE);
        }
    };

    let message = WindowMessage::new(state.origin.clone(), urlencoding::encode(&payload));
    if state.messages.send(message).is_err() {
        debug!("redirect message had no listeners");
    }

    // Message first, then closure: the handshake reads closure before draining.
    let closing: Vec<Arc<LoopbackWindow>> = {
        let mut windows = state.windows();
        match params.get(POPUP_ID_QUERY_PARAM) {
            Some(pid) => windows.remove(pid).into_iter().collect(),
            None => windows.drain().map(|(_, window)| window).collect(),
        }
    };
    for window in closing {
        window.close();
    }

    Html(COMPLETE_PAGE)
}
