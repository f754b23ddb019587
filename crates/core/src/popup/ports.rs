//! Port interfaces for popup hosts
//!
//! A host is whatever can show the consent page and relay the redirect
//! page's message back: a browser window, a webview, or the loopback
//! listener in `consentflow-infra`.

use std::sync::Arc;

use consentflow_domain::{PopupFeatures, PopupId, ScreenSize, WindowMessage};
use tokio::sync::broadcast;

/// A popup window opened by a [`PopupHost`]
pub trait PopupWindow: Send + Sync {
    /// Move the window by the given offset.
    fn move_by(&self, dx: i32, dy: i32);

    /// Close the window. Closing twice is a no-op.
    fn close(&self);

    /// Whether the window has been closed by the user, the page, or
    /// [`PopupWindow::close`].
    fn is_closed(&self) -> bool;
}

/// Capability to open popups and observe messages posted to the opener
pub trait PopupHost: Send + Sync {
    /// Open `url` in a popup addressed by `popup_id`.
    ///
    /// Returns `None` when the popup was blocked.
    fn open(
        &self,
        url: &str,
        popup_id: &PopupId,
        features: &PopupFeatures,
    ) -> Option<Arc<dyn PopupWindow>>;

    /// Screen size used to center the popup, if the host has one.
    fn screen_size(&self) -> Option<ScreenSize>;

    /// Subscribe to messages posted to the hosting window.
    ///
    /// Dropping the receiver removes the listener.
    fn subscribe(&self) -> broadcast::Receiver<WindowMessage>;
}
