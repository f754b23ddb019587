//! Popup hosts backed by the local machine

pub mod browser;
pub mod loopback;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use loopback::{loopback_origin, LoopbackPopupHost, DEFAULT_LOOPBACK_ORIGIN};
