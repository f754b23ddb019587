//! Launching URLs in a browser

use std::io;

/// Opens a URL somewhere the user can interact with it
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self, url: &str) -> io::Result<()>;
}

/// The operating system's default browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn launch(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}
