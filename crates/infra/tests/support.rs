use std::io;
use std::sync::{Arc, Mutex};

use consentflow_infra::BrowserLauncher;
use url::Url;

/// Identity token with `oid`/`tid` claims.
pub const ARM_TOKEN: &str =
    "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJvaWQiOiJvYmplY3QtMSIsInRpZCI6InRlbmFudC0xIn0.sig";

pub const SUBSCRIPTION: &str = "sub-1";
pub const RESOURCE_GROUP: &str = "rg-1";

/// How the simulated identity provider answers the consent page
#[derive(Debug, Clone)]
pub enum ProviderReply {
    Code(&'static str),
    Error(&'static str),
    Nothing,
}

/// Stands in for a browser: follows the consent URL's `redirect_uri` with
/// the configured reply.
pub struct RedirectingBrowser {
    reply: ProviderReply,
    pub opened: Mutex<Vec<String>>,
}

impl RedirectingBrowser {
    pub fn new(reply: ProviderReply) -> Arc<Self> {
        Arc::new(Self { reply, opened: Mutex::new(Vec::new()) })
    }
}

impl BrowserLauncher for RedirectingBrowser {
    fn launch(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let consent = Url::parse(url).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let redirect = consent
            .query_pairs()
            .find(|(key, _)| key == "redirect_uri")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no redirect_uri"))?;

        let target = match self.reply {
            ProviderReply::Code(code) => format!("{redirect}&code={code}"),
            ProviderReply::Error(error) => format!("{redirect}&error={error}"),
            ProviderReply::Nothing => return Ok(()),
        };

        tokio::spawn(async move {
            let _ = reqwest::get(target).await;
        });
        Ok(())
    }
}

/// Always fails, like a machine without a browser.
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn launch(&self, _url: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no browser available"))
    }
}
