//! Popup controller
//!
//! Opens the consent popup through a [`PopupHost`], listens for the redirect
//! page's message and polls for closure until the handshake settles.

use std::sync::Arc;

use consentflow_domain::constants::REDIRECT_URI_QUERY_PARAM;
use consentflow_domain::{
    ConsentError, LoginResult, OAuthPopupOptions, PopupFeatures, PopupId, PopupSettings, Result,
    WindowMessage,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

use super::handshake::Handshake;
use super::ports::{PopupHost, PopupWindow};
use crate::redirect::origin_of;

/// One in-flight popup consent handshake
///
/// The handshake starts as soon as the popup is constructed; [`OAuthPopup::login`]
/// waits for its outcome. Dropping the popup before it settles abandons the
/// handshake and stops its timer.
pub struct OAuthPopup {
    popup_id: PopupId,
    handle: Option<JoinHandle<Result<LoginResult>>>,
}

impl OAuthPopup {
    /// Start a handshake on the current Tokio runtime.
    pub fn new(
        options: OAuthPopupOptions,
        host: Arc<dyn PopupHost>,
        settings: PopupSettings,
    ) -> Self {
        let popup_id = options.popup_id.clone();
        let handle = tokio::spawn(run_login(options, host, settings));
        Self { popup_id, handle: Some(handle) }
    }

    #[must_use]
    pub const fn popup_id(&self) -> &PopupId {
        &self.popup_id
    }

    /// Wait for the handshake outcome.
    ///
    /// # Errors
    /// - `PopupBlocked` if the host refused to open the popup
    /// - `BrowserClosed` if the popup closed before a message arrived
    /// - `Timeout` if the popup stayed open for the configured number of ticks
    /// - `Provider`/`MalformedMessage` if the redirect message carried no code
    pub async fn login(mut self) -> Result<LoginResult> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| ConsentError::Internal("popup handshake already awaited".into()))?;

        handle
            .await
            .map_err(|err| ConsentError::Internal(format!("popup handshake task failed: {err}")))?
    }
}

impl Drop for OAuthPopup {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

/// Consent URL with `redirect_uri` set; every other part is left untouched.
pub(crate) fn authorization_url(consent_url: &str, redirect_uri: &str) -> Result<String> {
    let mut url = Url::parse(consent_url)
        .map_err(|err| ConsentError::Config(format!("invalid consent URL: {err}")))?;

    let has_redirect = url.query_pairs().any(|(key, _)| key == REDIRECT_URI_QUERY_PARAM);
    if has_redirect {
        let mut replaced = false;
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter_map(|(key, value)| {
                if key != REDIRECT_URI_QUERY_PARAM {
                    return Some((key.into_owned(), value.into_owned()));
                }
                if replaced {
                    return None;
                }
                replaced = true;
                Some((key.into_owned(), redirect_uri.to_string()))
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    } else {
        url.query_pairs_mut().append_pair(REDIRECT_URI_QUERY_PARAM, redirect_uri);
    }

    Ok(url.into())
}

async fn run_login(
    options: OAuthPopupOptions,
    host: Arc<dyn PopupHost>,
    settings: PopupSettings,
) -> Result<LoginResult> {
    let auth_url = authorization_url(&options.consent_url, &options.redirect_url)?;
    let redirect_origin = origin_of(&options.redirect_url)?;
    let features = PopupFeatures::from(&settings);

    let window = host.open(&auth_url, &options.popup_id, &features).ok_or_else(|| {
        warn!(popup_id = %options.popup_id, "consent popup was blocked");
        ConsentError::PopupBlocked
    })?;
    if let Some(screen) = host.screen_size() {
        let (dx, dy) = features.centering_offset(screen);
        window.move_by(dx, dy);
    }
    info!(
        popup_id = %options.popup_id,
        timeout_secs = settings.timeout().as_secs(),
        "consent popup opened"
    );

    let mut listener = Some(host.subscribe());
    let mut handshake = Handshake::new(redirect_origin, settings.max_ticks);

    let period = settings.poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            message = next_message(&mut listener) => match message {
                Some(message) => capture(
                    &mut handshake,
                    &mut listener,
                    window.as_ref(),
                    &message,
                    &options.popup_id,
                ),
                None => listener = None,
            },
            _ = ticker.tick() => {
                // Read closure before draining: a page that posts and then closes
                // itself has always delivered its message by the time we see it closed.
                let closed = window.is_closed();
                while let Some(message) = pending_message(&mut listener) {
                    let popup_id = &options.popup_id;
                    capture(&mut handshake, &mut listener, window.as_ref(), &message, popup_id);
                }
                debug!(
                    popup_id = %options.popup_id,
                    tick = handshake.ticks().saturating_add(1),
                    closed,
                    captured = handshake.has_message(),
                    "polling consent popup"
                );
                if let Some(outcome) = handshake.tick(closed) {
                    log_outcome(&options.popup_id, &handshake, &outcome);
                    return outcome;
                }
            }
        }
    }
}

fn capture(
    handshake: &mut Handshake,
    listener: &mut Option<broadcast::Receiver<WindowMessage>>,
    window: &dyn PopupWindow,
    message: &WindowMessage,
    popup_id: &PopupId,
) {
    if handshake.accept_message(message) {
        debug!(%popup_id, "consent message captured");
        *listener = None;
        window.close();
    }
}

/// A message already queued on the listener, without waiting.
fn pending_message(
    listener: &mut Option<broadcast::Receiver<WindowMessage>>,
) -> Option<WindowMessage> {
    let receiver = listener.as_mut()?;
    loop {
        match receiver.try_recv() {
            Ok(message) => return Some(message),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => return None,
        }
    }
}

/// Next message from the listener; pending forever once it is gone.
async fn next_message(
    listener: &mut Option<broadcast::Receiver<WindowMessage>>,
) -> Option<WindowMessage> {
    let Some(receiver) = listener.as_mut() else {
        return std::future::pending().await;
    };

    loop {
        match receiver.recv().await {
            Ok(message) => return Some(message),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "popup message listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

fn log_outcome(popup_id: &PopupId, handshake: &Handshake, outcome: &Result<LoginResult>) {
    match outcome {
        Ok(_) => info!(%popup_id, ticks = handshake.ticks(), "consent handshake completed"),
        Err(err) => warn!(
            %popup_id,
            ticks = handshake.ticks(),
            error = err.error_label(),
            "consent handshake failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use consentflow_domain::ScreenSize;

    use super::*;
    use crate::redirect::RedirectResolver;
    use crate::testing::MockPopupHost;

    const CONSENT_URL: &str = "https://logic-apis.example/consent?state=xyz&client_id=abc";

    fn options() -> OAuthPopupOptions {
        RedirectResolver::default().popup_options(CONSENT_URL)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn authorization_url_only_adds_redirect_uri() {
        let redirect = "https://localhost:4200/oauthredirect.html?pid=p1";
        let url = authorization_url(CONSENT_URL, redirect).unwrap();

        assert!(url.starts_with(CONSENT_URL));
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("state".into(), "xyz".into()),
                ("client_id".into(), "abc".into()),
                ("redirect_uri".into(), redirect.into()),
            ]
        );
    }

    #[test]
    fn authorization_url_replaces_existing_redirect_uri() {
        let url = authorization_url(
            "https://login.example/consent?redirect_uri=old&a=1&redirect_uri=older",
            "https://localhost:4200/oauthredirect.html",
        )
        .unwrap();

        let pairs: Vec<(String, String)> = Url::parse(&url).unwrap().query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("redirect_uri".into(), "https://localhost:4200/oauthredirect.html".into()),
                ("a".into(), "1".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_with_code_after_matching_message() {
        let host = Arc::new(MockPopupHost::new());
        let options = options();
        let origin = RedirectResolver::default().redirect_origin().to_string();
        let popup = OAuthPopup::new(options.clone(), host.clone(), PopupSettings::default());
        assert_eq!(popup.popup_id(), &options.popup_id);

        settle().await;
        host.post(WindowMessage::new(origin, r#"{"code":"abc123"}"#));

        let result = popup.login().await.unwrap();
        assert_eq!(result, LoginResult { code: Some("abc123".into()), error: None });

        let opened = host.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].popup_id, options.popup_id);
        assert_eq!(
            opened[0].url,
            authorization_url(CONSENT_URL, &options.redirect_url).unwrap()
        );
        assert_eq!(opened[0].features, PopupFeatures { width: 600, height: 600 });
        assert!(host.window().close_calls() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ignores_foreign_origins_then_accepts_match() {
        let host = Arc::new(MockPopupHost::new());
        let origin = RedirectResolver::default().redirect_origin().to_string();
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        settle().await;
        for _ in 0..5 {
            host.post(WindowMessage::new("https://attacker.example", r#"{"code":"forged"}"#));
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!host.window().is_closed());
        assert_eq!(host.window().close_calls(), 0);

        host.post(WindowMessage::new(origin, r#"{"code":"genuine"}"#));
        let result = popup.login().await.unwrap();
        assert_eq!(result.code.as_deref(), Some("genuine"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_when_user_closes_popup() {
        let host = Arc::new(MockPopupHost::new());
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        settle().await;
        host.window().close_by_user();

        let err = popup.login().await.unwrap_err();
        assert_eq!(err, ConsentError::BrowserClosed);
        assert_eq!(err.to_string(), "The browser is closed");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_max_ticks_and_stops_polling() {
        let host = Arc::new(MockPopupHost::new());
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        let err = popup.login().await.unwrap_err();
        assert_eq!(err, ConsentError::Timeout);
        assert_eq!(err.to_string(), "Timeout");
        assert_eq!(host.window().closed_checks(), 300);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(host.window().closed_checks(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_follows_configured_polling() {
        let host = Arc::new(MockPopupHost::new());
        let settings = PopupSettings { poll_interval_ms: 50, max_ticks: 4, ..PopupSettings::default() };
        let started = Instant::now();

        let err = OAuthPopup::new(options(), host.clone(), settings).login().await.unwrap_err();

        assert_eq!(err, ConsentError::Timeout);
        assert_eq!(host.window().closed_checks(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_popup_fails_without_polling() {
        let host = Arc::new(MockPopupHost::blocking());
        let err = OAuthPopup::new(options(), host.clone(), PopupSettings::default())
            .login()
            .await
            .unwrap_err();

        assert_eq!(err, ConsentError::PopupBlocked);
        assert_eq!(host.window().closed_checks(), 0);
        assert_eq!(host.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn centers_popup_on_reported_screen() {
        let host =
            Arc::new(MockPopupHost::new().with_screen(ScreenSize { width: 1600, height: 1000 }));
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        settle().await;
        host.window().close_by_user();
        let _ = popup.login().await;

        assert_eq!(host.window().moves(), vec![(500, 200)]);
    }

    #[tokio::test(start_paused = true)]
    async fn listener_is_removed_after_capture() {
        let host = Arc::new(MockPopupHost::new());
        let origin = RedirectResolver::default().redirect_origin().to_string();
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        settle().await;
        assert_eq!(host.subscriber_count(), 1);
        host.post(WindowMessage::new(origin, r#"{"code":"abc"}"#));
        settle().await;
        assert_eq!(host.subscriber_count(), 0);

        assert!(popup.login().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_popup_stops_the_handshake() {
        let host = Arc::new(MockPopupHost::new());
        let popup = OAuthPopup::new(options(), host.clone(), PopupSettings::default());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(popup);
        let checks = host.window().closed_checks();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(checks, 2);
        assert_eq!(host.window().closed_checks(), checks);
    }
}
