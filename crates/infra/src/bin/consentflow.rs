//! Interactive consent for a Logic Apps managed API connection.
//!
//! Fetches the consent link, opens it in the system browser, waits for the
//! redirect on the loopback listener and confirms the code with ARM. The
//! confirm response is printed as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use consentflow_core::{ConsentFlow, OAuthService, RedirectResolver, TokenSource};
use consentflow_infra::observability::init_tracing;
use consentflow_infra::{
    config, loopback_origin, ArmClient, EnvTokenSource, LoopbackPopupHost, SystemBrowser,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "consentflow", version, about = "Consent to a Logic Apps API connection")]
struct Args {
    /// Name of the `Microsoft.Web/connections` resource
    connection: String,

    /// Config file; defaults to environment variables, then standard locations
    #[arg(short, long, env = "CONSENTFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => config::load_from_file(Some(path)),
        None => config::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config.logging).context("failed to initialise logging")?;

    let host = Arc::new(
        LoopbackPopupHost::start(loopback_origin(&config.redirect.origin), Arc::new(SystemBrowser))
            .await
            .context("failed to start redirect listener")?,
    );
    let resolver = RedirectResolver::new(host.origin()).context("invalid redirect origin")?;

    let tokens: Arc<dyn TokenSource> = Arc::new(EnvTokenSource::new());
    let arm = Arc::new(ArmClient::new(&config.http, tokens.clone())?);

    let service = OAuthService::new(config.service.clone(), arm, tokens, resolver, host)
        .with_popup_settings(config.popup);
    let flow = ConsentFlow::new(Arc::new(service));

    info!(connection = %args.connection, "starting consent");
    let response = flow.run(&args.connection).await.context("consent failed")?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
