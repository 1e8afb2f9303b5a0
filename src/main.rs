//! # reddit-pom-bootstrap
//!
//! Logs the primary account in once and saves its cookies, so later test runs can take
//! the cookie shortcut instead of typing credentials.
//!
//! ## Environment
//! - `REDDIT_POM_CDP_ENDPOINT`: browser CDP endpoint (default: ws://localhost:9222)
//! - `REDDIT_POM_USERNAME` / `REDDIT_POM_PASSWORD`: primary account
//! - `REDDIT_POM_COOKIE_DIR`: where the cookie file goes (default: cookies)
//! - `REDDIT_POM_CONFIG`: optional TOML file with any of the settings above
//! - `RUST_LOG`: log filter (default: info)

use anyhow::{bail, Context};
use reddit_pom::{config::HarnessConfig, logging, AuthMethod, Error, TestSession};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("info");
    info!("reddit-pom-bootstrap v{}", reddit_pom::VERSION);

    let config = HarnessConfig::from_env().context("loading configuration")?;
    if !config.account.is_complete() {
        bail!("set REDDIT_POM_USERNAME and REDDIT_POM_PASSWORD");
    }
    info!(endpoint = %config.cdp_endpoint, account = %config.account.username, "Configuration loaded");

    let session = TestSession::start(config.clone())
        .await
        .context("attaching to the browser")?;

    let outcome = tokio::select! {
        result = session.authorize(&config.account) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C signal");
            Err(Error::interrupted("login aborted by Ctrl+C"))
        }
    };

    let outcome = match outcome {
        Ok(AuthMethod::Credentials) => Ok(()),
        Ok(method) => {
            // Cookies were already good; refresh the file so its timestamp moves on
            info!(?method, "Session already authorized, re-saving cookies");
            session
                .cookies()
                .save(session.page().as_ref(), config.account.cookie_key())
                .await
                .map(|_| ())
        }
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        error!("Bootstrap failed: {}", e);
        match session.capture_failure("bootstrap").await {
            Ok(path) => info!(path = %path.display(), "Screenshot saved"),
            Err(shot) => warn!("No screenshot: {}", shot),
        }
    }

    let path = session.cookies().path_for(config.account.cookie_key());
    if let Err(e) = session.finish().await {
        warn!("Teardown failed: {}", e);
    }

    outcome.context("authorizing the primary account")?;
    println!("{}", path.display());
    Ok(())
}
