//! Common test utilities
//!
//! Live tests need a Chrome started with `--remote-debugging-port`; scenario tests also
//! need `REDDIT_POM_USERNAME` / `REDDIT_POM_PASSWORD`. Each test checks with the helpers
//! below and returns early when its prerequisites are missing.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use reddit_pom::config::HarnessConfig;
use uuid::Uuid;

/// CDP endpoint the live tests attach to
pub fn cdp_endpoint() -> String {
    std::env::var("REDDIT_POM_CDP_ENDPOINT").unwrap_or_else(|_| "ws://localhost:9222".to_string())
}

/// `true` when something answers `/json/version` at [`cdp_endpoint`]
pub async fn chrome_available() -> bool {
    let http = cdp_endpoint()
        .trim_end_matches('/')
        .replace("ws://", "http://")
        .replace("wss://", "https://");

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(format!("{}/json/version", http)).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Scratch directory unique to one test
pub fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("reddit-pom-{}-{}", label, Uuid::new_v4()))
}

/// Configuration for a live test: environment values, scratch cookie and artifact dirs
pub fn live_config(label: &str) -> HarnessConfig {
    let mut config = HarnessConfig::from_env().unwrap_or_default();
    let scratch = scratch_dir(label);
    config.cdp_endpoint = cdp_endpoint();
    config.artifacts_dir = scratch.join("artifacts");
    if std::env::var("REDDIT_POM_COOKIE_DIR").is_err() {
        config.cookie_dir = scratch.join("cookies");
    }
    config
}

/// `true` when the primary account has both login and password
pub fn credentials_available(config: &HarnessConfig) -> bool {
    config.account.is_complete()
}

/// Local page with a light-DOM form and a shadow-hosted input, served as a `data:` URL
pub fn fixture_html() -> String {
    r#"
<!DOCTYPE html>
<html>
<head>
    <title>Fixture Page</title>
</head>
<body>
    <h1 id="title">Fixture</h1>
    <button id="click-me" onclick="document.getElementById('output').textContent = 'clicked'">Click Me</button>
    <button id="disabled" disabled>Disabled</button>
    <button id="hidden" style="display:none">Hidden</button>
    <a id="docs" href="https://www.reddit.com/r/rust/">Rust</a>
    <input id="text-input" class="plain-input" type="text" />
    <div id="output"></div>
    <search-box id="search"></search-box>
    <script>
        class SearchBox extends HTMLElement {
            constructor() {
                super();
                const root = this.attachShadow({ mode: 'open' });
                root.innerHTML = '<input id="inner" type="text" /><button id="go">Go</button>';
                root.getElementById('go').addEventListener('click', () => {
                    document.getElementById('output').textContent = root.getElementById('inner').value;
                });
            }
        }
        customElements.define('search-box', SearchBox);
    </script>
</body>
</html>
    "#
    .to_string()
}

/// [`fixture_html`] as a navigable URL
pub fn fixture_url() -> String {
    "data:text/html;charset=utf-8,".to_string() + &urlencoding::encode(&fixture_html())
}
