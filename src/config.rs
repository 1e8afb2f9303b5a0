//! Configuration management for reddit-pom
//!
//! Values come from built-in defaults, an optional TOML file and `REDDIT_POM_*`
//! environment variables, in that order of precedence (environment wins).

use crate::wait::Wait;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Name used for the comment author when none is configured.
pub const DEFAULT_AUTHOR: &str = "No-Customer3367";

/// A site account used by the scenarios.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Account {
    /// Login (e-mail or user name) typed into the login form
    pub username: String,

    /// Password typed into the login form
    pub password: String,

    /// Public display name, as rendered in comment `author` attributes
    pub display_name: String,
}

impl Account {
    /// Build an account whose display name equals its login.
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        let username = username.into();
        Self {
            display_name: username.clone(),
            username,
            password: password.into(),
        }
    }

    /// Set the public display name.
    pub fn with_display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Both login and password are present.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Key used for the account's cookie file.
    pub fn cookie_key(&self) -> &str {
        &self.username
    }
}

/// Harness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Site root, also the domain cookies are attached to
    pub base_url: String,

    /// Login page opened by every test session
    pub login_url: String,

    /// Browser CDP endpoint (e.g. "ws://localhost:9222")
    pub cdp_endpoint: String,

    /// Directory holding per-account cookie files
    pub cookie_dir: PathBuf,

    /// Directory receiving failure screenshots
    pub artifacts_dir: PathBuf,

    /// Bounded wait for element lookups in milliseconds
    pub element_timeout_ms: u64,

    /// Delay between polls of a wait condition in milliseconds
    pub poll_interval_ms: u64,

    /// Bounded wait for the post-login redirect in milliseconds
    pub login_timeout_ms: u64,

    /// Lower bound of the per-keystroke delay in milliseconds
    pub typing_delay_min_ms: u64,

    /// Upper bound of the per-keystroke delay in milliseconds (0 disables pacing)
    pub typing_delay_max_ms: u64,

    /// Viewport width applied to new pages
    pub viewport_width: u32,

    /// Viewport height applied to new pages
    pub viewport_height: u32,

    /// Account with valid credentials
    pub account: Account,

    /// Account with invalid credentials for the negative login scenario
    pub invalid_account: Account,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            login_url: "https://www.reddit.com/login/".to_string(),
            cdp_endpoint: "ws://localhost:9222".to_string(),
            cookie_dir: PathBuf::from("cookies"),
            artifacts_dir: PathBuf::from("target/ui-artifacts"),
            element_timeout_ms: 10_000,
            poll_interval_ms: 250,
            login_timeout_ms: 15_000,
            typing_delay_min_ms: 50,
            typing_delay_max_ms: 150,
            viewport_width: 1920,
            viewport_height: 1080,
            account: Account {
                display_name: DEFAULT_AUTHOR.to_string(),
                ..Account::default()
            },
            invalid_account: Account::new("invalid-user@example.com", "not-the-password"),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `REDDIT_POM_CONFIG` (if set) and environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("REDDIT_POM_CONFIG") {
            Ok(path) => HarnessConfig::from_file(&path)?,
            Err(_) => HarnessConfig::default(),
        };

        if let Ok(base_url) = env::var("REDDIT_POM_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(login_url) = env::var("REDDIT_POM_LOGIN_URL") {
            config.login_url = login_url;
        }

        if let Ok(endpoint) = env::var("REDDIT_POM_CDP_ENDPOINT") {
            config.cdp_endpoint = endpoint;
        }

        if let Ok(dir) = env::var("REDDIT_POM_COOKIE_DIR") {
            config.cookie_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = env::var("REDDIT_POM_ARTIFACTS_DIR") {
            config.artifacts_dir = PathBuf::from(dir);
        }

        if let Ok(timeout) = env::var("REDDIT_POM_ELEMENT_TIMEOUT_MS") {
            config.element_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_ELEMENT_TIMEOUT_MS"))?;
        }

        if let Ok(interval) = env::var("REDDIT_POM_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_POLL_INTERVAL_MS"))?;
        }

        if let Ok(timeout) = env::var("REDDIT_POM_LOGIN_TIMEOUT_MS") {
            config.login_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_LOGIN_TIMEOUT_MS"))?;
        }

        if let Ok(delay) = env::var("REDDIT_POM_TYPING_DELAY_MIN_MS") {
            config.typing_delay_min_ms = delay
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_TYPING_DELAY_MIN_MS"))?;
        }

        if let Ok(delay) = env::var("REDDIT_POM_TYPING_DELAY_MAX_MS") {
            config.typing_delay_max_ms = delay
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_TYPING_DELAY_MAX_MS"))?;
        }

        if let Ok(width) = env::var("REDDIT_POM_VIEWPORT_WIDTH") {
            config.viewport_width = width
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_VIEWPORT_WIDTH"))?;
        }

        if let Ok(height) = env::var("REDDIT_POM_VIEWPORT_HEIGHT") {
            config.viewport_height = height
                .parse()
                .map_err(|_| Error::configuration("Invalid REDDIT_POM_VIEWPORT_HEIGHT"))?;
        }

        if let Ok(username) = env::var("REDDIT_POM_USERNAME") {
            config.account.username = username;
        }

        if let Ok(password) = env::var("REDDIT_POM_PASSWORD") {
            config.account.password = password;
        }

        if let Ok(author) = env::var("REDDIT_POM_AUTHOR") {
            config.account.display_name = author;
        }

        if let Ok(username) = env::var("REDDIT_POM_BAD_USERNAME") {
            config.invalid_account.username = username;
        }

        if let Ok(password) = env::var("REDDIT_POM_BAD_PASSWORD") {
            config.invalid_account.password = password;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: HarnessConfig = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the harness cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::configuration("poll_interval_ms must be greater than zero"));
        }
        if self.typing_delay_min_ms > self.typing_delay_max_ms {
            return Err(Error::configuration(
                "typing_delay_min_ms must not exceed typing_delay_max_ms",
            ));
        }
        if !self.cdp_endpoint.starts_with("ws://") && !self.cdp_endpoint.starts_with("wss://") {
            return Err(Error::configuration(format!(
                "cdp_endpoint must be a ws:// or wss:// URL, got {}",
                self.cdp_endpoint
            )));
        }
        Ok(())
    }

    /// Element lookup timeout
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    /// Wait poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Post-login redirect timeout
    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    /// Bounded wait used by element and page objects
    pub fn element_wait(&self) -> Wait {
        Wait::new(self.element_timeout(), self.poll_interval())
    }

    /// Keystroke pacing range, `None` when pacing is disabled.
    pub fn typing_delay(&self) -> Option<(Duration, Duration)> {
        if self.typing_delay_max_ms == 0 {
            return None;
        }
        Some((
            Duration::from_millis(self.typing_delay_min_ms),
            Duration::from_millis(self.typing_delay_max_ms),
        ))
    }
}
