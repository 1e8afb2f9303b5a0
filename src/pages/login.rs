//! Login screen

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::BasePage;
use crate::elements::{Button, Clickable, Editable, Input, UiElement};
use crate::locator::{By, Locator};
use crate::session::PageContext;
use crate::wait::Wait;
use crate::Result;

pub const USERNAME_HOST: &str = "faceplate-text-input#login-username";
pub const USERNAME_FIELD: &str = "input[name='username']";
pub const PASSWORD_HOST: &str = "faceplate-text-input#login-password";
pub const PASSWORD_FIELD: &str = "input[name='password']";
pub const LOGIN_BUTTON: &str = "button.login";

/// Default bound for the redirect away from the login page
const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct LoginPage {
    base: BasePage,
    username: Input,
    password: Input,
    login_button: Button,
    login_timeout: Duration,
}

impl LoginPage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self::from_base(BasePage::new(page, wait))
    }

    pub fn from_base(base: BasePage) -> Self {
        let username = base.input(Locator::in_shadow_of(By::css(USERNAME_HOST), By::css(USERNAME_FIELD)));
        let password = base.input(Locator::in_shadow_of(By::css(PASSWORD_HOST), By::css(PASSWORD_FIELD)));
        let login_button = base.button(By::css(LOGIN_BUTTON));

        Self {
            base,
            username,
            password,
            login_button,
            login_timeout: LOGIN_TIMEOUT,
        }
    }

    /// Bound for the post-submit redirect
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub async fn enter_username(&self, username: &str) -> Result<()> {
        self.username.send_keys(username).await
    }

    pub async fn enter_password(&self, password: &str) -> Result<()> {
        self.password.send_keys(password).await
    }

    /// Whether the username field shows up within the element bound
    pub async fn is_username_field_visible(&self) -> Result<bool> {
        self.username.is_visible().await
    }

    /// Submit, wait for the URL to leave the login page, then refresh.
    ///
    /// A rejected login never leaves the page; after the login timeout the page is
    /// refreshed anyway and the caller inspects the URL.
    pub async fn click_login_button(&self) -> Result<()> {
        self.login_button.click().await?;

        let redirect = self
            .base
            .wait()
            .with_timeout(self.login_timeout)
            .for_url(self.base.page().as_ref(), "redirect away from the login page", |url| {
                !url.contains("/login")
            })
            .await;

        match redirect {
            Ok(url) => info!(url = %url, "Left the login page"),
            Err(e) if e.is_not_found_or_timeout() => warn!("Still on the login page: {}", e),
            Err(e) => return Err(e),
        }

        self.base.refresh().await
    }

    /// Credential entry and submit
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        info!(username = %username, "Logging in");
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.click_login_button().await
    }
}
