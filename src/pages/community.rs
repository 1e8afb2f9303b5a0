//! Community (subreddit) header and its join button
//!
//! The join button sits two shadow boundaries deep:
//! `shreddit-subreddit-header-buttons` >> shadow >> visible `faceplate-tracker` >>
//! `shreddit-join-button` >> shadow >> `button.join-btn`. The header renders several
//! trackers and hides all but one, so the lookup picks the first displayed tracker
//! rather than the first match.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, Level};

use super::BasePage;
use crate::elements::{Button, Clickable};
use crate::locator::Locator;
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::{Error, Result};

pub const HEADER_BUTTONS_HOST: &str = "shreddit-subreddit-header-buttons";
pub const SUBSCRIBE_TRACKER: &str = "faceplate-tracker";
pub const JOIN_BUTTON_HOST: &str = "shreddit-join-button";
pub const JOIN_BUTTON: &str = "button.join-btn, button[class*='join-btn']";

/// Button labels meaning the account already joined
pub const JOINED_LABELS: &[&str] = &["Joined", "В сообществе", "B coo6щecтвe"];

/// Default bound for the join button to show up
const SUBSCRIBE_BUTTON_TIMEOUT: Duration = Duration::from_secs(25);

const HIGHLIGHT: &str = "function() { this.style.border = '3px solid red'; }";

#[derive(Debug, Clone)]
pub struct CommunityPage {
    base: BasePage,
    subscribe_timeout: Duration,
}

impl CommunityPage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self::from_base(BasePage::new(page, wait))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self {
            base,
            subscribe_timeout: SUBSCRIBE_BUTTON_TIMEOUT,
        }
    }

    pub fn with_subscribe_timeout(mut self, timeout: Duration) -> Self {
        self.subscribe_timeout = timeout;
        self
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Open `<base_url>/r/<name>/`
    pub async fn open_community(&self, base_url: &str, name: &str) -> Result<()> {
        let url = format!("{}/r/{}/", base_url.trim_end_matches('/'), name);
        self.base.open(&url).await
    }

    /// Resolve the join button through both shadow boundaries
    pub async fn find_subscribe_button(&self) -> Result<Arc<dyn ElementRef>> {
        let page = self.base.page().as_ref();
        let wait = self.base.wait();

        let header = wait.for_present(page, &Locator::css(HEADER_BUTTONS_HOST)).await?;
        let header_shadow = header
            .shadow_root()
            .await?
            .ok_or_else(|| Error::element_not_found(format!("shadow root of {}", HEADER_BUTTONS_HOST)))?;

        let tracker = first_displayed(
            wait,
            page,
            &Locator::css(SUBSCRIBE_TRACKER),
            header_shadow,
            "visible subscribe tracker",
        )
        .await?;

        first_displayed(
            wait,
            page,
            &Locator::css(JOIN_BUTTON_HOST).shadow().css_within(JOIN_BUTTON),
            tracker,
            "visible join button",
        )
        .await
    }

    pub async fn click_subscribe_button(&self) -> Result<()> {
        let button = self.find_subscribe_button().await?;
        if tracing::enabled!(Level::DEBUG) {
            button.run_script(HIGHLIGHT).await?;
        }
        info!("Clicking subscribe button");
        Button::from_handle(Arc::clone(self.base.page()), button, self.base.wait())
            .click()
            .await
    }

    pub async fn get_subscribe_button_text(&self) -> Result<String> {
        let button = self.find_subscribe_button().await?;
        Ok(button.text().await?.trim().to_string())
    }

    /// Poll until the join button is displayed, swallowing lookup failures
    pub async fn wait_for_subscribe_button(&self) -> Result<()> {
        self.base
            .wait()
            .with_timeout(self.subscribe_timeout)
            .until_true("subscribe button", || async move {
                match self.find_subscribe_button().await {
                    Ok(button) => button.is_displayed().await.or(Ok(false)),
                    Err(e) => {
                        debug!("Waiting for subscribe button: {}", e);
                        Ok(false)
                    }
                }
            })
            .await
    }

    /// The button reads as joined. Any failure reads as not subscribed.
    pub async fn is_subscribed(&self) -> bool {
        match self.get_subscribe_button_text().await {
            Ok(text) => JOINED_LABELS.contains(&text.as_str()),
            Err(e) => {
                debug!("Subscription state unreadable: {}", e);
                false
            }
        }
    }
}

/// First match of `locator` under `scope` that is displayed
async fn first_displayed(
    wait: Wait,
    page: &dyn PageContext,
    locator: &Locator,
    scope: Arc<dyn ElementRef>,
    description: &str,
) -> Result<Arc<dyn ElementRef>> {
    wait.until(description, || {
        let scope = Arc::clone(&scope);
        async move {
            for candidate in locator.find_all_from(page, Some(scope)).await? {
                if candidate.is_displayed().await? {
                    return Ok(Some(candidate));
                }
            }
            Ok(None)
        }
    })
    .await
}
