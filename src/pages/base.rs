//! Primitives shared by every page object

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::elements::{Button, Input, Link};
use crate::locator::Locator;
use crate::session::{ElementRef, NavigationOptions, PageContext};
use crate::wait::Wait;
use crate::Result;

/// Page handle plus the wait every lookup on it uses
#[derive(Debug, Clone)]
pub struct BasePage {
    page: Arc<dyn PageContext>,
    wait: Wait,
    navigation: NavigationOptions,
    typing_delay: Option<(Duration, Duration)>,
}

impl BasePage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self {
            page,
            wait,
            navigation: NavigationOptions::default(),
            typing_delay: None,
        }
    }

    pub fn with_navigation(mut self, navigation: NavigationOptions) -> Self {
        self.navigation = navigation;
        self
    }

    /// Keystroke pacing applied to inputs created through [`BasePage::input`]
    pub fn with_typing_delay(mut self, delay: Option<(Duration, Duration)>) -> Self {
        self.typing_delay = delay;
        self
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }

    pub fn wait(&self) -> Wait {
        self.wait
    }

    pub fn typing_delay(&self) -> Option<(Duration, Duration)> {
        self.typing_delay
    }

    pub fn button(&self, locator: impl Into<Locator>) -> Button {
        Button::of(Arc::clone(&self.page), locator, self.wait)
    }

    pub fn input(&self, locator: impl Into<Locator>) -> Input {
        Input::of(Arc::clone(&self.page), locator, self.wait).with_typing_delay(self.typing_delay)
    }

    pub fn link(&self, locator: impl Into<Locator>) -> Link {
        Link::of(Arc::clone(&self.page), locator, self.wait)
    }

    /// Navigate and wait for the document
    pub async fn open(&self, url: &str) -> Result<()> {
        info!(page_id = %self.page.id(), url = %url, "Opening page");
        self.page.navigate(url, self.navigation.clone()).await
    }

    /// Reload and wait for the new document
    pub async fn refresh(&self) -> Result<()> {
        debug!(page_id = %self.page.id(), "Refreshing page");
        self.page.reload(self.navigation.clone()).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.page.current_url().await
    }

    /// Title contains `part` within the bound; a timeout reads as `false`
    pub async fn is_title_contains(&self, part: &str) -> Result<bool> {
        let page = self.page.as_ref();
        let outcome = self
            .wait
            .until_true(&format!("title containing {:?}", part), || async move {
                Ok(page.title().await?.contains(part))
            })
            .await;

        match outcome {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found_or_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn scroll_to_center(&self, element: &dyn ElementRef) -> Result<()> {
        element.scroll_into_view().await
    }

    pub async fn wait_for_visible(&self, locator: &Locator) -> Result<Arc<dyn ElementRef>> {
        self.wait.for_visible(self.page.as_ref(), locator).await
    }

    /// Every match, once all are displayed. No match at all satisfies the wait.
    pub async fn wait_for_all_visible(&self, locator: &Locator) -> Result<Vec<Arc<dyn ElementRef>>> {
        self.wait.for_all_visible(self.page.as_ref(), locator).await
    }

    pub async fn wait_for_clickable(&self, locator: &Locator) -> Result<Arc<dyn ElementRef>> {
        self.wait.for_clickable(self.page.as_ref(), locator).await
    }

    /// Current URL once `predicate` accepts it
    pub async fn wait_for_url<P>(&self, description: &str, predicate: P) -> Result<String>
    where
        P: Fn(&str) -> bool,
    {
        self.wait.for_url(self.page.as_ref(), description, predicate).await
    }

    pub async fn wait_for_url_contains(&self, part: &str) -> Result<String> {
        self.wait_for_url(&format!("URL containing {:?}", part), |url| url.contains(part))
            .await
    }

    pub async fn wait_for_url_not_contains(&self, part: &str) -> Result<String> {
        self.wait_for_url(&format!("URL without {:?}", part), |url| !url.contains(part))
            .await
    }
}
