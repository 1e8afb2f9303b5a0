//! Element wrapper
//!
//! [`Element`] owns exactly one source: a locator that is re-resolved on every access, or
//! a handle that was resolved earlier. Every operation resolves first, through a bounded
//! wait, then acts on the handle.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::locator::Locator;
use crate::session::{ElementRef, PageContext};
use crate::wait::{conditions, Wait};
use crate::Result;

/// Where an element comes from
#[derive(Debug, Clone)]
pub enum ElementSource {
    /// Looked up on demand
    Located(Locator),
    /// Resolved once, used as is
    Cached(Arc<dyn ElementRef>),
}

/// Lazily resolved DOM element
#[derive(Debug, Clone)]
pub struct Element {
    page: Arc<dyn PageContext>,
    source: ElementSource,
    wait: Wait,
    typing_delay: Option<(Duration, Duration)>,
}

impl Element {
    /// Element resolved by `locator` on every access
    pub fn located(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Self {
        Self {
            page,
            source: ElementSource::Located(locator.into()),
            wait,
            typing_delay: None,
        }
    }

    /// Element bound to an already resolved handle
    pub fn cached(page: Arc<dyn PageContext>, handle: Arc<dyn ElementRef>, wait: Wait) -> Self {
        Self {
            page,
            source: ElementSource::Cached(handle),
            wait,
            typing_delay: None,
        }
    }

    /// Resolve `locator` now and keep the handle
    pub async fn find(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Result<Self> {
        let locator = locator.into();
        let handle = wait.for_present(page.as_ref(), &locator).await?;
        Ok(Self::cached(page, handle, wait))
    }

    /// Pace `send_keys` with a random per-keystroke delay in `[min, max]`
    pub fn with_typing_delay(mut self, delay: Option<(Duration, Duration)>) -> Self {
        self.typing_delay = delay;
        self
    }

    pub fn with_wait(mut self, wait: Wait) -> Self {
        self.wait = wait;
        self
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }

    pub fn source(&self) -> &ElementSource {
        &self.source
    }

    pub fn wait(&self) -> Wait {
        self.wait
    }

    pub fn locator(&self) -> Option<&Locator> {
        match &self.source {
            ElementSource::Located(locator) => Some(locator),
            ElementSource::Cached(_) => None,
        }
    }

    /// Human readable origin, used in log lines and errors
    pub fn describe(&self) -> String {
        match &self.source {
            ElementSource::Located(locator) => locator.to_string(),
            ElementSource::Cached(handle) => format!("element {}", handle.id()),
        }
    }

    /// The cached handle, or the first node matched once present
    pub async fn resolve(&self) -> Result<Arc<dyn ElementRef>> {
        match &self.source {
            ElementSource::Cached(handle) => Ok(Arc::clone(handle)),
            ElementSource::Located(locator) => self.wait.for_present(self.page.as_ref(), locator).await,
        }
    }

    /// First node matched by `inner` under this element, once present
    pub async fn resolve_within(&self, inner: &Locator) -> Result<Arc<dyn ElementRef>> {
        let scope = self.resolve().await?;
        let page = self.page.as_ref();
        self.wait
            .until(&format!("presence of {} within {}", inner, self.describe()), || {
                let scope = Arc::clone(&scope);
                async move { Ok(inner.find_all_from(page, Some(scope)).await?.into_iter().next()) }
            })
            .await
    }

    /// Visible within the bound. Absence and timeout read as `false`.
    pub async fn is_visible(&self) -> Result<bool> {
        let outcome = match &self.source {
            ElementSource::Located(locator) => self
                .wait
                .for_visible(self.page.as_ref(), locator)
                .await
                .map(|_| ()),
            ElementSource::Cached(handle) => {
                self.wait
                    .until_strict(&format!("visibility of {}", self.describe()), || async move {
                        Ok(handle.is_displayed().await?.then_some(()))
                    })
                    .await
            }
        };

        match outcome {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found_or_timeout() => {
                debug!("{} is not visible: {}", self.describe(), e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.resolve().await?.is_enabled().await
    }

    /// Native click once the element is displayed and enabled.
    ///
    /// An obstructed target fails with `Error::ClickIntercepted`; there is no retry.
    pub async fn click(&self) -> Result<()> {
        let handle = match &self.source {
            ElementSource::Located(locator) => {
                self.wait.for_clickable(self.page.as_ref(), locator).await?
            }
            ElementSource::Cached(handle) => {
                self.wait
                    .until_strict(&format!("clickability of {}", self.describe()), || {
                        let handle = Arc::clone(handle);
                        async move {
                            let ready = conditions::is_clickable(handle.as_ref()).await?;
                            Ok(ready.then_some(handle))
                        }
                    })
                    .await?
            }
        };

        debug!("click {}", self.describe());
        handle.click().await
    }

    /// Script click on the resolved node, bypassing interactability checks
    pub async fn js_click(&self) -> Result<()> {
        let handle = self.resolve().await?;
        debug!("js click {}", self.describe());
        handle.js_click().await
    }

    pub async fn text(&self) -> Result<String> {
        self.resolve().await?.text().await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.resolve().await?.attribute(name).await
    }

    pub async fn property(&self, name: &str) -> Result<Option<String>> {
        self.resolve().await?.property(name).await
    }

    /// Scroll to the centre of the viewport
    pub async fn scroll_into_view(&self) -> Result<()> {
        self.resolve().await?.scroll_into_view().await
    }

    /// Type `text` into the element, paced when a typing delay is set
    pub async fn send_keys(&self, text: &str) -> Result<()> {
        let handle = self.resolve().await?;
        debug!("send {} chars to {}", text.chars().count(), self.describe());

        let Some((min, max)) = self.typing_delay else {
            return handle.type_text(text).await;
        };

        // Delays are drawn up front; the thread-local RNG must not live across an await.
        let delays = keystroke_delays(text.chars().count(), min, max);
        for (ch, delay) in text.chars().zip(delays) {
            let mut buf = [0u8; 4];
            handle.type_text(ch.encode_utf8(&mut buf)).await?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn keystroke_delays(count: usize, min: Duration, max: Duration) -> Vec<Duration> {
    let mut rng = rand::thread_rng();
    let max = max.max(min);
    (0..count).map(|_| rng.gen_range(min..=max)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::By;
    use crate::session::mock::{MockNode, MockPage};
    use crate::Error;

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(150), Duration::from_millis(10))
    }

    fn page_with(node: MockNode) -> (MockPage, Arc<dyn PageContext>) {
        let page = MockPage::new("https://www.reddit.com/");
        page.root().child(node);
        let shared: Arc<dyn PageContext> = Arc::new(page.clone());
        (page, shared)
    }

    #[tokio::test]
    async fn test_resolve_times_out_with_locator_in_message() {
        let page: Arc<dyn PageContext> = Arc::new(MockPage::new("https://www.reddit.com/"));
        let element = Element::located(page, Locator::css("button.login"), quick());

        match element.resolve().await {
            Err(Error::Timeout(msg)) => assert!(msg.contains("button.login")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_located_element_re_resolves() {
        let first = MockNode::new("shreddit-post").attr("id", "t3_a");
        let (mock, page) = page_with(first.clone());
        let element = Element::located(page, By::tag_name("shreddit-post"), quick());

        assert_eq!(element.attribute("id").await.unwrap().as_deref(), Some("t3_a"));

        first.detach();
        mock.root().child(MockNode::new("shreddit-post").attr("id", "t3_b"));
        assert_eq!(element.attribute("id").await.unwrap().as_deref(), Some("t3_b"));
    }

    #[tokio::test]
    async fn test_cached_element_goes_stale() {
        let node = MockNode::new("shreddit-post");
        let (_mock, page) = page_with(node.clone());
        let element = Element::find(page, By::tag_name("shreddit-post"), quick()).await.unwrap();
        assert!(matches!(element.source(), ElementSource::Cached(_)));

        node.detach();
        assert!(matches!(element.text().await, Err(Error::StaleElement(_))));
        assert!(matches!(element.is_visible().await, Err(Error::StaleElement(_))));
        assert!(matches!(element.click().await, Err(Error::StaleElement(_))));
    }

    #[tokio::test]
    async fn test_is_visible_downgrades_absence() {
        let hidden = MockNode::new("div").attr("slot-name", "SUCCESS").hidden();
        let (_mock, page) = page_with(hidden.clone());

        let absent = Element::located(Arc::clone(&page), Locator::css("#nothing"), quick());
        assert!(!absent.is_visible().await.unwrap());

        let plate = Element::located(page, By::tag_name("div"), quick());
        assert!(!plate.is_visible().await.unwrap());
        hidden.set_displayed(true);
        assert!(plate.is_visible().await.unwrap());
    }

    #[tokio::test]
    async fn test_click_waits_for_enabled() {
        let button = MockNode::new("button").disabled();
        let (_mock, page) = page_with(button.clone());
        let element = Element::located(page, By::tag_name("button"), quick());

        assert!(matches!(element.click().await, Err(Error::Timeout(_))));
        assert_eq!(button.clicks(), 0);

        button.set_enabled(true);
        element.click().await.unwrap();
        assert_eq!(button.clicks(), 1);
    }

    #[tokio::test]
    async fn test_intercepted_click_propagates_and_js_click_bypasses() {
        let button = MockNode::new("button").obstructed_by("div#cookie-banner");
        let (_mock, page) = page_with(button.clone());
        let element = Element::located(page, By::tag_name("button"), quick());

        assert!(matches!(element.click().await, Err(Error::ClickIntercepted(_))));
        element.js_click().await.unwrap();
        assert_eq!(button.js_clicks(), 1);
    }

    #[tokio::test]
    async fn test_send_keys_paced() {
        let input = MockNode::new("input");
        let (_mock, page) = page_with(input.clone());
        let element = Element::located(page, By::tag_name("input"), quick())
            .with_typing_delay(Some((Duration::from_millis(1), Duration::from_millis(2))));

        element.send_keys("lol").await.unwrap();
        assert_eq!(input.value(), "lol");
    }

    #[tokio::test]
    async fn test_resolve_within() {
        let comment = MockNode::new("shreddit-comment");
        comment.child(MockNode::new("p").text("lol"));
        let (_mock, page) = page_with(comment);

        let element = Element::located(page, By::tag_name("shreddit-comment"), quick());
        let paragraph = element.resolve_within(&Locator::new(By::tag_name("p"))).await.unwrap();
        assert_eq!(paragraph.text().await.unwrap(), "lol");
    }

    #[test]
    fn test_keystroke_delays_within_range() {
        let delays = keystroke_delays(50, Duration::from_millis(50), Duration::from_millis(150));
        assert_eq!(delays.len(), 50);
        assert!(delays
            .iter()
            .all(|d| *d >= Duration::from_millis(50) && *d <= Duration::from_millis(150)));
    }

    #[test]
    fn test_keystroke_delays_keep_full_precision() {
        let (min, max) = (Duration::from_micros(200), Duration::from_micros(800));
        let delays = keystroke_delays(50, min, max);
        assert!(delays.iter().all(|d| *d >= min && *d <= max));

        // Millisecond counts of this size do not fit in a u64
        let huge = Duration::from_secs(u64::MAX / 100);
        assert_eq!(keystroke_delays(3, huge, huge), vec![huge; 3]);

        let inverted = keystroke_delays(3, Duration::from_millis(90), Duration::from_millis(10));
        assert_eq!(inverted, vec![Duration::from_millis(90); 3]);
    }
}
