use std::sync::Arc;
use std::time::Duration;

use super::{Clickable, Editable, Element, UiElement};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::Result;

/// Text field: clickable and editable
#[derive(Debug, Clone)]
pub struct Input {
    element: Element,
}

impl Input {
    pub fn of(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Self {
        Self {
            element: Element::located(page, locator, wait),
        }
    }

    pub async fn find(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Result<Self> {
        Ok(Self {
            element: Element::find(page, locator, wait).await?,
        })
    }

    pub fn from_handle(page: Arc<dyn PageContext>, handle: Arc<dyn ElementRef>, wait: Wait) -> Self {
        Self {
            element: Element::cached(page, handle, wait),
        }
    }

    /// Field located by one of its classes
    pub fn by_class(page: Arc<dyn PageContext>, class_name: &str, wait: Wait) -> Self {
        Self::of(page, By::class_name(class_name), wait)
    }

    /// Field living in the shadow tree of `host`
    pub fn from_shadow_host(page: Arc<dyn PageContext>, host: By, inner: By, wait: Wait) -> Self {
        Self::of(page, Locator::in_shadow_of(host, inner), wait)
    }

    /// Pace keystrokes with a random delay in `[min, max]`
    pub fn with_typing_delay(self, delay: Option<(Duration, Duration)>) -> Self {
        Self {
            element: self.element.with_typing_delay(delay),
        }
    }

    /// Current `value` property
    pub async fn value(&self) -> Result<String> {
        Ok(self.element.property("value").await?.unwrap_or_default())
    }
}

impl UiElement for Input {
    fn element(&self) -> &Element {
        &self.element
    }
}

impl Clickable for Input {}

impl Editable for Input {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{MockNode, MockPage};

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(150), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_shadow_input_receives_keys() {
        let mock = MockPage::new("https://www.reddit.com/login/");
        let host = MockNode::new("faceplate-text-input").matches(By::css("faceplate-text-input#login-username"));
        let field = MockNode::new("input").matches(By::css("input[name='username']"));
        host.shadow_child(field.clone());
        mock.root().child(host);

        let page: Arc<dyn PageContext> = Arc::new(mock);
        let input = Input::from_shadow_host(
            page,
            By::css("faceplate-text-input#login-username"),
            By::css("input[name='username']"),
            quick(),
        );

        input.send_keys("someone").await.unwrap();
        assert_eq!(field.value(), "someone");
        assert_eq!(input.value().await.unwrap(), "someone");
    }

    #[tokio::test]
    async fn test_by_class() {
        let mock = MockPage::new("https://www.reddit.com/");
        mock.root().child(MockNode::new("input").attr("class", "search-input large"));

        let page: Arc<dyn PageContext> = Arc::new(mock);
        let input = Input::by_class(page, "search-input", quick());
        assert!(input.is_visible().await.unwrap());
    }
}
