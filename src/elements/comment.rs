use async_trait::async_trait;
use std::sync::Arc;

use super::{Element, UiElement};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::Result;

/// Paragraph holding the rendered comment body
pub const COMMENT_BODY: &str = "div[id$='-post-rtjson-content'] p";

/// A `shreddit-comment` node
#[derive(Debug, Clone)]
pub struct Comment {
    element: Element,
}

impl Comment {
    pub fn from_locator(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Self {
        Self {
            element: Element::located(page, locator, wait),
        }
    }

    pub fn from_handle(page: Arc<dyn PageContext>, handle: Arc<dyn ElementRef>, wait: Wait) -> Self {
        Self {
            element: Element::cached(page, handle, wait),
        }
    }

    /// Comment written by `author`
    pub fn by_author(page: Arc<dyn PageContext>, author: &str, wait: Wait) -> Self {
        Self::from_locator(page, By::css(format!("shreddit-comment[author='{}']", author)), wait)
    }

    /// `author` attribute
    pub async fn author(&self) -> Result<Option<String>> {
        self.element.attribute("author").await
    }
}

#[async_trait]
impl UiElement for Comment {
    fn element(&self) -> &Element {
        &self.element
    }

    /// Body text, not the whole node (which also renders author and metadata)
    async fn text(&self) -> Result<String> {
        let body = self
            .element
            .resolve_within(&Locator::css(COMMENT_BODY))
            .await?;
        Ok(body.text().await?.trim().to_string())
    }
}
