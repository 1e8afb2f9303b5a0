use std::sync::Arc;

use super::{Clickable, Element, UiElement};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::Result;

/// Anchor element
#[derive(Debug, Clone)]
pub struct Link {
    element: Element,
}

impl Link {
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

    /// Anchor whose visible text is exactly `text`
    pub fn by_text(page: Arc<dyn PageContext>, text: &str, wait: Wait) -> Self {
        Self::of(page, By::link_text(text), wait)
    }

    pub fn from_shadow_host(page: Arc<dyn PageContext>, host: By, inner: By, wait: Wait) -> Self {
        Self::of(page, Locator::in_shadow_of(host, inner), wait)
    }

    /// Resolved `href` property (absolute URL), empty when missing
    pub async fn href(&self) -> Result<String> {
        Ok(self.element.property("href").await?.unwrap_or_default())
    }

    /// `href` equals `url`, ignoring case
    pub async fn points_to(&self, url: &str) -> Result<bool> {
        Ok(self.href().await?.eq_ignore_ascii_case(url))
    }
}

impl UiElement for Link {
    fn element(&self) -> &Element {
        &self.element
    }
}

impl Clickable for Link {}
