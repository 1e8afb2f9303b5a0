use std::sync::Arc;

use super::{Clickable, Element, UiElement};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::Result;

/// Clickable element
#[derive(Debug, Clone)]
pub struct Button {
    element: Element,
}

impl Button {
    /// Lazily located button
    pub fn of(page: Arc<dyn PageContext>, locator: impl Into<Locator>, wait: Wait) -> Self {
        Self {
            element: Element::located(page, locator, wait),
        }
    }

    /// Button resolved now
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

    /// `<button>` whose normalised text equals `text`
    pub fn by_text(page: Arc<dyn PageContext>, text: &str, wait: Wait) -> Self {
        let xpath = format!("//button[normalize-space()='{}']", text);
        Self::of(page, By::xpath(xpath), wait)
    }

    /// Button living in the shadow tree of `host`
    pub fn from_shadow_host(page: Arc<dyn PageContext>, host: By, inner: By, wait: Wait) -> Self {
        Self::of(page, Locator::in_shadow_of(host, inner), wait)
    }
}

impl UiElement for Button {
    fn element(&self) -> &Element {
        &self.element
    }
}

impl Clickable for Button {}
