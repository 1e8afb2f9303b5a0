//! # Element wrappers
//!
//! Typed wrappers over [`Element`]. Capabilities are traits with default methods, so a
//! variant opts in by implementing the trait and nothing else:
//!
//! | Variant | `UiElement` | `Clickable` | `Editable` |
//! |---|---|---|---|
//! | [`Button`] | yes | yes | |
//! | [`Input`] | yes | yes | yes |
//! | [`Link`] | yes | yes | |
//! | [`Comment`] | yes | | |

pub mod base;
pub mod button;
pub mod comment;
pub mod input;
pub mod link;

use async_trait::async_trait;
use std::sync::Arc;

use crate::session::ElementRef;
use crate::Result;

pub use base::{Element, ElementSource};
pub use button::Button;
pub use comment::Comment;
pub use input::Input;
pub use link::Link;

/// Locate and read state
#[async_trait]
pub trait UiElement: Send + Sync {
    /// The wrapped element
    fn element(&self) -> &Element;

    async fn resolve(&self) -> Result<Arc<dyn ElementRef>> {
        self.element().resolve().await
    }

    /// `Ok(false)` when absent or not displayed within the bound
    async fn is_visible(&self) -> Result<bool> {
        self.element().is_visible().await
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.element().is_enabled().await
    }

    async fn text(&self) -> Result<String> {
        self.element().text().await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.element().attribute(name).await
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.element().scroll_into_view().await
    }
}

/// Interact by clicking
#[async_trait]
pub trait Clickable: UiElement {
    /// Native click once displayed and enabled
    async fn click(&self) -> Result<()> {
        self.element().click().await
    }

    /// Script click, for targets a native click cannot reach
    async fn js_click(&self) -> Result<()> {
        self.element().js_click().await
    }
}

/// Interact by typing
#[async_trait]
pub trait Editable: UiElement {
    async fn send_keys(&self, text: &str) -> Result<()> {
        self.element().send_keys(text).await
    }
}
