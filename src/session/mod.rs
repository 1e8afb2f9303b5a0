//! # Session layer
//!
//! Browser, page and element handles on top of the CDP layer.
//!
//! ## Core concepts
//! - **BrowserContext**: an attached browser that opens pages
//! - **PageContext**: one tab; navigation, document queries, cookies, screenshots
//! - **ElementRef**: a live handle to a DOM node or shadow root
//!
//! ## Module layout
//! - `traits`: the session traits and their option types
//! - `browser`: CDP-backed browser context
//! - `page`: CDP-backed page context
//! - `element`: CDP-backed element handle (a `Runtime` remote object)
//! - `mock`: in-memory DOM for tests
//!
//! ## Example
//! ```rust,no_run
//! use reddit_pom::cdp::CdpBrowserImpl;
//! use reddit_pom::session::{BrowserContext, BrowserContextImpl, BrowserOptions, NavigationOptions, PageOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BrowserOptions::default();
//! let browser = BrowserContextImpl::new(options.clone(), Arc::new(CdpBrowserImpl::new(options.cdp_endpoint)));
//!
//! let page = browser.create_page(PageOptions::default()).await?;
//! page.navigate("https://www.reddit.com", NavigationOptions::default()).await?;
//! println!("Page loaded: {}", page.current_url().await?);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod browser;
pub mod page;
pub mod element;
pub mod mock;


pub use traits::{
    BoundingBox, BrowserContext, BrowserOptions, Cookie, ElementRef, EvaluationResult,
    LoadState, NavigationOptions, PageContext, PageOptions,
};

pub use browser::BrowserContextImpl;
pub use element::ElementRefImpl;
pub use page::PageContextImpl;

pub use mock::{MockBrowser, MockElement, MockNode, MockPage};
