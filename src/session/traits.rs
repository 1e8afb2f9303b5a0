//! Session traits
//!
//! This module defines the abstract interfaces for browser, page, and element sessions.
//! The CDP-backed implementations live next door; `session::mock` provides an in-memory DOM.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::locator::By;

pub use crate::cdp::traits::EvaluationResult;

/// Options for attaching to a browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// CDP endpoint (e.g., "ws://localhost:9222")
    pub cdp_endpoint: String,
    /// User agent override applied to every new page
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            cdp_endpoint: "ws://localhost:9222".to_string(),
            user_agent: None,
        }
    }
}

/// Page options for creating a new page
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Default URL
    pub default_url: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Device scale factor
    pub device_scale_factor: f64,
    /// Mobile emulation
    pub is_mobile: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            default_url: Some("about:blank".to_string()),
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 1.0,
            is_mobile: false,
        }
    }
}

/// Navigation options
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Bound for the new document to reach `wait_until`
    pub timeout: Duration,
    /// Sleep between readiness checks
    pub poll_interval: Duration,
    /// Wait until condition
    pub wait_until: LoadState,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            wait_until: LoadState::Load,
        }
    }
}

/// Page load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// `document.readyState == "complete"`
    Load,
    /// `document.readyState` is `"interactive"` or `"complete"`
    DOMContentLoaded,
}

impl LoadState {
    /// Whether a `document.readyState` value satisfies this state
    pub fn is_reached(&self, ready_state: &str) -> bool {
        match self {
            LoadState::Load => ready_state == "complete",
            LoadState::DOMContentLoaded => ready_state == "interactive" || ready_state == "complete",
        }
    }
}

/// Browser cookie, shared by the CDP `Network` domain and the cookie files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "Cookie::default_path")]
    pub path: String,
    /// Seconds since the epoch; negative for session cookies
    #[serde(default = "Cookie::session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl Cookie {
    /// Session cookie for `domain` at path `/`
    pub fn new<N: Into<String>, V: Into<String>, D: Into<String>>(name: N, value: V, domain: D) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: Self::default_path(),
            expires: Self::session_expiry(),
            http_only: false,
            secure: false,
            same_site: None,
        }
    }

    fn default_path() -> String {
        "/".to_string()
    }

    fn session_expiry() -> f64 {
        -1.0
    }

    pub fn is_session(&self) -> bool {
        self.expires < 0.0
    }
}

/// Browser context trait
///
/// Represents an attached browser instance.
#[async_trait]
pub trait BrowserContext: Send + Sync + std::fmt::Debug {
    /// Get browser ID
    fn id(&self) -> &str;

    /// Create a new page
    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, crate::Error>;

    /// Close every page and the browser connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if browser is active
    fn is_active(&self) -> bool;
}

/// Page context trait
///
/// Represents a page/tab in a browser.
#[async_trait]
pub trait PageContext: Send + Sync + std::fmt::Debug {
    /// Get page ID
    fn id(&self) -> &str;

    /// Get parent browser ID
    fn browser_id(&self) -> &str;

    /// Navigate and wait for the new document to reach `options.wait_until`
    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<(), crate::Error>;

    /// Reload and wait for the new document
    async fn reload(&self, options: NavigationOptions) -> Result<(), crate::Error>;

    /// Current `window.location.href`
    async fn current_url(&self) -> Result<String, crate::Error>;

    /// Current `document.title`
    async fn title(&self) -> Result<String, crate::Error>;

    /// Evaluate JavaScript
    async fn evaluate(&self, script: &str) -> Result<EvaluationResult, crate::Error>;

    /// Every element in the document matching `by`
    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, crate::Error>;

    /// Cookies visible to the current page
    async fn get_cookies(&self) -> Result<Vec<Cookie>, crate::Error>;

    /// Attach a cookie
    async fn set_cookie(&self, cookie: &Cookie) -> Result<(), crate::Error>;

    /// Capture a PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>, crate::Error>;

    /// Set viewport size
    async fn set_viewport(&self, width: u32, height: u32, device_scale_factor: f64) -> Result<(), crate::Error>;

    /// Close the page
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if page is active
    fn is_active(&self) -> bool;
}

/// Element reference trait
///
/// A live handle to one DOM node or shadow root. Once the node leaves the document every
/// call fails with `Error::StaleElement`.
#[async_trait]
pub trait ElementRef: Send + Sync + std::fmt::Debug {
    /// Get element ID
    fn id(&self) -> &str;

    /// Get parent page ID
    fn page_id(&self) -> &str;

    /// Descendants matching `by`, not crossing shadow boundaries
    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, crate::Error>;

    /// Open shadow root, if the node hosts one
    async fn shadow_root(&self) -> Result<Option<Arc<dyn ElementRef>>, crate::Error>;

    /// Rendered text
    async fn text(&self) -> Result<String, crate::Error>;

    /// Get element attribute
    async fn attribute(&self, name: &str) -> Result<Option<String>, crate::Error>;

    /// DOM property, stringified (`href` resolves to an absolute URL)
    async fn property(&self, name: &str) -> Result<Option<String>, crate::Error>;

    /// Native click at the element centre
    async fn click(&self) -> Result<(), crate::Error>;

    /// Script click, bypassing interactability checks
    async fn js_click(&self) -> Result<(), crate::Error>;

    /// Focus element and type text
    async fn type_text(&self, text: &str) -> Result<(), crate::Error>;

    /// Scroll element to the centre of the viewport
    async fn scroll_into_view(&self) -> Result<(), crate::Error>;

    /// Check if element is rendered and visible
    async fn is_displayed(&self) -> Result<bool, crate::Error>;

    /// Check if element is enabled
    async fn is_enabled(&self) -> Result<bool, crate::Error>;

    /// Get element bounding box
    async fn bounding_box(&self) -> Result<BoundingBox, crate::Error>;

    /// Call `function_declaration` with `this` bound to the element
    async fn run_script(&self, function_declaration: &str) -> Result<EvaluationResult, crate::Error>;
}

/// Element bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
