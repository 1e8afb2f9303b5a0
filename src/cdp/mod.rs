//! # Chrome DevTools Protocol (CDP) layer
//!
//! WebSocket JSON-RPC plumbing between the harness and a running Chrome.
//!
//! - `traits`: connection, client and browser interfaces
//! - `types`: wire structures for the domains the harness uses
//! - `connection`: WebSocket connection with request/response routing
//! - `client`: typed client (navigation, evaluation, object handles, screenshots)
//! - `browser`: `/json/*` HTTP endpoints and per-target clients
//! - `mock`: canned implementations for tests
//!
//! ```rust,no_run
//! use reddit_pom::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let ws_url = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&ws_url).await?;
//! client.navigate("https://www.reddit.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;


pub use traits::{
    BrowserVersion, CdpBrowser, CdpClient, CdpConnection, CdpError, CdpResponse,
    EvaluationResult, NavigationResult, ScreenshotFormat,
};

pub use browser::CdpBrowserImpl;
pub use client::CdpClientImpl;
pub use connection::CdpWebSocketConnection;

pub use mock::{MockCdpBrowser, MockCdpClient, MockCdpConnection};
