//! CDP browser control implementation
//!
//! Talks to the browser's HTTP debugging endpoints and opens per-target WebSocket clients.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// Shared HTTP client for the /json endpoints
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: tokio::sync::Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// HTTP base URL derived from the WebSocket endpoint
    fn http_endpoint(&self) -> String {
        self.endpoint
            .trim_end_matches('/')
            .replace("ws://", "http://")
            .replace("wss://", "https://")
    }

    fn target_id_of(target_url: &str) -> String {
        target_url.rsplit('/').next().unwrap_or("unknown").to_string()
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        self.connections.lock().await.insert(
            Self::target_id_of(target_url),
            Arc::clone(&connection) as Arc<dyn CdpConnection>,
        );

        let client = Arc::new(CdpClientImpl::new(connection));

        // Runtime for element handles, Network for cookies
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;
        client.enable_domain("Network").await?;

        Ok(client)
    }

    async fn close(&self) -> Result<(), Error> {
        let drained: Vec<(String, Arc<dyn CdpConnection>)> =
            self.connections.lock().await.drain().collect();

        if drained.is_empty() {
            debug!("CdpBrowser::close: No active connections to close");
            return Ok(());
        }

        info!("CdpBrowser::close: Closing {} CDP connections", drained.len());

        for (target_id, connection) in drained {
            if let Err(e) = connection.close().await {
                warn!("CdpBrowser::close: Failed to close connection to {}: {}", target_id, e);
            }
        }

        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let version_json: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::browser_not_found(format!("{}: {}", self.endpoint, e)))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse version: {}", e)))?;

        let field = |name: &str| {
            version_json
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };

        Ok(BrowserVersion {
            protocol_version: field("Protocol-Version"),
            product: field("Browser"),
            user_agent: field("User-Agent"),
            js_version: field("V8-Version"),
        })
    }

    /// Create a new page via the `/json/new` endpoint, which answers with the target's
    /// WebSocket URL directly.
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        debug!("Creating new page via HTTP API: {}", new_url);

        let response = self.http.put(&new_url).send().await.map_err(|e| {
            Error::browser_not_found(format!(
                "no browser at {} ({}); start Chrome with --remote-debugging-port=9222",
                self.endpoint, e
            ))
        })?;

        let response_text = response
            .text()
            .await
            .map_err(|e| Error::internal(format!("Failed to read response: {}", e)))?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::internal(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::internal("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created new target with WebSocket URL: {}", ws_url);
        Ok(ws_url.to_string())
    }
}
