//! Browser context implementation
//!
//! Manages the attached browser and the pages opened in it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::cdp::traits::CdpBrowser;
use crate::session::page::PageContextImpl;
use crate::session::traits::{BrowserContext, BrowserOptions, PageContext, PageOptions};
use crate::Error;

/// Browser context implementation
#[derive(Debug)]
pub struct BrowserContextImpl {
    id: String,
    options: BrowserOptions,
    cdp_browser: Arc<dyn CdpBrowser>,
    pages: Arc<RwLock<HashMap<String, Arc<dyn PageContext>>>>,
    is_active: Arc<RwLock<bool>>,
}

impl BrowserContextImpl {
    /// Create a new browser context
    pub fn new(options: BrowserOptions, cdp_browser: Arc<dyn CdpBrowser>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            options,
            cdp_browser,
            pages: Arc::new(RwLock::new(HashMap::new())),
            is_active: Arc::new(RwLock::new(true)),
        }
    }

    /// Get browser options
    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Number of pages opened and not yet closed with the browser
    pub fn page_count(&self) -> usize {
        self.pages.read().map(|pages| pages.len()).unwrap_or(0)
    }

    fn check_active(&self) -> Result<(), Error> {
        let active = *self
            .is_active
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;
        if active {
            Ok(())
        } else {
            Err(Error::browser_not_found(&self.id))
        }
    }
}

#[async_trait]
impl BrowserContext for BrowserContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, Error> {
        self.check_active()?;

        let default_url = options.default_url.as_deref().unwrap_or("about:blank");

        let ws_url = self.cdp_browser.create_target(default_url).await?;
        let cdp_client = self.cdp_browser.create_client(&ws_url).await?;

        // Must precede any navigation so the first request already carries it
        if let Some(user_agent) = self.options.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            cdp_client
                .call_method(
                    "Network.setUserAgentOverride",
                    serde_json::json!({ "userAgent": user_agent }),
                )
                .await?;
            tracing::debug!("User-Agent set at page creation: {}", user_agent);
        }

        let target_id = ws_url.rsplit('/').next().unwrap_or("unknown").to_string();

        let page: Arc<dyn PageContext> =
            Arc::new(PageContextImpl::new(self.id.clone(), options, cdp_client));

        self.pages
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .insert(target_id, Arc::clone(&page));

        tracing::info!("BrowserContext: page {} created in browser {}", page.id(), self.id);
        Ok(page)
    }

    async fn close(&self) -> Result<(), Error> {
        // Collect first so no lock is held across await
        let pages_to_close: Vec<Arc<dyn PageContext>> = self
            .pages
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .drain()
            .map(|(_, page)| page)
            .collect();

        for page in pages_to_close {
            if let Err(e) = page.close().await {
                tracing::warn!("BrowserContext::close: page {} failed to close: {}", page.id(), e);
            }
        }

        self.cdp_browser.close().await?;

        *self
            .is_active
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))? = false;

        tracing::info!("BrowserContext: browser {} closed", self.id);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active
            .read()
            .map(|active| *active)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::mock::MockCdpBrowser;

    fn browser() -> BrowserContextImpl {
        BrowserContextImpl::new(BrowserOptions::default(), Arc::new(MockCdpBrowser::new()))
    }

    #[tokio::test]
    async fn test_browser_creation() {
        let browser = browser();

        assert!(browser.is_active());
        assert!(!browser.id().is_empty());
        assert_eq!(browser.options().cdp_endpoint, "ws://localhost:9222");
    }

    #[tokio::test]
    async fn test_browser_create_page() {
        let browser = browser();

        let page = browser.create_page(PageOptions::default()).await.unwrap();

        assert_eq!(page.browser_id(), browser.id());
        assert!(page.is_active());
        assert_eq!(browser.page_count(), 1);
    }

    #[tokio::test]
    async fn test_browser_close() {
        let browser = browser();
        let page = browser.create_page(PageOptions::default()).await.unwrap();

        browser.close().await.unwrap();
        assert!(!browser.is_active());
        assert!(!page.is_active());
        assert_eq!(browser.page_count(), 0);

        let result = browser.create_page(PageOptions::default()).await;
        assert!(matches!(result, Err(Error::BrowserNotFound(_))));
    }
}
