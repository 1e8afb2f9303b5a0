//! Page context implementation
//!
//! Manages page lifecycle and operations.
//!
//! Navigation readiness: before navigating, a marker is planted on `window`. The new
//! document is ready once the marker is gone and `document.readyState` reaches the
//! requested load state. This avoids reading the old document's `complete` state right
//! after `Page.navigate` returns.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::cdp::traits::{CdpClient, ScreenshotFormat};
use crate::locator::By;
use crate::session::element::collect_elements;
use crate::session::traits::{
    Cookie, ElementRef, EvaluationResult, NavigationOptions, PageContext, PageOptions,
};
use crate::wait::Wait;
use crate::Error;

/// Page context implementation
#[derive(Debug)]
pub struct PageContextImpl {
    id: String,
    browser_id: String,
    options: PageOptions,
    cdp_client: Arc<dyn CdpClient>,
    is_active: Arc<tokio::sync::RwLock<bool>>,
}

impl PageContextImpl {
    /// Create a new page context
    pub fn new(browser_id: String, options: PageOptions, cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            browser_id,
            options,
            cdp_client,
            is_active: Arc::new(tokio::sync::RwLock::new(true)),
        }
    }

    /// Get the CDP client for this page
    pub fn cdp_client(&self) -> Arc<dyn CdpClient> {
        Arc::clone(&self.cdp_client)
    }

    async fn ensure_active(&self) -> Result<(), Error> {
        if *self.is_active.read().await {
            Ok(())
        } else {
            Err(Error::page_not_found(&self.id))
        }
    }

    async fn evaluate_string(&self, script: &str) -> Result<String, Error> {
        match self.cdp_client.evaluate(script, false).await? {
            EvaluationResult::String(s) => Ok(s),
            EvaluationResult::Null => Ok(String::new()),
            other => Err(Error::script_execution_failed(format!(
                "{} returned {:?}",
                script, other
            ))),
        }
    }

    /// Tag the current document so its replacement can be told apart
    async fn plant_marker(&self) -> Result<String, Error> {
        let marker = Uuid::new_v4().to_string();
        self.cdp_client
            .evaluate(&format!("window.__pomDocMarker = {}", json!(marker)), false)
            .await?;
        Ok(marker)
    }

    /// Poll until the document is new (when `marker` is set) and has reached the load state
    async fn wait_for_document(&self, marker: Option<&str>, options: &NavigationOptions) -> Result<(), Error> {
        let script = match marker {
            Some(marker) => format!(
                "window.__pomDocMarker === {} ? 'previous' : document.readyState",
                json!(marker)
            ),
            None => "document.readyState".to_string(),
        };
        let wait = Wait::new(options.timeout, options.poll_interval);
        let wait_until = options.wait_until;

        wait.until(&format!("document to reach {:?}", wait_until), || {
            let script = script.as_str();
            async move {
                match self.cdp_client.evaluate(script, false).await {
                    Ok(EvaluationResult::String(state)) => Ok(wait_until.is_reached(&state).then_some(())),
                    Ok(_) => Ok(None),
                    // The execution context is torn down while the old document unloads.
                    Err(Error::ScriptExecutionFailed(msg))
                    | Err(Error::StaleElement(msg))
                    | Err(Error::Cdp(msg)) => {
                        tracing::debug!("PageContext: readiness check failed mid-navigation: {}", msg);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl PageContext for PageContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn browser_id(&self) -> &str {
        &self.browser_id
    }

    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active().await?;
        tracing::info!("PageContext::navigate: {}", url);

        // A redirect already in flight can tear the context down under the marker.
        let marker = match self.plant_marker().await {
            Ok(marker) => Some(marker),
            Err(Error::StaleElement(msg)) => {
                tracing::debug!("PageContext::navigate: no marker, document is unloading: {}", msg);
                None
            }
            Err(e) => return Err(e),
        };
        let nav_result = self.cdp_client.navigate(url).await?;

        // Same-document navigations (fragment changes) report no loader and keep the marker.
        let marker = nav_result.loader_id.as_ref().and(marker.as_deref());
        self.wait_for_document(marker, &options).await
    }

    async fn reload(&self, options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active().await?;
        tracing::debug!("PageContext::reload: page {}", self.id);

        let marker = self.plant_marker().await?;
        self.cdp_client.reload(false).await?;
        self.wait_for_document(Some(&marker), &options).await
    }

    async fn current_url(&self) -> Result<String, Error> {
        self.ensure_active().await?;
        self.evaluate_string("window.location.href").await
    }

    async fn title(&self) -> Result<String, Error> {
        self.ensure_active().await?;
        self.evaluate_string("document.title").await
    }

    async fn evaluate(&self, script: &str) -> Result<EvaluationResult, Error> {
        self.ensure_active().await?;

        let result = self.cdp_client.evaluate(script, true).await?;
        tracing::debug!("PageContext::evaluate: CDP returned {:?}", result);
        Ok(result)
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        self.ensure_active().await?;

        let script = format!("(() => {{ const root = document; return {}; }})()", by.query_expression());
        let array = self.cdp_client.evaluate_handle(&script).await?;
        collect_elements(&self.cdp_client, &self.id, array).await
    }

    async fn get_cookies(&self) -> Result<Vec<Cookie>, Error> {
        self.ensure_active().await?;

        let result = self.cdp_client.call_method("Network.getCookies", json!({})).await?;
        let cookies = result.get("cookies").cloned().unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(cookies)?)
    }

    async fn set_cookie(&self, cookie: &Cookie) -> Result<(), Error> {
        self.ensure_active().await?;

        let mut params = json!({
            "name": cookie.name,
            "value": cookie.value,
            "domain": cookie.domain,
            "path": cookie.path,
            "secure": cookie.secure,
            "httpOnly": cookie.http_only,
        });
        if !cookie.is_session() {
            params["expires"] = json!(cookie.expires);
        }
        if let Some(same_site) = &cookie.same_site {
            params["sameSite"] = json!(same_site);
        }

        let result = self.cdp_client.call_method("Network.setCookie", params).await?;
        if result.get("success").and_then(|v| v.as_bool()) == Some(false) {
            return Err(Error::cdp(format!("Browser rejected cookie {}", cookie.name)));
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, Error> {
        self.ensure_active().await?;
        self.cdp_client.screenshot(ScreenshotFormat::Png).await
    }

    async fn set_viewport(&self, width: u32, height: u32, device_scale_factor: f64) -> Result<(), Error> {
        self.ensure_active().await?;

        self.cdp_client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": device_scale_factor,
                    "mobile": self.options.is_mobile,
                }),
            )
            .await?;

        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        tracing::info!("PageContext::close: Closing page {}", self.id);

        if !*self.is_active.read().await {
            tracing::warn!("PageContext::close: Page {} is already inactive", self.id);
            return Ok(());
        }

        if let Err(e) = self.cdp_client.call_method("Page.close", json!({})).await {
            tracing::warn!("PageContext::close: Page.close failed for page {}: {}", self.id, e);
        }

        // Inactive regardless of the CDP result
        *self.is_active.write().await = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        // Use try_read to avoid blocking in sync context
        self.is_active
            .try_read()
            .ok()
            .map(|active| *active)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::mock::MockCdpClient;
    use crate::cdp::traits::{CdpConnection, NavigationResult};
    use crate::cdp::types::{CallArgument, PropertyDescriptor, RemoteObject};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Client whose first URL read lands while a login redirect swaps the document
    #[derive(Debug)]
    struct RedirectingClient {
        inner: MockCdpClient,
        redirect_to: String,
        redirected: AtomicBool,
    }

    impl RedirectingClient {
        fn new(redirect_to: &str) -> Self {
            Self {
                inner: MockCdpClient::new(),
                redirect_to: redirect_to.to_string(),
                redirected: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CdpClient for RedirectingClient {
        fn connection(&self) -> Arc<dyn CdpConnection> {
            self.inner.connection()
        }

        async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
            self.inner.navigate(url).await
        }

        async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
            if script.contains("location.href") && !self.redirected.swap(true, Ordering::SeqCst) {
                self.inner.navigate(&self.redirect_to).await?;
                return Err(Error::cdp(
                    "Runtime.evaluate: Execution context was destroyed. (code: -32000)",
                ));
            }
            self.inner.evaluate(script, await_promise).await
        }

        async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, Error> {
            self.inner.evaluate_handle(script).await
        }

        async fn call_function_on(
            &self,
            object_id: &str,
            function_declaration: &str,
            arguments: Vec<CallArgument>,
            return_by_value: bool,
        ) -> Result<RemoteObject, Error> {
            self.inner
                .call_function_on(object_id, function_declaration, arguments, return_by_value)
                .await
        }

        async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
            self.inner.get_properties(object_id).await
        }

        async fn screenshot(&self, format: ScreenshotFormat) -> Result<Vec<u8>, Error> {
            self.inner.screenshot(format).await
        }

        async fn reload(&self, ignore_cache: bool) -> Result<(), Error> {
            self.inner.reload(ignore_cache).await
        }

        async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
            self.inner.enable_domain(domain).await
        }

        async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
            self.inner.call_method(method, params).await
        }
    }

    fn page_on(client: &Arc<MockCdpClient>) -> PageContextImpl {
        PageContextImpl::new(
            "test-browser".to_string(),
            PageOptions::default(),
            Arc::clone(client) as Arc<dyn CdpClient>,
        )
    }

    fn quick() -> NavigationOptions {
        NavigationOptions {
            timeout: Duration::from_millis(300),
            poll_interval: Duration::from_millis(10),
            ..NavigationOptions::default()
        }
    }

    #[tokio::test]
    async fn test_page_creation() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        assert!(page.is_active());
        assert_eq!(page.browser_id(), "test-browser");
    }

    #[tokio::test]
    async fn test_page_navigate() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        page.navigate("https://www.reddit.com/", quick()).await.unwrap();

        assert_eq!(page.current_url().await.unwrap(), "https://www.reddit.com/");
        assert_eq!(
            client.mock_connection().sent_params("Page.navigate")[0]["url"],
            "https://www.reddit.com/"
        );
    }

    #[tokio::test]
    async fn test_page_reload_waits_for_document() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        page.reload(quick()).await.unwrap();
        assert_eq!(client.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_page_title() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);
        assert_eq!(page.title().await.unwrap(), "Mock Page");
    }

    #[tokio::test]
    async fn test_cookie_round_trip_through_network_domain() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        let mut cookie = Cookie::new("token_v2", "secret", ".reddit.com");
        cookie.http_only = true;
        page.set_cookie(&cookie).await.unwrap();

        let cookies = page.get_cookies().await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "token_v2");
        assert!(cookies[0].http_only);
    }

    #[tokio::test]
    async fn test_page_screenshot_is_png() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        let png = page.screenshot().await.unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_set_viewport() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        page.set_viewport(1280, 720, 1.0).await.unwrap();
        let sent = client
            .mock_connection()
            .sent_params("Emulation.setDeviceMetricsOverride");
        assert_eq!(sent[0]["width"], 1280);
        assert_eq!(sent[0]["mobile"], false);
    }

    #[tokio::test]
    async fn test_url_wait_survives_destroyed_execution_context() {
        let client = Arc::new(RedirectingClient::new("https://www.reddit.com/"));
        client.inner.navigate("https://www.reddit.com/login/").await.unwrap();
        let page = PageContextImpl::new(
            "test-browser".to_string(),
            PageOptions::default(),
            Arc::clone(&client) as Arc<dyn CdpClient>,
        );

        let wait = Wait::new(Duration::from_millis(500), Duration::from_millis(10));
        let url = wait
            .for_url(&page, "leaving the login page", |url| !url.contains("/login"))
            .await
            .unwrap();

        assert_eq!(url, "https://www.reddit.com/");
        assert!(client.redirected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_page_close() {
        let client = Arc::new(MockCdpClient::new());
        let page = page_on(&client);

        page.close().await.unwrap();
        assert!(!page.is_active());
        assert!(matches!(page.current_url().await, Err(Error::PageNotFound(_))));
    }
}
