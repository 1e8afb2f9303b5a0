//! Mock CDP implementation for testing
//!
//! `MockCdpConnection` answers commands from a table of canned results and records what
//! was sent. `MockCdpClient` keeps just enough page state (URL, cookies, reload count)
//! for the CDP-backed session types to be exercised without a browser.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cdp::traits::*;
use crate::cdp::types::{
    CallArgument, EvaluateResponse, GetPropertiesResponse, PropertyDescriptor, RemoteObject,
};
use crate::Error;

/// 1x1 PNG returned by mock screenshots
const PIXEL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: AtomicBool,
    next_id: AtomicU64,
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, String>>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Answer every later `method` command with `result`
    pub fn respond_with(&self, method: &str, result: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(method.to_string(), result);
        }
    }

    /// Fail the next `method` command with a protocol error carrying `message`
    pub fn fail_next(&self, method: &str, message: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(method.to_string(), message.to_string());
        }
    }

    /// Methods sent so far, in order
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Parameters of every `method` command sent so far
    pub fn sent_params(&self, method: &str) -> Vec<Value> {
        self.sent
            .lock()
            .map(|sent| {
                sent.iter()
                    .filter(|(m, _)| m == method)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut sent) = self.sent.lock() {
            sent.push((method.to_string(), params));
        }

        let failure = self.failures.lock().ok().and_then(|mut f| f.remove(method));
        if let Some(message) = failure {
            return Err(Error::cdp(format!("{}: {} (code: -32000)", method, message)));
        }

        let canned = self
            .responses
            .lock()
            .ok()
            .and_then(|responses| responses.get(method).cloned());

        let result = match (canned, method) {
            (Some(result), _) => result,
            (None, "Page.navigate") => json!({
                "frameId": uuid::Uuid::new_v4().to_string(),
                "loaderId": uuid::Uuid::new_v4().to_string(),
            }),
            (None, "Page.captureScreenshot") => json!({ "data": PIXEL_PNG }),
            (None, _) => json!({}),
        };

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

/// Mock CDP client
#[derive(Debug)]
pub struct MockCdpClient {
    connection: Arc<MockCdpConnection>,
    url: Mutex<String>,
    cookies: Mutex<Vec<Value>>,
    reloads: AtomicUsize,
}

impl MockCdpClient {
    /// Create a new mock CDP client
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MockCdpConnection::new()),
            url: Mutex::new("about:blank".to_string()),
            cookies: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        }
    }

    /// The mock connection, for canned responses and inspection
    pub fn mock_connection(&self) -> Arc<MockCdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Number of reloads issued
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    fn current_url(&self) -> String {
        self.url.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl Default for MockCdpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        self.connection.clone()
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        if let Ok(mut current) = self.url.lock() {
            *current = url.to_string();
        }
        self.connection.send_command("Page.navigate", json!({ "url": url })).await?;
        Ok(NavigationResult {
            loader_id: Some(uuid::Uuid::new_v4().to_string()),
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        // The mock document is always freshly loaded.
        if script.contains("document.readyState") {
            Ok(EvaluationResult::String("complete".to_string()))
        } else if script.contains("location.href") {
            Ok(EvaluationResult::String(self.current_url()))
        } else if script.contains("document.title") {
            Ok(EvaluationResult::String("Mock Page".to_string()))
        } else {
            Ok(EvaluationResult::Null)
        }
    }

    async fn evaluate_handle(&self, _script: &str) -> Result<RemoteObject, Error> {
        Ok(RemoteObject {
            r#type: "object".to_string(),
            subtype: Some("array".to_string()),
            object_id: Some("mock-array".to_string()),
            ..RemoteObject::default()
        })
    }

    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<CallArgument>,
        return_by_value: bool,
    ) -> Result<RemoteObject, Error> {
        let response = self
            .connection
            .send_command(
                "Runtime.callFunctionOn",
                json!({
                    "objectId": object_id,
                    "functionDeclaration": function_declaration,
                    "arguments": arguments,
                    "returnByValue": return_by_value,
                }),
            )
            .await?;

        match response.result {
            Some(result) if result.get("result").is_some() => {
                let parsed: EvaluateResponse = serde_json::from_value(result)?;
                match parsed.exception_details {
                    Some(details) => Err(Error::from_script_failure(details.message())),
                    None => Ok(parsed.result),
                }
            }
            _ => Ok(RemoteObject {
                r#type: "undefined".to_string(),
                ..RemoteObject::default()
            }),
        }
    }

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
        let response = self
            .connection
            .send_command("Runtime.getProperties", json!({ "objectId": object_id, "ownProperties": true }))
            .await?;
        let parsed: GetPropertiesResponse =
            serde_json::from_value(response.result.unwrap_or_else(|| json!({})))?;
        Ok(parsed.result)
    }

    async fn screenshot(&self, _format: ScreenshotFormat) -> Result<Vec<u8>, Error> {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
        BASE64
            .decode(PIXEL_PNG)
            .map_err(|e| Error::internal(format!("bad mock screenshot: {}", e)))
    }

    async fn reload(&self, _ignore_cache: bool) -> Result<(), Error> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn enable_domain(&self, _domain: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        match method {
            "Network.getCookies" => {
                let cookies = self.cookies.lock().map(|c| c.clone()).unwrap_or_default();
                Ok(json!({ "cookies": cookies }))
            }
            "Network.setCookie" => {
                if let Ok(mut cookies) = self.cookies.lock() {
                    cookies.retain(|c| c.get("name") != params.get("name"));
                    cookies.push(params);
                }
                Ok(json!({ "success": true }))
            }
            _ => {
                let response = self.connection.send_command(method, params).await?;
                response.result.ok_or_else(|| Error::cdp("No result in response"))
            }
        }
    }
}

/// Mock CDP browser
#[derive(Debug)]
pub struct MockCdpBrowser {
    is_active: AtomicBool,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
        }
    }
}

impl Default for MockCdpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::browser_not_found("mock browser is closed"));
        }

        Ok(Arc::new(MockCdpClient::new()))
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "Chrome/120.0.0.0".to_string(),
            user_agent: "Mock Chrome/120.0.0.0".to_string(),
            js_version: "12.0.0.0".to_string(),
        })
    }

    async fn create_target(&self, url: &str) -> Result<String, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::browser_not_found("mock browser is closed"));
        }

        let target_id = uuid::Uuid::new_v4().to_string();
        let ws_url = format!("ws://localhost:9222/devtools/page/{}", target_id);
        tracing::debug!("Mock: Created target {} for {}", ws_url, url);
        Ok(ws_url)
    }
}
