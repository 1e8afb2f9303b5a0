//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        debug!("Creating CDP client");
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    pub(crate) fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => {
                let value = obj
                    .value
                    .as_ref()
                    .and_then(|v| v.as_f64())
                    .or_else(|| match obj.unserializable_value.as_deref() {
                        Some("NaN") => Some(f64::NAN),
                        Some("Infinity") => Some(f64::INFINITY),
                        Some("-Infinity") => Some(f64::NEG_INFINITY),
                        Some("-0") => Some(-0.0),
                        _ => None,
                    })
                    .unwrap_or(0.0);
                EvaluationResult::Number(value)
            }
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "undefined" => EvaluationResult::Null,
            "object" if obj.subtype.as_deref() == Some("null") => EvaluationResult::Null,
            "object" | "function" | "bigint" | "symbol" => {
                EvaluationResult::Object(obj.value.clone().unwrap_or(serde_json::Value::Null))
            }
            other => {
                debug!("parse_remote_object: unknown type '{}', returning Null", other);
                EvaluationResult::Null
            }
        }
    }

    /// Turn a `Runtime.*` response into its remote object, surfacing script exceptions.
    fn remote_object_from(result: serde_json::Value) -> Result<RemoteObject, Error> {
        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(details) = response.exception_details {
            return Err(Error::from_script_failure(details.message()));
        }

        Ok(response.result)
    }

    /// `Runtime.*` command whose protocol errors are classified like script exceptions
    async fn call_runtime(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        self.call_method(method, params).await.map_err(|e| match e {
            Error::Cdp(msg) => Error::from_script_failure(msg),
            other => other,
        })
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams {
            url: url.to_string(),
            referrer: None,
        };

        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            if !error_text.is_empty() {
                return Err(Error::navigation_failed(format!("{}: {}", url, error_text)));
            }
        }

        Ok(NavigationResult {
            loader_id: result
                .get("loaderId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        debug!("Evaluating script: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
        };

        let result = self
            .call_runtime("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let remote_obj = Self::remote_object_from(result)?;
        Ok(Self::parse_remote_object(&remote_obj))
    }

    async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, Error> {
        debug!("Evaluating script for handle: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(false),
            return_by_value: Some(false),
        };

        let result = self
            .call_runtime("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        Self::remote_object_from(result)
    }

    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<CallArgument>,
        return_by_value: bool,
    ) -> Result<RemoteObject, Error> {
        let params = CallFunctionOnParams {
            function_declaration: function_declaration.to_string(),
            object_id: object_id.to_string(),
            arguments,
            return_by_value,
            await_promise: false,
        };

        let result = self
            .call_runtime("Runtime.callFunctionOn", serde_json::to_value(params)?)
            .await?;

        Self::remote_object_from(result)
    }

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
        let result = self
            .call_runtime(
                "Runtime.getProperties",
                serde_json::json!({
                    "objectId": object_id,
                    "ownProperties": true,
                }),
            )
            .await?;

        let response: GetPropertiesResponse = serde_json::from_value(result)?;
        Ok(response.result)
    }

    async fn screenshot(&self, format: ScreenshotFormat) -> Result<Vec<u8>, Error> {
        info!("Capturing screenshot");

        let mut params = match format {
            ScreenshotFormat::Png => serde_json::json!({ "format": "png" }),
            ScreenshotFormat::Jpeg(quality) => serde_json::json!({ "format": "jpeg", "quality": quality }),
        };
        params["captureBeyondViewport"] = serde_json::json!(false);

        let result = self.call_method("Page.captureScreenshot", params).await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    async fn reload(&self, ignore_cache: bool) -> Result<(), Error> {
        info!("Reloading page (ignore_cache: {})", ignore_cache);

        self.call_method("Page.reload", serde_json::json!({ "ignoreCache": ignore_cache }))
            .await?;

        Ok(())
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        debug!("Enabling domain: {}", domain);

        let method = format!("{}.enable", domain);
        self.call_method(&method, serde_json::json!({})).await?;

        Ok(())
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        debug!("Calling CDP method: {}", method);

        let response = self.connection.send_command(method, params).await?;

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(kind: &str, subtype: Option<&str>, value: Option<serde_json::Value>) -> RemoteObject {
        RemoteObject {
            r#type: kind.to_string(),
            subtype: subtype.map(|s| s.to_string()),
            value,
            ..RemoteObject::default()
        }
    }

    #[test]
    fn test_parse_remote_object_string() {
        let obj = remote("string", None, Some(serde_json::json!("test")));
        let result = CdpClientImpl::parse_remote_object(&obj);
        assert_eq!(result, EvaluationResult::String("test".to_string()));
    }

    #[test]
    fn test_parse_remote_object_number() {
        let obj = remote("number", None, Some(serde_json::json!(42.5)));
        let result = CdpClientImpl::parse_remote_object(&obj);
        assert_eq!(result, EvaluationResult::Number(42.5));
    }

    #[test]
    fn test_parse_remote_object_null_subtype() {
        let obj = remote("object", Some("null"), None);
        assert_eq!(CdpClientImpl::parse_remote_object(&obj), EvaluationResult::Null);
    }

    #[test]
    fn test_parse_remote_object_undefined() {
        let obj = remote("undefined", None, None);
        assert_eq!(CdpClientImpl::parse_remote_object(&obj), EvaluationResult::Null);
    }

    #[test]
    fn test_remote_object_from_exception_is_stale() {
        let result = CdpClientImpl::remote_object_from(serde_json::json!({
            "result": { "type": "object" },
            "exceptionDetails": {
                "exceptionId": 1,
                "text": "Uncaught",
                "exception": { "type": "object", "description": "Error: stale element reference" }
            }
        }));

        assert!(matches!(result, Err(Error::StaleElement(_))));
    }

    #[tokio::test]
    async fn test_navigate_reports_error_text() {
        let connection = Arc::new(crate::cdp::mock::MockCdpConnection::new());
        connection.respond_with(
            "Page.navigate",
            serde_json::json!({ "frameId": "f", "errorText": "net::ERR_NAME_NOT_RESOLVED" }),
        );
        let client = CdpClientImpl::new(connection);

        let result = client.navigate("https://nowhere.invalid").await;
        assert!(matches!(result, Err(Error::NavigationFailed(_))));
    }

    #[tokio::test]
    async fn test_evaluate_through_mock_connection() {
        let connection = Arc::new(crate::cdp::mock::MockCdpConnection::new());
        connection.respond_with(
            "Runtime.evaluate",
            serde_json::json!({ "result": { "type": "boolean", "value": true } }),
        );
        let client = CdpClientImpl::new(connection.clone());

        let result = client.evaluate("1 === 1", false).await.unwrap();
        assert_eq!(result.as_bool(), Some(true));
        assert_eq!(connection.sent_methods(), vec!["Runtime.evaluate".to_string()]);
    }

    #[tokio::test]
    async fn test_runtime_errors_during_navigation_are_stale() {
        let connection = Arc::new(crate::cdp::mock::MockCdpConnection::new());
        let client = CdpClientImpl::new(connection.clone());

        connection.fail_next("Runtime.evaluate", "Execution context was destroyed.");
        let result = client.evaluate("window.location.href", false).await;
        assert!(matches!(result, Err(Error::StaleElement(_))));

        connection.fail_next("Runtime.evaluate", "Cannot find default execution context");
        let result = client.evaluate_handle("document.querySelectorAll('a')").await;
        assert!(matches!(result, Err(Error::StaleElement(_))));

        connection.fail_next("Runtime.getProperties", "Could not find object with given id");
        let result = client.get_properties("gone").await;
        assert!(matches!(result, Err(Error::StaleElement(_))));
    }

    #[tokio::test]
    async fn test_other_protocol_errors_stay_script_failures() {
        let connection = Arc::new(crate::cdp::mock::MockCdpConnection::new());
        let client = CdpClientImpl::new(connection.clone());

        connection.fail_next("Runtime.evaluate", "Invalid parameters");
        let result = client.evaluate("1", false).await;
        assert!(matches!(result, Err(Error::ScriptExecutionFailed(_))));
    }
}
