//! CDP (Chrome DevTools Protocol) type definitions
//!
//! Wire structures for the JSON-RPC envelope and the handful of domains the harness uses.

use serde::{Deserialize, Serialize};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// CDP JSON-RPC notification (event)
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    /// Event method (e.g., "Page.loadEventFired")
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

/// CDP JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
    /// Referrer URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// `Runtime.evaluate` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    /// Return the value instead of an object handle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

/// `Runtime.callFunctionOn` parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    /// Function source, invoked with `this` bound to `object_id`
    pub function_declaration: String,
    /// Receiver object
    pub object_id: String,
    /// Positional arguments
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<CallArgument>,
    /// Return the value instead of an object handle
    pub return_by_value: bool,
    /// Whether to await promise
    pub await_promise: bool,
}

/// One `Runtime.callFunctionOn` argument: either a JSON value or another remote object
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl CallArgument {
    /// Argument passed by value
    pub fn value(value: serde_json::Value) -> Self {
        Self { value: Some(value), object_id: None }
    }

    /// Argument referencing a remote object
    pub fn object(object_id: impl Into<String>) -> Self {
        Self { value: None, object_id: Some(object_id.into()) }
    }
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype ("node", "array", "null", ...)
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
    /// Unserializable value
    #[serde(default)]
    pub unserializable_value: Option<String>,
    /// Handle for non-primitive results
    #[serde(default)]
    pub object_id: Option<String>,
}

impl RemoteObject {
    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        self.r#type == "undefined" || self.subtype.as_deref() == Some("null")
    }
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception ID
    #[serde(default)]
    pub exception_id: i32,
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best available human readable message
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// `Runtime.evaluate` / `Runtime.callFunctionOn` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// One entry of `Runtime.getProperties`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Property value, absent for accessors
    #[serde(default)]
    pub value: Option<RemoteObject>,
    /// Own property flag
    #[serde(default)]
    pub is_own: bool,
}

/// `Runtime.getProperties` response
#[derive(Debug, Clone, Deserialize)]
pub struct GetPropertiesResponse {
    #[serde(default)]
    pub result: Vec<PropertyDescriptor>,
}
