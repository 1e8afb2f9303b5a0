//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::types::{CallArgument, PropertyDescriptor, RemoteObject};

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(
        &self,
        method: &str,
        params: Value,
    ) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client that provides typed methods for common CDP operations.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection>;

    /// Start a navigation. Does not wait for the new document.
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page and return the value
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Evaluate JavaScript and keep the result as a remote object handle
    async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, crate::Error>;

    /// Call a function with `this` bound to a remote object
    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<CallArgument>,
        return_by_value: bool,
    ) -> Result<RemoteObject, crate::Error>;

    /// Own properties of a remote object (array items of a NodeList, for instance)
    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, crate::Error>;

    /// Capture a screenshot
    async fn screenshot(&self, format: ScreenshotFormat) -> Result<Vec<u8>, crate::Error>;

    /// Reload the page
    async fn reload(&self, ignore_cache: bool) -> Result<(), crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Loader ID of the new document
    pub loader_id: Option<String>,
    /// Requested URL
    pub url: String,
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// String content, if this is a string result
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvaluationResult::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean result
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EvaluationResult::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Screenshot format
#[derive(Debug, Clone, Copy)]
pub enum ScreenshotFormat {
    /// PNG format
    Png,
    /// JPEG format
    Jpeg(u8), // quality 0-100
}

/// CDP browser trait
///
/// Controls browser-level operations via CDP.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create a new CDP client for a target WebSocket URL
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, crate::Error>;

    /// Close every connection opened through this browser
    async fn close(&self) -> Result<(), crate::Error>;

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// Create a new page target and return its WebSocket URL
    async fn create_target(&self, url: &str) -> Result<String, crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// JavaScript engine version
    pub js_version: String,
}
