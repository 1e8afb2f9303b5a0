//! Unified error types for reddit-pom

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for reddit-pom
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser not found or no longer active
    #[error("Browser not found: {0}")]
    BrowserNotFound(String),

    /// Page not found or already closed
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Element not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A bounded wait expired
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Another element received the click
    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    /// The referenced node is no longer attached to the document
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The element cannot receive native input (hidden, zero-size, disabled)
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// A blocking step was interrupted before it completed
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Malformed locator
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new browser not found error
    pub fn browser_not_found<S: Into<String>>(id: S) -> Self {
        Error::BrowserNotFound(id.into())
    }

    /// Create a new page not found error
    pub fn page_not_found<S: Into<String>>(id: S) -> Self {
        Error::PageNotFound(id.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(what: S) -> Self {
        Error::ElementNotFound(what.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new click intercepted error
    pub fn click_intercepted<S: Into<String>>(msg: S) -> Self {
        Error::ClickIntercepted(msg.into())
    }

    /// Create a new stale element error
    pub fn stale_element<S: Into<String>>(msg: S) -> Self {
        Error::StaleElement(msg.into())
    }

    /// Create a new not interactable error
    pub fn not_interactable<S: Into<String>>(msg: S) -> Self {
        Error::NotInteractable(msg.into())
    }

    /// Create a new interrupted error
    pub fn interrupted<S: Into<String>>(msg: S) -> Self {
        Error::Interrupted(msg.into())
    }

    /// Create a new invalid locator error
    pub fn invalid_locator<S: Into<String>>(msg: S) -> Self {
        Error::InvalidLocator(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Element lookup failed, either immediately or after a bounded wait.
    pub fn is_not_found_or_timeout(&self) -> bool {
        matches!(self, Error::ElementNotFound(_) | Error::Timeout(_))
    }

    /// Conditions that a polling wait keeps retrying through.
    ///
    /// Raw protocol errors count when they describe a document swap.
    pub fn is_retryable_in_wait(&self) -> bool {
        match self {
            Error::ElementNotFound(_) | Error::StaleElement(_) => true,
            Error::Cdp(msg) => matches!(Error::from_script_failure(msg.as_str()), Error::StaleElement(_)),
            _ => false,
        }
    }

    /// Map a script exception or CDP object lookup failure to the harness taxonomy.
    ///
    /// Detached nodes surface either as our own `stale element reference` exception
    /// or as a CDP error about an unknown object id after the document was replaced.
    /// A script sent while a navigation swaps documents fails with a destroyed or
    /// missing execution context; that is transient in the same way.
    pub fn from_script_failure<S: Into<String>>(msg: S) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if lower.contains("stale element reference")
            || lower.contains("could not find object with given id")
            || lower.contains("cannot find context with specified id")
            || lower.contains("execution context was destroyed")
            || lower.contains("cannot find default execution context")
        {
            Error::StaleElement(msg)
        } else {
            Error::ScriptExecutionFailed(msg)
        }
    }
}
