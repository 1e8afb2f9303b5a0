//! reddit-pom: Page Object UI harness for a Reddit-like site
//!
//! This library drives a running Chrome over the Chrome DevTools Protocol and exposes
//! the site's screens as page objects built from typed element wrappers.

pub mod error;
pub mod config;
pub mod logging;

pub mod cdp;
pub mod session;

pub mod locator;
pub mod wait;
pub mod elements;
pub mod pages;

pub mod cookies;
pub mod harness;

// Re-exports
pub use error::{Error, Result};
pub use harness::{AuthMethod, TestSession};

/// reddit-pom library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
