//! Bounded condition polling
//!
//! Every wait in the harness goes through [`Wait`]: evaluate a condition, sleep the poll
//! interval, repeat until the condition yields a value or the timeout expires. The
//! condition always runs at least once, so a zero timeout is a single check.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::locator::Locator;
use crate::session::{ElementRef, PageContext};
use crate::{Error, Result};

/// Default bound for element waits
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sleep between condition checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Timeout plus poll interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl Wait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Same poll interval, different bound
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `condition` until it yields `Some`.
    ///
    /// `ElementNotFound` and `StaleElement` count as "not yet"; any other error aborts the
    /// wait. The timeout error names `description` and the last ignored error.
    pub async fn until<T, F, Fut>(&self, description: &str, condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        self.poll(description, Error::is_retryable_in_wait, condition).await
    }

    /// Like [`Wait::until`], but a stale handle aborts instead of being retried.
    ///
    /// Used for conditions on cached handles, which cannot recover from staleness.
    pub async fn until_strict<T, F, Fut>(&self, description: &str, condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        self.poll(description, |e| matches!(e, Error::ElementNotFound(_)), condition)
            .await
    }

    /// Poll a boolean condition until it holds
    pub async fn until_true<F, Fut>(&self, description: &str, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.until(description, || {
            let check = condition();
            async move { Ok(check.await?.then_some(())) }
        })
        .await
    }

    async fn poll<T, F, Fut>(
        &self,
        description: &str,
        retryable: fn(&Error) -> bool,
        mut condition: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last_error: Option<Error> = None;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match condition().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if retryable(&e) => {
                    trace!("wait for {}: attempt {} ignored {}", description, attempts, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                let mut message = format!(
                    "waited {:?} for {} ({} attempts)",
                    self.timeout, description, attempts
                );
                if let Some(e) = last_error {
                    message.push_str(&format!("; last error: {}", e));
                }
                return Err(Error::timeout(message));
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// First element matched by `locator`
    pub async fn for_present(
        &self,
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Arc<dyn ElementRef>> {
        self.until(&format!("presence of {}", locator), || conditions::present(page, locator))
            .await
    }

    /// First element matched by `locator` once it is displayed
    pub async fn for_visible(
        &self,
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Arc<dyn ElementRef>> {
        self.until(&format!("visibility of {}", locator), || conditions::visible(page, locator))
            .await
    }

    /// Every match of `locator`, once all of them are displayed
    pub async fn for_all_visible(
        &self,
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Vec<Arc<dyn ElementRef>>> {
        self.until(&format!("visibility of all {}", locator), || {
            conditions::all_visible(page, locator)
        })
        .await
    }

    /// First element matched by `locator` once it is displayed and enabled
    pub async fn for_clickable(
        &self,
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Arc<dyn ElementRef>> {
        self.until(&format!("clickability of {}", locator), || {
            conditions::clickable(page, locator)
        })
        .await
    }

    /// Current URL once `predicate` accepts it
    pub async fn for_url<P>(&self, page: &dyn PageContext, description: &str, predicate: P) -> Result<String>
    where
        P: Fn(&str) -> bool,
    {
        let predicate = &predicate;
        self.until(description, || async move {
            let url = page.current_url().await?;
            Ok(predicate(&url).then_some(url))
        })
        .await
    }
}

/// Single-shot checks used by the `Wait::for_*` helpers
pub mod conditions {
    use super::*;

    pub async fn present(
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Option<Arc<dyn ElementRef>>> {
        locator.find_first(page).await
    }

    pub async fn visible(
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Option<Arc<dyn ElementRef>>> {
        let Some(element) = locator.find_first(page).await? else {
            return Ok(None);
        };
        Ok(element.is_displayed().await?.then_some(element))
    }

    /// All-or-nothing: an empty match list is trivially all visible.
    pub async fn all_visible(
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Option<Vec<Arc<dyn ElementRef>>>> {
        let elements = locator.find_all(page).await?;
        for element in &elements {
            if !element.is_displayed().await? {
                return Ok(None);
            }
        }
        Ok(Some(elements))
    }

    pub async fn clickable(
        page: &dyn PageContext,
        locator: &Locator,
    ) -> Result<Option<Arc<dyn ElementRef>>> {
        let Some(element) = locator.find_first(page).await? else {
            return Ok(None);
        };
        Ok(is_clickable(element.as_ref()).await?.then_some(element))
    }

    /// Displayed and enabled
    pub async fn is_clickable(element: &dyn ElementRef) -> Result<bool> {
        Ok(element.is_displayed().await? && element.is_enabled().await?)
    }
}
