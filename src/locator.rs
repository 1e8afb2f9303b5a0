//! Locators
//!
//! A [`Locator`] is a declarative query that is re-evaluated on every access. It is a chain
//! of steps: `Find(By)` searches the current scope, `Shadow` crosses into the shadow root of
//! the element found so far. `css("shreddit-post").shadow().css("button[upvote]")` reads as
//! "the upvote button inside the first post's shadow tree".

use std::fmt;
use std::sync::Arc;

use crate::session::{ElementRef, PageContext};
use crate::{Error, Result};

/// One query kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    Css(String),
    XPath(String),
    /// Anchor whose trimmed visible text equals the value
    LinkText(String),
    ClassName(String),
    Id(String),
    TagName(String),
}

impl By {
    pub fn css<S: Into<String>>(selector: S) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath<S: Into<String>>(expression: S) -> Self {
        By::XPath(expression.into())
    }

    pub fn link_text<S: Into<String>>(text: S) -> Self {
        By::LinkText(text.into())
    }

    pub fn class_name<S: Into<String>>(name: S) -> Self {
        By::ClassName(name.into())
    }

    pub fn id<S: Into<String>>(id: S) -> Self {
        By::Id(id.into())
    }

    pub fn tag_name<S: Into<String>>(tag: S) -> Self {
        By::TagName(tag.into())
    }

    /// JavaScript expression yielding an array of matching elements under `root`.
    ///
    /// `root` is either `document`, an element or a shadow root. XPath over a shadow root
    /// is evaluated with the root as context node, which matches relative expressions only.
    pub fn query_expression(&self) -> String {
        match self {
            By::Css(selector) => format!(
                "Array.from(root.querySelectorAll({}))",
                serde_json::json!(selector)
            ),
            By::XPath(expression) => format!(
                "(() => {{ const doc = root.ownerDocument || root; \
                 const snap = doc.evaluate({}, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; \
                 for (let i = 0; i < snap.snapshotLength; i++) {{ const n = snap.snapshotItem(i); if (n.nodeType === 1) out.push(n); }} \
                 return out; }})()",
                serde_json::json!(expression)
            ),
            By::LinkText(text) => format!(
                "Array.from(root.querySelectorAll('a')).filter(a => (a.innerText || a.textContent || '').trim() === {})",
                serde_json::json!(text)
            ),
            By::ClassName(name) => format!(
                "Array.from(root.querySelectorAll('.' + CSS.escape({})))",
                serde_json::json!(name)
            ),
            By::Id(id) => format!(
                "Array.from(root.querySelectorAll('#' + CSS.escape({})))",
                serde_json::json!(id)
            ),
            By::TagName(tag) => format!(
                "Array.from(root.querySelectorAll({}))",
                serde_json::json!(tag)
            ),
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            By::Css(s) => write!(f, "css({})", s),
            By::XPath(s) => write!(f, "xpath({})", s),
            By::LinkText(s) => write!(f, "link_text({})", s),
            By::ClassName(s) => write!(f, "class({})", s),
            By::Id(s) => write!(f, "id({})", s),
            By::TagName(s) => write!(f, "tag({})", s),
        }
    }
}

/// One resolution step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Find(By),
    Shadow,
}

/// Composable, boundary-crossing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    /// Locator with a single document-level query
    pub fn new(by: By) -> Self {
        Self { steps: vec![Step::Find(by)] }
    }

    pub fn css<S: Into<String>>(selector: S) -> Self {
        Self::new(By::css(selector))
    }

    pub fn xpath<S: Into<String>>(expression: S) -> Self {
        Self::new(By::xpath(expression))
    }

    /// `host >> shadow >> inner`
    pub fn in_shadow_of(host: By, inner: By) -> Self {
        Self::new(host).shadow().then(inner)
    }

    /// Search inside the element found so far
    pub fn then(mut self, by: By) -> Self {
        self.steps.push(Step::Find(by));
        self
    }

    /// Shorthand for `then(By::css(..))`
    pub fn css_within<S: Into<String>>(self, selector: S) -> Self {
        self.then(By::css(selector))
    }

    /// Cross into the shadow root of the element found so far
    pub fn shadow(mut self) -> Self {
        self.steps.push(Step::Shadow);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Every match of the final step, starting from the document.
    pub async fn find_all(&self, page: &dyn PageContext) -> Result<Vec<Arc<dyn ElementRef>>> {
        self.find_all_from(page, None).await
    }

    /// First match of the final step, if any.
    pub async fn find_first(&self, page: &dyn PageContext) -> Result<Option<Arc<dyn ElementRef>>> {
        Ok(self.find_all(page).await?.into_iter().next())
    }

    /// Resolve starting from `scope` (the document when `None`).
    ///
    /// Intermediate steps take their first match; an empty intermediate step yields an
    /// empty result rather than an error so callers can poll on it.
    pub async fn find_all_from(
        &self,
        page: &dyn PageContext,
        scope: Option<Arc<dyn ElementRef>>,
    ) -> Result<Vec<Arc<dyn ElementRef>>> {
        let mut scope = scope;
        let last = self.steps.len().saturating_sub(1);

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Find(by) => {
                    let found = match &scope {
                        None => page.find_elements(by).await?,
                        Some(element) => element.find_elements(by).await?,
                    };
                    if index == last {
                        return Ok(found);
                    }
                    match found.into_iter().next() {
                        Some(element) => scope = Some(element),
                        None => return Ok(Vec::new()),
                    }
                }
                Step::Shadow => {
                    let host = scope.as_ref().ok_or_else(|| {
                        Error::invalid_locator(format!("{}: shadow step without a host", self))
                    })?;
                    match host.shadow_root().await? {
                        Some(root) if index == last => return Ok(vec![root]),
                        Some(root) => scope = Some(root),
                        None => return Ok(Vec::new()),
                    }
                }
            }
        }

        Ok(Vec::new())
    }
}

impl From<By> for Locator {
    fn from(by: By) -> Self {
        Locator::new(by)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                f.write_str(" >> ")?;
            }
            match step {
                Step::Find(by) => write!(f, "{}", by)?,
                Step::Shadow => f.write_str("shadow")?,
            }
        }
        Ok(())
    }
}
