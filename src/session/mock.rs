//! Mock session implementation for testing
//!
//! An in-memory DOM that implements the session traits without a browser. Nodes declare
//! which queries they answer to (`MockNode::matches`), may host a shadow root, and carry
//! the state the element layer inspects: visibility, enabled flag, connection to the
//! document, obstruction by an overlay. Click hooks let a test wire behaviour, such as a
//! URL change after the login button is clicked.
//!
//! ```rust
//! use reddit_pom::locator::{By, Locator};
//! use reddit_pom::session::mock::{MockNode, MockPage};
//!
//! # async fn example() -> reddit_pom::Result<()> {
//! let page = MockPage::new("https://www.reddit.com/login/");
//! let host = MockNode::new("faceplate-text-input").matches(By::css("#login-username"));
//! host.shadow_child(MockNode::new("input").matches(By::css("input[name='username']")));
//! page.root().child(host);
//!
//! let inner = Locator::in_shadow_of(By::css("#login-username"), By::css("input[name='username']"));
//! assert_eq!(inner.find_all(&page).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::traits::{
    BoundingBox, BrowserContext, Cookie, ElementRef, EvaluationResult, NavigationOptions,
    PageContext, PageOptions,
};
use crate::locator::By;
use crate::Error;

/// Smallest PNG signature, enough for consumers that only store the bytes
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

type Hook = Arc<dyn Fn() + Send + Sync>;
type NavigateHook = Arc<dyn Fn(&str) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct NodeState {
    tag: String,
    selectors: Vec<By>,
    attributes: HashMap<String, String>,
    properties: HashMap<String, String>,
    text: String,
    value: String,
    displayed: bool,
    enabled: bool,
    connected: bool,
    obstructed_by: Option<String>,
    children: Vec<MockNode>,
    shadow_root: Option<MockNode>,
    on_click: Vec<Hook>,
    clicks: usize,
    js_clicks: usize,
    scripts: Vec<String>,
}

/// One node of the in-memory DOM. Clones share state.
#[derive(Clone)]
pub struct MockNode {
    id: String,
    state: Arc<Mutex<NodeState>>,
}

impl fmt::Debug for MockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MockNode")
            .field("id", &self.id)
            .field("tag", &state.tag)
            .field("children", &state.children.len())
            .finish()
    }
}

impl MockNode {
    /// Displayed, enabled, connected node with no content
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(NodeState {
                tag: tag.into(),
                selectors: Vec::new(),
                attributes: HashMap::new(),
                properties: HashMap::new(),
                text: String::new(),
                value: String::new(),
                displayed: true,
                enabled: true,
                connected: true,
                obstructed_by: None,
                children: Vec::new(),
                shadow_root: None,
                on_click: Vec::new(),
                clicks: 0,
                js_clicks: 0,
                scripts: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        lock(&self.state)
    }

    // Builders

    /// Answer to `by` in addition to the implicit tag, id and class matches
    pub fn matches(self, by: By) -> Self {
        self.state().selectors.push(by);
        self
    }

    pub fn attr<K: Into<String>, V: Into<String>>(self, name: K, value: V) -> Self {
        self.state().attributes.insert(name.into(), value.into());
        self
    }

    pub fn prop<K: Into<String>, V: Into<String>>(self, name: K, value: V) -> Self {
        self.state().properties.insert(name.into(), value.into());
        self
    }

    pub fn text<S: Into<String>>(self, text: S) -> Self {
        self.state().text = text.into();
        self
    }

    pub fn hidden(self) -> Self {
        self.state().displayed = false;
        self
    }

    pub fn disabled(self) -> Self {
        self.state().enabled = false;
        self
    }

    /// Native clicks land on `overlay` instead of this node
    pub fn obstructed_by<S: Into<String>>(self, overlay: S) -> Self {
        self.state().obstructed_by = Some(overlay.into());
        self
    }

    /// Run `hook` on every successful native or script click
    pub fn on_click<F>(self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.state().on_click.push(Arc::new(hook));
        self
    }

    // Tree edits

    pub fn child(&self, node: MockNode) -> &Self {
        self.state().children.push(node);
        self
    }

    /// Append to this node's shadow root, attaching one if needed
    pub fn shadow_child(&self, node: MockNode) -> &Self {
        let root = self.shadow_root_node();
        root.child(node);
        self
    }

    /// Attach an empty shadow root and return it
    pub fn shadow_root_node(&self) -> MockNode {
        let mut state = self.state();
        state
            .shadow_root
            .get_or_insert_with(|| MockNode::new("#shadow-root"))
            .clone()
    }

    /// Remove every child, detaching them and their subtrees
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.state().children);
        for child in children {
            child.detach();
        }
    }

    /// Remove from the document; any handle to this node or below goes stale
    pub fn detach(&self) {
        let (children, shadow) = {
            let mut state = self.state();
            state.connected = false;
            (state.children.clone(), state.shadow_root.clone())
        };
        for child in children.into_iter().chain(shadow) {
            child.detach();
        }
    }

    // State edits

    pub fn set_displayed(&self, displayed: bool) {
        self.state().displayed = displayed;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }

    pub fn set_text<S: Into<String>>(&self, text: S) {
        self.state().text = text.into();
    }

    pub fn set_attr<K: Into<String>, V: Into<String>>(&self, name: K, value: V) {
        self.state().attributes.insert(name.into(), value.into());
    }

    pub fn set_obstructed_by(&self, overlay: Option<String>) {
        self.state().obstructed_by = overlay;
    }

    // Inspection

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get_attr(&self, name: &str) -> Option<String> {
        self.state().attributes.get(name).cloned()
    }

    /// Text typed into this node
    pub fn value(&self) -> String {
        self.state().value.clone()
    }

    pub fn clicks(&self) -> usize {
        self.state().clicks
    }

    pub fn js_clicks(&self) -> usize {
        self.state().js_clicks
    }

    /// Functions run on this node through `ElementRef::run_script`
    pub fn scripts(&self) -> Vec<String> {
        self.state().scripts.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    fn answers_to(&self, by: &By) -> bool {
        let state = self.state();
        if state.selectors.contains(by) {
            return true;
        }
        match by {
            By::TagName(tag) => state.tag.eq_ignore_ascii_case(tag),
            // bare tag or bare `#id`; anything richer needs `matches`
            By::Css(selector) => match selector.strip_prefix('#') {
                Some(id) => state.attributes.get("id").map(String::as_str) == Some(id),
                None => state.tag.eq_ignore_ascii_case(selector),
            },
            By::Id(id) => state.attributes.get("id") == Some(id),
            By::ClassName(class) => state
                .attributes
                .get("class")
                .map(|classes| classes.split_whitespace().any(|c| c == class))
                .unwrap_or(false),
            By::LinkText(text) => state.tag.eq_ignore_ascii_case("a") && state.text.trim() == text,
            By::XPath(_) => false,
        }
    }

    /// Connected descendants matching `by`, document order, light DOM only
    fn descendants_matching(&self, by: &By, out: &mut Vec<MockNode>) {
        let children = self.state().children.clone();
        for child in children {
            if !child.is_connected() {
                continue;
            }
            if child.answers_to(by) {
                out.push(child.clone());
            }
            child.descendants_matching(by, out);
        }
    }

    /// Own text followed by the light DOM descendants' text, like `textContent`
    fn collect_text(&self) -> String {
        let (mut text, children) = {
            let state = self.state();
            (state.text.clone(), state.children.clone())
        };
        for child in children {
            text.push_str(&child.collect_text());
        }
        text
    }
}

/// Handle to a [`MockNode`]
#[derive(Debug, Clone)]
pub struct MockElement {
    node: MockNode,
    page_id: String,
}

impl MockElement {
    pub fn new(node: MockNode, page_id: impl Into<String>) -> Self {
        Self {
            node,
            page_id: page_id.into(),
        }
    }

    pub fn node(&self) -> &MockNode {
        &self.node
    }

    fn connected(&self) -> Result<MutexGuard<'_, NodeState>, Error> {
        let state = self.node.state();
        if state.connected {
            Ok(state)
        } else {
            Err(Error::stale_element(format!(
                "<{}> is not attached to the page document",
                state.tag
            )))
        }
    }

    fn fire_click_hooks(&self) {
        let hooks = self.node.state().on_click.clone();
        for hook in hooks {
            hook();
        }
    }

    fn wrap(&self, node: MockNode) -> Arc<dyn ElementRef> {
        Arc::new(MockElement::new(node, self.page_id.clone()))
    }
}

#[async_trait]
impl ElementRef for MockElement {
    fn id(&self) -> &str {
        &self.node.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        drop(self.connected()?);
        let mut found = Vec::new();
        self.node.descendants_matching(by, &mut found);
        Ok(found.into_iter().map(|node| self.wrap(node)).collect())
    }

    async fn shadow_root(&self) -> Result<Option<Arc<dyn ElementRef>>, Error> {
        let root = self.connected()?.shadow_root.clone();
        Ok(root.map(|node| self.wrap(node)))
    }

    async fn text(&self) -> Result<String, Error> {
        drop(self.connected()?);
        Ok(self.node.collect_text())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self.connected()?.attributes.get(name).cloned())
    }

    async fn property(&self, name: &str) -> Result<Option<String>, Error> {
        let state = self.connected()?;
        if name == "value" {
            return Ok(Some(state.value.clone()));
        }
        Ok(state
            .properties
            .get(name)
            .or_else(|| state.attributes.get(name))
            .cloned())
    }

    async fn click(&self) -> Result<(), Error> {
        {
            let mut state = self.connected()?;
            if !state.displayed || !state.enabled {
                return Err(Error::not_interactable(format!("<{}> cannot be clicked", state.tag)));
            }
            if let Some(overlay) = &state.obstructed_by {
                return Err(Error::click_intercepted(format!(
                    "<{}> is covered by {}",
                    state.tag, overlay
                )));
            }
            state.clicks += 1;
        }
        self.fire_click_hooks();
        Ok(())
    }

    async fn js_click(&self) -> Result<(), Error> {
        self.connected()?.js_clicks += 1;
        self.fire_click_hooks();
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), Error> {
        let mut state = self.connected()?;
        if !state.displayed {
            return Err(Error::not_interactable(format!("<{}> is not displayed", state.tag)));
        }
        state.value.push_str(text);
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<(), Error> {
        drop(self.connected()?);
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool, Error> {
        Ok(self.connected()?.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, Error> {
        Ok(self.connected()?.enabled)
    }

    async fn bounding_box(&self) -> Result<BoundingBox, Error> {
        let state = self.connected()?;
        if state.displayed {
            Ok(BoundingBox { x: 0.0, y: 0.0, width: 120.0, height: 32.0 })
        } else {
            Ok(BoundingBox::default())
        }
    }

    async fn run_script(&self, function_declaration: &str) -> Result<EvaluationResult, Error> {
        self.connected()?.scripts.push(function_declaration.to_string());
        Ok(EvaluationResult::Null)
    }
}

struct PageState {
    id: String,
    browser_id: String,
    url: Mutex<String>,
    title: Mutex<String>,
    root: MockNode,
    cookies: Mutex<Vec<Cookie>>,
    history: Mutex<Vec<String>>,
    viewport: Mutex<Option<(u32, u32)>>,
    reloads: AtomicUsize,
    screenshots: AtomicUsize,
    is_active: AtomicBool,
    on_navigate: Mutex<Vec<NavigateHook>>,
    on_reload: Mutex<Vec<Hook>>,
    login_redirect: Mutex<Option<LoginRedirect>>,
}

/// Session cookie that makes the login page bounce a signed-in visitor elsewhere
#[derive(Debug, Clone)]
struct LoginRedirect {
    cookie: String,
    value: String,
    target: String,
}

/// Mock page context. Clones share state, so a clone can be moved into click hooks.
#[derive(Clone)]
pub struct MockPage {
    state: Arc<PageState>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("id", &self.state.id)
            .field("url", &self.url())
            .finish()
    }
}

impl MockPage {
    /// Empty document at `url`
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self::in_browser(url, "mock-browser")
    }

    fn in_browser<S: Into<String>>(url: S, browser_id: &str) -> Self {
        Self {
            state: Arc::new(PageState {
                id: Uuid::new_v4().to_string(),
                browser_id: browser_id.to_string(),
                url: Mutex::new(url.into()),
                title: Mutex::new(String::new()),
                root: MockNode::new("#document"),
                cookies: Mutex::new(Vec::new()),
                history: Mutex::new(Vec::new()),
                viewport: Mutex::new(None),
                reloads: AtomicUsize::new(0),
                screenshots: AtomicUsize::new(0),
                is_active: AtomicBool::new(true),
                on_navigate: Mutex::new(Vec::new()),
                on_reload: Mutex::new(Vec::new()),
                login_redirect: Mutex::new(None),
            }),
        }
    }

    /// Document node; append the page content here
    pub fn root(&self) -> &MockNode {
        &self.state.root
    }

    pub fn url(&self) -> String {
        lock(&self.state.url).clone()
    }

    pub fn set_url<S: Into<String>>(&self, url: S) {
        *lock(&self.state.url) = url.into();
    }

    pub fn set_title<S: Into<String>>(&self, title: S) {
        *lock(&self.state.title) = title.into();
    }

    /// URLs passed to `navigate`, in order
    pub fn history(&self) -> Vec<String> {
        lock(&self.state.history).clone()
    }

    pub fn reload_count(&self) -> usize {
        self.state.reloads.load(Ordering::SeqCst)
    }

    pub fn screenshot_count(&self) -> usize {
        self.state.screenshots.load(Ordering::SeqCst)
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        *lock(&self.state.viewport)
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        lock(&self.state.cookies).clone()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        lock(&self.state.cookies).iter().any(|c| c.name == name)
    }

    /// Run `hook` with the requested URL after every navigation
    pub fn on_navigate<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        lock(&self.state.on_navigate).push(Arc::new(hook));
    }

    /// Run `hook` after every reload
    pub fn on_reload<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        lock(&self.state.on_reload).push(Arc::new(hook));
    }

    /// Send any load of a `/login` URL to `target` while cookie `name` holds `value`.
    ///
    /// Mirrors a site that skips its login form for a valid session: without the
    /// cookie, or with another value, the login page stays put.
    pub fn redirect_login_with_cookie<N, V, T>(&self, name: N, value: V, target: T)
    where
        N: Into<String>,
        V: Into<String>,
        T: Into<String>,
    {
        *lock(&self.state.login_redirect) = Some(LoginRedirect {
            cookie: name.into(),
            value: value.into(),
            target: target.into(),
        });
    }

    fn apply_login_redirect(&self) {
        let Some(redirect) = lock(&self.state.login_redirect).clone() else {
            return;
        };
        if !self.url().contains("/login") {
            return;
        }
        let signed_in = lock(&self.state.cookies)
            .iter()
            .any(|c| c.name == redirect.cookie && c.value == redirect.value);
        if signed_in {
            self.set_url(redirect.target);
        }
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.state.is_active.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::page_not_found(&self.state.id))
        }
    }
}

#[async_trait]
impl PageContext for MockPage {
    fn id(&self) -> &str {
        &self.state.id
    }

    fn browser_id(&self) -> &str {
        &self.state.browser_id
    }

    async fn navigate(&self, url: &str, _options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active()?;
        self.set_url(url);
        lock(&self.state.history).push(url.to_string());
        self.apply_login_redirect();

        let hooks = lock(&self.state.on_navigate).clone();
        for hook in hooks {
            hook(url);
        }
        Ok(())
    }

    async fn reload(&self, _options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active()?;
        self.state.reloads.fetch_add(1, Ordering::SeqCst);
        self.apply_login_redirect();

        let hooks = lock(&self.state.on_reload).clone();
        for hook in hooks {
            hook();
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        self.ensure_active()?;
        Ok(self.url())
    }

    async fn title(&self) -> Result<String, Error> {
        self.ensure_active()?;
        Ok(lock(&self.state.title).clone())
    }

    async fn evaluate(&self, _script: &str) -> Result<EvaluationResult, Error> {
        self.ensure_active()?;
        Ok(EvaluationResult::Null)
    }

    async fn find_elements(&self, by: &By) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        self.ensure_active()?;
        let mut found = Vec::new();
        self.state.root.descendants_matching(by, &mut found);
        Ok(found
            .into_iter()
            .map(|node| Arc::new(MockElement::new(node, self.state.id.clone())) as Arc<dyn ElementRef>)
            .collect())
    }

    async fn get_cookies(&self) -> Result<Vec<Cookie>, Error> {
        self.ensure_active()?;
        Ok(self.cookies())
    }

    async fn set_cookie(&self, cookie: &Cookie) -> Result<(), Error> {
        self.ensure_active()?;
        let mut cookies = lock(&self.state.cookies);
        cookies.retain(|c| !(c.name == cookie.name && c.domain == cookie.domain));
        cookies.push(cookie.clone());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, Error> {
        self.ensure_active()?;
        self.state.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn set_viewport(&self, width: u32, height: u32, _device_scale_factor: f64) -> Result<(), Error> {
        self.ensure_active()?;
        *lock(&self.state.viewport) = Some((width, height));
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.state.is_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state.is_active.load(Ordering::SeqCst)
    }
}

/// Mock browser context
#[derive(Debug)]
pub struct MockBrowser {
    id: String,
    queued: Mutex<Vec<MockPage>>,
    pages: Mutex<Vec<MockPage>>,
    is_active: AtomicBool,
}

impl MockBrowser {
    /// Create a new mock browser
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            queued: Mutex::new(Vec::new()),
            pages: Mutex::new(Vec::new()),
            is_active: AtomicBool::new(true),
        }
    }

    /// Hand out `page` on the next `create_page` instead of a blank one
    pub fn serving(self, page: MockPage) -> Self {
        lock(&self.queued).push(page);
        self
    }

    /// Pages created so far
    pub fn pages(&self) -> Vec<MockPage> {
        lock(&self.pages).clone()
    }
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserContext for MockBrowser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::browser_not_found(&self.id));
        }

        let queued = {
            let mut queued = lock(&self.queued);
            (!queued.is_empty()).then(|| queued.remove(0))
        };
        let page = queued.unwrap_or_else(|| {
            MockPage::in_browser(
                options.default_url.unwrap_or_else(|| "about:blank".to_string()),
                &self.id,
            )
        });

        lock(&self.pages).push(page.clone());
        Ok(Arc::new(page))
    }

    async fn close(&self) -> Result<(), Error> {
        let pages = self.pages();
        for page in pages {
            page.close().await?;
        }
        self.is_active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_implicit_matches() {
        let page = MockPage::new("https://www.reddit.com/");
        page.root()
            .child(MockNode::new("button").attr("id", "login-button").attr("class", "btn login"));

        assert_eq!(page.find_elements(&By::tag_name("button")).await.unwrap().len(), 1);
        assert_eq!(page.find_elements(&By::id("login-button")).await.unwrap().len(), 1);
        assert_eq!(page.find_elements(&By::class_name("login")).await.unwrap().len(), 1);
        assert!(page.find_elements(&By::class_name("log")).await.unwrap().is_empty());
        assert_eq!(page.find_elements(&By::css("#login-button")).await.unwrap().len(), 1);
        assert!(page.find_elements(&By::css("#main #login-button")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detached_handle_is_stale() {
        let page = MockPage::new("https://www.reddit.com/");
        let post = MockNode::new("shreddit-post");
        page.root().child(post.clone());

        let handle = page.find_elements(&By::tag_name("shreddit-post")).await.unwrap().remove(0);
        post.detach();

        assert!(matches!(handle.text().await, Err(Error::StaleElement(_))));
        assert!(matches!(handle.click().await, Err(Error::StaleElement(_))));
        assert!(page.find_elements(&By::tag_name("shreddit-post")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_click_rules() {
        let page = MockPage::new("https://www.reddit.com/");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let button = MockNode::new("button")
            .obstructed_by("div#overlay")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        page.root().child(button.clone());

        let handle = page.find_elements(&By::tag_name("button")).await.unwrap().remove(0);
        assert!(matches!(handle.click().await, Err(Error::ClickIntercepted(_))));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        handle.js_click().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(button.js_clicks(), 1);

        button.set_obstructed_by(None);
        button.set_displayed(false);
        assert!(matches!(handle.click().await, Err(Error::NotInteractable(_))));

        button.set_displayed(true);
        handle.click().await.unwrap();
        assert_eq!(button.clicks(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_text_includes_descendants() {
        let page = MockPage::new("https://www.reddit.com/");
        let comment = MockNode::new("shreddit-comment");
        comment.child(MockNode::new("p").text("lol"));
        page.root().child(comment);

        let handle = page.find_elements(&By::tag_name("shreddit-comment")).await.unwrap().remove(0);
        assert_eq!(handle.text().await.unwrap(), "lol");
    }

    #[tokio::test]
    async fn test_navigate_hooks_and_history() {
        let page = MockPage::new("about:blank");
        let redirect = page.clone();
        page.on_navigate(move |url| {
            if url.ends_with("/submit") {
                redirect.set_url("https://www.reddit.com/login/");
            }
        });

        page.navigate("https://www.reddit.com/submit", NavigationOptions::default())
            .await
            .unwrap();

        assert_eq!(page.url(), "https://www.reddit.com/login/");
        assert_eq!(page.history(), vec!["https://www.reddit.com/submit".to_string()]);
    }

    #[tokio::test]
    async fn test_login_redirect_needs_matching_cookie() {
        let page = MockPage::new("about:blank");
        page.redirect_login_with_cookie("reddit_session", "abc", "https://www.reddit.com/");
        let login = "https://www.reddit.com/login/";

        page.navigate(login, NavigationOptions::default()).await.unwrap();
        assert_eq!(page.url(), login);

        page.set_cookie(&Cookie::new("reddit_session", "expired", ".reddit.com"))
            .await
            .unwrap();
        page.reload(NavigationOptions::default()).await.unwrap();
        assert_eq!(page.url(), login);

        page.set_cookie(&Cookie::new("reddit_session", "abc", ".reddit.com"))
            .await
            .unwrap();
        page.navigate(login, NavigationOptions::default()).await.unwrap();
        assert_eq!(page.url(), "https://www.reddit.com/");
    }

    #[tokio::test]
    async fn test_browser_serves_queued_page() {
        let page = MockPage::new("https://www.reddit.com/login/");
        let browser = MockBrowser::new().serving(page.clone());

        let served = browser.create_page(PageOptions::default()).await.unwrap();
        assert_eq!(served.id(), page.state.id);

        let blank = browser.create_page(PageOptions::default()).await.unwrap();
        assert_eq!(blank.current_url().await.unwrap(), "about:blank");
        assert_eq!(blank.browser_id(), browser.id());

        browser.close().await.unwrap();
        assert!(!served.is_active());
        assert!(browser.create_page(PageOptions::default()).await.is_err());
    }
}
