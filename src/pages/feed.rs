//! Home feed: posts, reporting, left navigation and the user menu

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::BasePage;
use crate::elements::{Button, Clickable, Element, Link, UiElement};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::{Error, Result};

pub const FEED_CONTAINER: &str = "shreddit-feed";
pub const POST_ITEMS: &str = "shreddit-post";
pub const POST_LINK: &str = "a[slot='full-post-link']";
pub const OVERFLOW_MENU: &str = "shreddit-post-overflow-menu";
pub const OVERFLOW_REPORT: &str = "#post-overflow-report";
pub const OVERFLOW_HIDE: &str = "#post-overflow-hide";
pub const REPORT_REASONS: &str = "[slot-name='REPORT_REASONS']";
pub const REPORT_SPAM_REASON: &str = "[value='SPAM']";
pub const REPORT_SPAM_STEP: &str = "[slot-name='SPAM']";
pub const REPORT_SPAM_CATEGORY: &str = "[value='SPAM_COMMENT_FLOODING']";
pub const REPORT_ACTION_BUTTON: &str = "#report-action-button";
pub const REPORT_SUCCESS: &str = "[slot-name='SUCCESS']";
pub const SIDE_BAR: &str = "#flex-left-nav-contents";
pub const SIDE_BAR_BUTTON: &str = "#navbar-menu-button";
pub const LEFT_NAV: &str = "left-nav-top-section";
pub const USER_MENU_BUTTON: &str = "#expand-user-drawer-button";
pub const LOGOUT_BUTTON: &str = "#logout-list-item";
pub const LOGIN_BUTTON: &str = "#login-button";
pub const CREATE_POST_BUTTON: &str = "#create-post";

#[derive(Debug)]
pub struct FeedPage {
    base: BasePage,
    last_hidden: Mutex<Option<String>>,
}

impl FeedPage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self::from_base(BasePage::new(page, wait))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self {
            base,
            last_hidden: Mutex::new(None),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    fn shadow_button(&self, host: &str, inner: &str) -> Button {
        self.base.button(Locator::in_shadow_of(By::css(host), By::css(inner)))
    }

    // Posts

    /// Every post in the feed, once the feed and all posts are displayed
    pub async fn get_all_posts(&self) -> Result<Vec<Arc<dyn ElementRef>>> {
        self.base.wait_for_visible(&Locator::css(FEED_CONTAINER)).await?;
        self.base.wait_for_all_visible(&Locator::css(POST_ITEMS)).await
    }

    /// Script-click the first post's full-post link and return the post
    pub async fn open_first_post(&self) -> Result<Arc<dyn ElementRef>> {
        let posts = self.get_all_posts().await?;
        let first = posts
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found("no posts in the feed"))?;

        let post = Element::cached(Arc::clone(self.base.page()), Arc::clone(&first), self.base.wait());
        let link = post.resolve_within(&Locator::css(POST_LINK)).await?;
        Link::from_handle(Arc::clone(self.base.page()), link, self.base.wait())
            .js_click()
            .await?;

        info!(post_id = %first.id(), "Opened first post");
        Ok(first)
    }

    // Reporting

    pub async fn click_post_overflow_menu(&self) -> Result<()> {
        self.base.button(By::css(OVERFLOW_MENU)).click().await
    }

    pub async fn click_post_overflow_report(&self) -> Result<()> {
        self.shadow_button(OVERFLOW_MENU, OVERFLOW_REPORT).click().await
    }

    pub async fn click_report_spam_button(&self) -> Result<()> {
        self.shadow_button(REPORT_REASONS, REPORT_SPAM_REASON).click().await
    }

    pub async fn click_next_report_button(&self) -> Result<()> {
        self.shadow_button(REPORT_REASONS, REPORT_ACTION_BUTTON).js_click().await
    }

    pub async fn click_category_of_spam(&self) -> Result<()> {
        self.shadow_button(REPORT_SPAM_STEP, REPORT_SPAM_CATEGORY).click().await
    }

    pub async fn click_send_report_button(&self) -> Result<()> {
        self.shadow_button(REPORT_SPAM_STEP, REPORT_ACTION_BUTTON).js_click().await
    }

    /// Success plate shown after the report is sent
    pub async fn is_report_sent(&self) -> Result<bool> {
        self.base.button(By::css(REPORT_SUCCESS)).is_visible().await
    }

    // Left navigation

    /// Open the side bar unless it is already displayed
    pub async fn expand_side_bar(&self) -> Result<()> {
        let side_bar = self.base.wait().for_present(self.base.page().as_ref(), &Locator::css(SIDE_BAR)).await?;
        if side_bar.is_displayed().await? {
            debug!("Side bar already expanded");
            return Ok(());
        }
        self.base.button(By::css(SIDE_BAR_BUTTON)).click().await
    }

    /// Follow the left-nav entry tracked as `name` ("home", "popular", "all")
    pub async fn click_category_button(&self, name: &str) -> Result<()> {
        let inner = format!("faceplate-tracker[noun='{}'] a", name);
        self.base
            .link(Locator::in_shadow_of(By::css(LEFT_NAV), By::css(inner)))
            .js_click()
            .await
    }

    /// The current URL reaches the href of the left-nav entry `name` within the bound
    pub async fn check_active_page(&self, name: &str) -> Result<bool> {
        let entry = self.shadow_button(LEFT_NAV, &format!("#{}-posts", name));
        let anchor = entry.element().resolve_within(&Locator::css("a[href]")).await?;
        let href = anchor.property("href").await?.unwrap_or_default();
        if href.is_empty() {
            return Ok(false);
        }

        match self.base.wait_for_url_contains(&href).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found_or_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // Account

    pub async fn click_user_menu_button(&self) -> Result<()> {
        self.base.button(By::css(USER_MENU_BUTTON)).click().await
    }

    pub async fn click_logout_button(&self) -> Result<()> {
        self.base.button(By::css(LOGOUT_BUTTON)).click().await
    }

    /// Log-in affordance shown to anonymous visitors
    pub async fn is_login_button_visible(&self) -> Result<bool> {
        self.base.button(By::css(LOGIN_BUTTON)).is_visible().await
    }

    pub async fn click_create_post(&self) -> Result<()> {
        self.base.button(By::css(CREATE_POST_BUTTON)).click().await
    }

    // Hiding

    /// Hide the first post through its overflow menu and return its id
    pub async fn hide_first_post(&self) -> Result<String> {
        let first = self
            .get_all_posts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found("no posts in the feed"))?;
        let post_id = first
            .attribute("id")
            .await?
            .ok_or_else(|| Error::element_not_found("first post has no id"))?;

        let page = Arc::clone(self.base.page());
        let wait = self.base.wait();
        let post = Element::cached(Arc::clone(&page), first, wait);

        let menu = post.resolve_within(&Locator::css(OVERFLOW_MENU)).await?;
        Button::from_handle(Arc::clone(&page), menu, wait).click().await?;

        let hide = post
            .resolve_within(&Locator::css(OVERFLOW_MENU).shadow().css_within(OVERFLOW_HIDE))
            .await?;
        Button::from_handle(page, hide, wait).click().await?;

        info!(post_id = %post_id, "Hid post");
        if let Ok(mut last) = self.last_hidden.lock() {
            *last = Some(post_id.clone());
        }
        Ok(post_id)
    }

    /// Id returned by the last [`FeedPage::hide_first_post`]
    pub fn last_hidden_post(&self) -> Option<String> {
        self.last_hidden.lock().ok().and_then(|last| last.clone())
    }

    /// The post `post_id` is gone or not displayed within the bound
    pub async fn is_post_hidden(&self, post_id: &str) -> Result<bool> {
        let locator = Locator::css(format!("shreddit-post[id='{}']", post_id));
        let page = self.base.page().as_ref();
        let locator = &locator;
        let outcome = self
            .base
            .wait()
            .until_true(&format!("{} to be hidden", locator), || async move {
                match locator.find_first(page).await? {
                    Some(post) => Ok(!post.is_displayed().await?),
                    None => Ok(true),
                }
            })
            .await;

        match outcome {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found_or_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{MockNode, MockPage};
    use std::time::Duration;

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(150), Duration::from_millis(10))
    }

    fn post(id: &str) -> (MockNode, MockNode) {
        let post = MockNode::new("shreddit-post")
            .attr("id", id)
            .matches(By::css(format!("shreddit-post[id='{}']", id)));
        let link = MockNode::new("a").matches(By::css(POST_LINK));
        post.child(link.clone());
        (post, link)
    }

    fn feed(mock: &MockPage, ids: &[&str]) -> Vec<(MockNode, MockNode)> {
        let feed = MockNode::new("shreddit-feed");
        let posts: Vec<_> = ids.iter().map(|id| post(id)).collect();
        for (node, _) in &posts {
            feed.child(node.clone());
        }
        mock.root().child(feed);
        posts
    }

    #[tokio::test]
    async fn test_open_first_post_clicks_its_own_link() {
        let mock = MockPage::new("https://www.reddit.com/");
        let posts = feed(&mock, &["t3_first", "t3_second"]);
        let page = FeedPage::new(Arc::new(mock), quick());

        let opened = page.open_first_post().await.unwrap();

        assert_eq!(opened.attribute("id").await.unwrap().as_deref(), Some("t3_first"));
        assert_eq!(posts[0].1.js_clicks(), 1);
        assert_eq!(posts[1].1.js_clicks(), 0);
    }

    #[tokio::test]
    async fn test_open_first_post_on_empty_feed() {
        let mock = MockPage::new("https://www.reddit.com/");
        feed(&mock, &[]);
        let page = FeedPage::new(Arc::new(mock), quick());

        assert!(matches!(page.open_first_post().await, Err(Error::ElementNotFound(_))));
    }

    #[tokio::test]
    async fn test_report_flow() {
        let mock = MockPage::new("https://www.reddit.com/");

        let menu = MockNode::new("shreddit-post-overflow-menu");
        let report = MockNode::new("li").matches(By::css(OVERFLOW_REPORT));
        menu.shadow_child(report.clone());

        let reasons = MockNode::new("div").matches(By::css(REPORT_REASONS));
        let spam = MockNode::new("label").matches(By::css(REPORT_SPAM_REASON));
        let next = MockNode::new("button").matches(By::css(REPORT_ACTION_BUTTON));
        reasons.shadow_child(spam.clone()).shadow_child(next.clone());

        let spam_step = MockNode::new("div").matches(By::css(REPORT_SPAM_STEP));
        let category = MockNode::new("label").matches(By::css(REPORT_SPAM_CATEGORY));
        let send = MockNode::new("button").matches(By::css(REPORT_ACTION_BUTTON));
        spam_step.shadow_child(category.clone()).shadow_child(send.clone());

        let success = MockNode::new("div").matches(By::css(REPORT_SUCCESS)).hidden();
        let shown = success.clone();
        let send = send.on_click(move || shown.set_displayed(true));

        mock.root()
            .child(menu.clone())
            .child(reasons)
            .child(spam_step)
            .child(success);

        let page = FeedPage::new(Arc::new(mock), quick());
        page.click_post_overflow_menu().await.unwrap();
        page.click_post_overflow_report().await.unwrap();
        page.click_report_spam_button().await.unwrap();
        page.click_next_report_button().await.unwrap();
        page.click_category_of_spam().await.unwrap();
        assert!(!page.is_report_sent().await.unwrap());
        page.click_send_report_button().await.unwrap();

        assert!(page.is_report_sent().await.unwrap());
        assert_eq!(menu.clicks(), 1);
        assert_eq!(report.clicks(), 1);
        assert_eq!(spam.clicks(), 1);
        assert_eq!(next.js_clicks(), 1);
        assert_eq!(category.clicks(), 1);
        assert_eq!(send.js_clicks(), 1);
    }

    fn left_nav(mock: &MockPage, name: &str, href: &str) -> MockNode {
        let nav = MockNode::new(LEFT_NAV);

        let tracker = MockNode::new("faceplate-tracker").attr("noun", name);
        let target = mock.clone();
        let destination = href.to_string();
        let link = MockNode::new("a")
            .matches(By::css(format!("faceplate-tracker[noun='{}'] a", name)))
            .on_click(move || target.set_url(destination.clone()));
        tracker.child(link.clone());

        let entry = MockNode::new("li").attr("id", format!("{}-posts", name));
        entry.child(MockNode::new("a").matches(By::css("a[href]")).prop("href", href));

        nav.shadow_child(tracker).shadow_child(entry);
        mock.root().child(nav);
        link
    }

    #[tokio::test]
    async fn test_side_bar_navigation() {
        let mock = MockPage::new("https://www.reddit.com/");
        let side_bar = MockNode::new("nav").attr("id", "flex-left-nav-contents").hidden();
        let shown = side_bar.clone();
        let toggle = MockNode::new("button")
            .attr("id", "navbar-menu-button")
            .on_click(move || shown.set_displayed(true));
        mock.root().child(side_bar.clone()).child(toggle.clone());
        let link = left_nav(&mock, "popular", "https://www.reddit.com/r/popular/");

        let page = FeedPage::new(Arc::new(mock), quick());
        page.expand_side_bar().await.unwrap();
        page.expand_side_bar().await.unwrap();
        assert_eq!(toggle.clicks(), 1);

        page.click_category_button("popular").await.unwrap();
        assert_eq!(link.js_clicks(), 1);
        assert!(page.check_active_page("popular").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_active_page_mismatch() {
        let mock = MockPage::new("https://www.reddit.com/");
        left_nav(&mock, "all", "https://www.reddit.com/r/all/");

        let page = FeedPage::new(Arc::new(mock), quick());
        assert!(!page.check_active_page("all").await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_shows_login_button() {
        let mock = MockPage::new("https://www.reddit.com/");
        let login = MockNode::new("a").attr("id", "login-button").hidden();
        let drawer_item = MockNode::new("li").attr("id", "logout-list-item").hidden();

        let shown = drawer_item.clone();
        let menu = MockNode::new("button")
            .attr("id", "expand-user-drawer-button")
            .on_click(move || shown.set_displayed(true));
        let logged_out = login.clone();
        let drawer_item = drawer_item.on_click(move || logged_out.set_displayed(true));

        mock.root().child(menu).child(drawer_item).child(login);

        let page = FeedPage::new(Arc::new(mock), quick());
        assert!(!page.is_login_button_visible().await.unwrap());
        page.click_user_menu_button().await.unwrap();
        page.click_logout_button().await.unwrap();
        assert!(page.is_login_button_visible().await.unwrap());
    }

    #[tokio::test]
    async fn test_hide_first_post() {
        let mock = MockPage::new("https://www.reddit.com/");
        let posts = feed(&mock, &["t3_hidden", "t3_kept"]);

        let (first, _) = &posts[0];
        let menu = MockNode::new("shreddit-post-overflow-menu");
        let hidden_post = first.clone();
        let hide = MockNode::new("li")
            .matches(By::css(OVERFLOW_HIDE))
            .on_click(move || hidden_post.set_displayed(false));
        menu.shadow_child(hide.clone());
        first.child(menu.clone());

        let page = FeedPage::new(Arc::new(mock), quick());
        assert!(!page.is_post_hidden("t3_hidden").await.unwrap());

        let id = page.hide_first_post().await.unwrap();
        assert_eq!(id, "t3_hidden");
        assert_eq!(page.last_hidden_post().as_deref(), Some("t3_hidden"));
        assert_eq!(menu.clicks(), 1);
        assert_eq!(hide.clicks(), 1);
        assert!(page.is_post_hidden("t3_hidden").await.unwrap());
        assert!(!page.is_post_hidden("t3_kept").await.unwrap());
    }
}
