//! Post composer

use std::sync::Arc;

use tracing::info;

use super::BasePage;
use crate::elements::{Button, Clickable, Editable, Input};
use crate::locator::{By, Locator};
use crate::session::{ElementRef, PageContext};
use crate::wait::Wait;
use crate::{Error, Result};

pub const COMMUNITY_PICKER: &str = "#post-submit-community-picker";
pub const PICKER_SEARCH: &str = "#search-input";
pub const PICKER_OPTION: &str = "li[data-select-value]";
pub const TITLE_FIELD: &str = "faceplate-textarea-input[name='title']";
pub const BODY_FIELD: &str = "shreddit-composer[id='post-composer_bodytext']";
pub const SUBMIT_HOST: &str = "#submit-post-button";
pub const SUBMIT_BUTTON: &str = "#inner-post-submit-button";

/// Title and body used when none is given
pub const DEFAULT_POST_TEXT: &str = "test1";

#[derive(Debug, Clone)]
pub struct CreatePostPage {
    base: BasePage,
}

impl CreatePostPage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self::from_base(BasePage::new(page, wait))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    fn title(&self) -> Input {
        self.base.input(By::css(TITLE_FIELD))
    }

    fn body(&self) -> Input {
        self.base.input(By::css(BODY_FIELD))
    }

    pub async fn click_community_picker_menu(&self) -> Result<()> {
        self.base.button(By::css(COMMUNITY_PICKER)).click().await
    }

    /// Search the picker for the user's own profile
    pub async fn enter_username_text(&self, username: &str) -> Result<()> {
        self.base
            .input(Locator::in_shadow_of(By::css(COMMUNITY_PICKER), By::css(PICKER_SEARCH)))
            .send_keys(&format!("u/{}", username))
            .await
    }

    /// Pick the first option whose `data-select-value` contains `profile`
    pub async fn click_select_profile(&self, profile: &str) -> Result<()> {
        let options = Locator::in_shadow_of(By::css(COMMUNITY_PICKER), By::css(PICKER_OPTION));
        let page = self.base.page().as_ref();
        let options = &options;
        let items: Vec<Arc<dyn ElementRef>> = self
            .base
            .wait()
            .until(&format!("options of {}", COMMUNITY_PICKER), || async move {
                let items = options.find_all(page).await?;
                Ok((!items.is_empty()).then_some(items))
            })
            .await?;

        for item in items {
            let value = item.attribute("data-select-value").await?.unwrap_or_default();
            if value.contains(profile) {
                info!(profile = %profile, "Selecting profile");
                return Button::from_handle(Arc::clone(self.base.page()), item, self.base.wait())
                    .click()
                    .await;
            }
        }

        Err(Error::element_not_found(format!("profile option {:?}", profile)))
    }

    pub async fn click_title(&self) -> Result<()> {
        self.title().click().await
    }

    pub async fn enter_post_title_text(&self, title: &str) -> Result<()> {
        self.title().send_keys(title).await
    }

    pub async fn click_body(&self) -> Result<()> {
        self.body().click().await
    }

    pub async fn enter_post_body_text(&self, body: &str) -> Result<()> {
        self.body().send_keys(body).await
    }

    /// Script click on the submit button inside its host's shadow tree
    pub async fn click_submit_post_button(&self) -> Result<()> {
        self.base
            .button(Locator::in_shadow_of(By::css(SUBMIT_HOST), By::css(SUBMIT_BUTTON)))
            .js_click()
            .await
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

    fn picker(mock: &MockPage, profiles: &[&str]) -> (MockNode, MockNode, Vec<MockNode>) {
        let host = MockNode::new("shreddit-post-flow-community-picker")
            .attr("id", "post-submit-community-picker");
        let search = MockNode::new("input").attr("id", "search-input");
        host.shadow_child(search.clone());

        let options: Vec<MockNode> = profiles
            .iter()
            .map(|profile| {
                MockNode::new("li")
                    .attr("data-select-value", *profile)
                    .matches(By::css(PICKER_OPTION))
            })
            .collect();
        for option in &options {
            host.shadow_child(option.clone());
        }
        mock.root().child(host.clone());
        (host, search, options)
    }

    #[tokio::test]
    async fn test_profile_selection() {
        let mock = MockPage::new("https://www.reddit.com/submit");
        let (host, search, options) = picker(&mock, &["r/rust", "u/No-Customer3367"]);
        let page = CreatePostPage::new(Arc::new(mock), quick());

        page.click_community_picker_menu().await.unwrap();
        page.enter_username_text("No-Customer3367").await.unwrap();
        page.click_select_profile("No-Customer3367").await.unwrap();

        assert_eq!(host.clicks(), 1);
        assert_eq!(search.value(), "u/No-Customer3367");
        assert_eq!(options[0].clicks(), 0);
        assert_eq!(options[1].clicks(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let mock = MockPage::new("https://www.reddit.com/submit");
        picker(&mock, &["r/rust"]);
        let page = CreatePostPage::new(Arc::new(mock), quick());

        let result = page.click_select_profile("No-Customer3367").await;
        assert!(matches!(result, Err(Error::ElementNotFound(_))));
    }

    #[tokio::test]
    async fn test_compose_and_submit() {
        let mock = MockPage::new("https://www.reddit.com/submit");
        let title = MockNode::new("faceplate-textarea-input").matches(By::css(TITLE_FIELD));
        let body = MockNode::new("shreddit-composer").matches(By::css(BODY_FIELD));
        let submit_host = MockNode::new("r-post-form-submit-button").attr("id", "submit-post-button");
        let target = mock.clone();
        let submit = MockNode::new("button")
            .attr("id", "inner-post-submit-button")
            .on_click(move || target.set_url("https://www.reddit.com/user/No-Customer3367/"));
        submit_host.shadow_child(submit.clone());
        mock.root().child(title.clone()).child(body.clone()).child(submit_host);

        let page = CreatePostPage::new(Arc::new(mock), quick());
        page.click_title().await.unwrap();
        page.enter_post_title_text(DEFAULT_POST_TEXT).await.unwrap();
        page.click_body().await.unwrap();
        page.enter_post_body_text(DEFAULT_POST_TEXT).await.unwrap();
        page.click_submit_post_button().await.unwrap();

        assert_eq!(title.value(), "test1");
        assert_eq!(body.value(), "test1");
        assert_eq!(submit.js_clicks(), 1);
        assert!(page.base().current_url().await.unwrap().contains("user"));
    }
}
