//! Single post: comments and voting

use std::sync::Arc;

use tracing::{debug, info};

use super::BasePage;
use crate::elements::{Button, Clickable, Comment, Editable, Input, UiElement};
use crate::locator::{By, Locator};
use crate::session::PageContext;
use crate::wait::Wait;
use crate::{Error, Result};

pub const POST_HOST: &str = "shreddit-post";
pub const UPVOTE_BUTTON: &str = "button[upvote]";
pub const DOWNVOTE_BUTTON: &str = "button[downvote]";
pub const VOTE_COUNT: &str = "faceplate-number";
pub const ADD_COMMENT_BUTTON: &str = "[noun='add_comment_button']";
pub const COMMENT_INPUT: &str = "#main-content shreddit-composer > div:nth-child(1)";
pub const SUBMIT_COMMENT_BUTTON: &str = "button[slot='submit-button']";

#[derive(Debug, Clone)]
pub struct PostPage {
    base: BasePage,
}

impl PostPage {
    pub fn new(page: Arc<dyn PageContext>, wait: Wait) -> Self {
        Self::from_base(BasePage::new(page, wait))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    fn in_post(&self, inner: &str) -> Button {
        self.base.button(Locator::in_shadow_of(By::css(POST_HOST), By::css(inner)))
    }

    fn upvote_button(&self) -> Button {
        self.in_post(UPVOTE_BUTTON)
    }

    fn downvote_button(&self) -> Button {
        self.in_post(DOWNVOTE_BUTTON)
    }

    // Comments

    pub async fn click_add_comment_button(&self) -> Result<()> {
        let button = self
            .base
            .wait_for_clickable(&Locator::css(ADD_COMMENT_BUTTON))
            .await?;
        self.base.scroll_to_center(button.as_ref()).await?;
        button.click().await
    }

    pub async fn enter_comment_text(&self, text: &str) -> Result<()> {
        let field = self.base.wait_for_visible(&Locator::css(COMMENT_INPUT)).await?;
        Input::from_handle(Arc::clone(self.base.page()), field, self.base.wait())
            .with_typing_delay(self.base.typing_delay())
            .send_keys(text)
            .await
    }

    pub async fn click_submit_comment_button(&self) -> Result<()> {
        self.base
            .wait_for_clickable(&Locator::css(SUBMIT_COMMENT_BUTTON))
            .await?
            .click()
            .await
    }

    /// Comment by `author`, located lazily
    pub fn find_comment(&self, author: &str) -> Comment {
        Comment::by_author(Arc::clone(self.base.page()), author, self.base.wait())
    }

    /// A comment by `author` shows up and its body reads exactly `expected`
    pub async fn is_comment_visible(&self, author: &str, expected: &str) -> Result<bool> {
        let comment = self.find_comment(author);
        if !comment.is_visible().await? {
            debug!(author = %author, "No visible comment");
            return Ok(false);
        }

        match comment.text().await {
            Ok(text) => Ok(text == expected),
            Err(e) if e.is_not_found_or_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // Voting

    pub async fn upvote_post(&self) -> Result<()> {
        self.upvote_button().click().await?;
        self.base
            .wait()
            .until_true("upvote to be pressed", || self.is_upvoted())
            .await?;
        info!("Post upvoted");
        Ok(())
    }

    pub async fn downvote_post(&self) -> Result<()> {
        self.downvote_button().click().await?;
        self.base
            .wait()
            .until_true("downvote to be pressed", || self.is_downvoted())
            .await?;
        info!("Post downvoted");
        Ok(())
    }

    pub async fn is_upvoted(&self) -> Result<bool> {
        is_pressed(&self.upvote_button()).await
    }

    pub async fn is_downvoted(&self) -> Result<bool> {
        is_pressed(&self.downvote_button()).await
    }

    /// Withdraw whichever vote is pressed
    pub async fn reset_vote(&self) -> Result<()> {
        if self.is_upvoted().await? {
            self.upvote_button().click().await?;
            self.base
                .wait()
                .until_true("upvote to be released", || async move { Ok(!self.is_upvoted().await?) })
                .await
        } else if self.is_downvoted().await? {
            self.downvote_button().click().await?;
            self.base
                .wait()
                .until_true("downvote to be released", || async move { Ok(!self.is_downvoted().await?) })
                .await
        } else {
            Ok(())
        }
    }

    /// Displayed score. Abbreviated text ("1.2K") defers to the `number` attribute.
    pub async fn get_vote_count(&self) -> Result<i64> {
        let counter = self.in_post(VOTE_COUNT);
        let text = counter.text().await?;
        if let Some(count) = parse_vote_count(&text) {
            return Ok(count);
        }

        let number = counter.attribute("number").await?.unwrap_or_default();
        parse_vote_count(&number)
            .ok_or_else(|| Error::internal(format!("unreadable vote count {:?}", text.trim())))
    }
}

async fn is_pressed(button: &Button) -> Result<bool> {
    Ok(button.attribute("aria-pressed").await?.as_deref() == Some("true"))
}

/// Digits and minus signs only; `None` for abbreviated or empty counts
fn parse_vote_count(text: &str) -> Option<i64> {
    if text.chars().any(|c| c.is_alphabetic() || c == '.') {
        return None;
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
    digits.parse().ok()
}
