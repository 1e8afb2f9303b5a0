//! Live user journeys against the real site.
//!
//! Each scenario authenticates, runs one journey and checks its postconditions. They need
//! a Chrome on `REDDIT_POM_CDP_ENDPOINT` and the primary account's credentials; without
//! either they skip. Run them one at a time (`--test-threads=1`): they share one account.

mod common;

use reddit_pom::config::HarnessConfig;
use reddit_pom::pages::create_post::DEFAULT_POST_TEXT;
use reddit_pom::{AuthMethod, Result, TestSession};

const COMMENT_TEXT: &str = "lol";
const COMMUNITY: &str = "rust";

/// Configuration when Chrome and credentials are both available
async fn live(label: &str) -> Option<HarnessConfig> {
    if !common::chrome_available().await {
        eprintln!("Skipping test: Chrome not available");
        return None;
    }
    let config = common::live_config(label);
    if !common::credentials_available(&config) {
        eprintln!("Skipping test: REDDIT_POM_USERNAME / REDDIT_POM_PASSWORD not set");
        return None;
    }
    reddit_pom::logging::init_tracing("info");
    Some(config)
}

/// Save a screenshot if the journey failed, tear the session down, then report
async fn conclude(session: TestSession, name: &str, outcome: Result<()>) {
    if outcome.is_err() {
        if let Ok(path) = session.capture_failure(name).await {
            eprintln!("Screenshot: {}", path.display());
        }
    }
    session.finish().await.unwrap();
    outcome.unwrap();
}

#[tokio::test]
async fn test_successful_login() {
    let Some(config) = live("login").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        let login = session.login_page();
        if !login.is_username_field_visible().await? {
            eprintln!("Skipping test: browser profile is already signed in");
            return Ok(());
        }
        login.login(&config.account.username, &config.account.password).await?;

        let url = login.base().current_url().await?;
        assert!(!url.contains("login"), "still on the login page: {}", url);
        Ok(())
    }
    .await;
    conclude(session, "successful_login", outcome).await;
}

#[tokio::test]
async fn test_unsuccessful_login() {
    let Some(config) = live("bad-login").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        let login = session.login_page();
        if !login.is_username_field_visible().await? {
            eprintln!("Skipping test: browser profile is already signed in");
            return Ok(());
        }
        let bad = &config.invalid_account;
        login.login(&bad.username, &bad.password).await?;

        let url = login.base().current_url().await?;
        assert!(
            url.contains("login") || url.contains("error"),
            "expected to stay on the login page, got {}",
            url
        );
        Ok(())
    }
    .await;
    conclude(session, "unsuccessful_login", outcome).await;
}

#[tokio::test]
async fn test_successful_logout() {
    let Some(config) = live("logout").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;

        feed.click_user_menu_button().await?;
        feed.click_logout_button().await?;

        assert!(feed.is_login_button_visible().await?, "no login button after logout");
        Ok(())
    }
    .await;
    conclude(session, "successful_logout", outcome).await;

    // The saved cookies belong to the session that just ended
    let cookies = reddit_pom::cookies::CookieStore::init(&config.cookie_dir, config.base_url.clone())
        .await
        .unwrap();
    cookies.clear(config.account.cookie_key()).await.unwrap();
}

#[tokio::test]
async fn test_add_comment() {
    let Some(config) = live("comment").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;
        feed.open_first_post().await?;

        let post = session.post_page();
        post.click_add_comment_button().await?;
        post.enter_comment_text(COMMENT_TEXT).await?;
        post.click_submit_comment_button().await?;

        let author = &config.account.display_name;
        assert!(
            post.is_comment_visible(author, COMMENT_TEXT).await?,
            "comment by {} not found under the post",
            author
        );
        Ok(())
    }
    .await;
    conclude(session, "add_comment", outcome).await;
}

#[tokio::test]
async fn test_upvote_increments_count() {
    let Some(config) = live("upvote").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;
        feed.open_first_post().await?;

        let post = session.post_page();
        post.reset_vote().await?;
        let before = post.get_vote_count().await?;

        post.upvote_post().await?;
        let pressed = post.is_upvoted().await?;
        let after = post.get_vote_count().await?;
        post.reset_vote().await?;

        assert!(pressed, "upvote button is not pressed");
        assert_eq!(after, before + 1);
        Ok(())
    }
    .await;
    conclude(session, "upvote", outcome).await;
}

#[tokio::test]
async fn test_cookie_round_trip() {
    let Some(config) = live("cookies").await else {
        return;
    };

    let first = TestSession::start(config.clone()).await.unwrap();
    let outcome: Result<()> = async {
        first.authorize(&config.account).await?;
        assert!(first.cookies().path_for(config.account.cookie_key()).exists());
        Ok(())
    }
    .await;
    conclude(first, "cookie_save", outcome).await;

    let second = TestSession::start(config.clone()).await.unwrap();
    let outcome: Result<()> = async {
        let method = second.authorize(&config.account).await?;
        assert_eq!(method, AuthMethod::Cookies);

        // A signed-in visitor is bounced off the login page
        let base = second.base_page();
        base.open(&config.login_url).await?;
        let url = base.wait_for_url_not_contains("/login").await?;
        assert!(!url.contains("/login"), "cookies did not sign the session in: {}", url);
        Ok(())
    }
    .await;
    conclude(second, "cookie_load", outcome).await;
}

#[tokio::test]
async fn test_create_post() {
    let Some(config) = live("create-post").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;
        feed.click_create_post().await?;

        let author = &config.account.display_name;
        let create = session.create_post_page();
        create.click_community_picker_menu().await?;
        create.enter_username_text(author).await?;
        create.click_select_profile(author).await?;
        create.click_title().await?;
        create.enter_post_title_text(DEFAULT_POST_TEXT).await?;
        create.click_body().await?;
        create.enter_post_body_text(DEFAULT_POST_TEXT).await?;
        create.click_submit_post_button().await?;

        let url = create
            .base()
            .wait_for_url("profile or error page", |url| url.contains("user") || url.contains("error"))
            .await?;
        assert!(url.contains("user") || url.contains("error"), "unexpected URL {}", url);
        Ok(())
    }
    .await;
    conclude(session, "create_post", outcome).await;
}

#[tokio::test]
async fn test_send_report() {
    let Some(config) = live("report").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;

        feed.click_post_overflow_menu().await?;
        feed.click_post_overflow_report().await?;
        feed.click_report_spam_button().await?;
        feed.click_next_report_button().await?;
        feed.click_category_of_spam().await?;
        feed.click_send_report_button().await?;

        assert!(feed.is_report_sent().await?, "report was not sent");
        Ok(())
    }
    .await;
    conclude(session, "send_report", outcome).await;
}

#[tokio::test]
async fn test_side_bar_navigation() {
    let Some(config) = live("navigation").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let feed = session.feed_page();
        feed.base().open(&config.base_url).await?;

        for name in ["home", "popular", "all"] {
            feed.expand_side_bar().await?;
            feed.click_category_button(name).await?;
            assert!(feed.check_active_page(name).await?, "{} is not the active page", name);
        }
        Ok(())
    }
    .await;
    conclude(session, "side_bar_navigation", outcome).await;
}

#[tokio::test]
async fn test_subscribe_to_community() {
    let Some(config) = live("subscribe").await else {
        return;
    };
    let session = TestSession::start(config.clone()).await.unwrap();

    let outcome: Result<()> = async {
        session.authorize(&config.account).await?;
        let community = session.community_page();
        community.open_community(&config.base_url, COMMUNITY).await?;
        community.wait_for_subscribe_button().await?;

        let wait = session.wait();
        let community = &community;
        if community.is_subscribed().await {
            community.click_subscribe_button().await?;
            wait.until_true("leaving the community", move || async move {
                Ok(!community.is_subscribed().await)
            })
            .await?;
        }

        community.click_subscribe_button().await?;
        wait.until_true("joining the community", move || async move {
            Ok(community.is_subscribed().await)
        })
        .await?;

        assert!(community.is_subscribed().await);
        Ok(())
    }
    .await;
    conclude(session, "subscribe", outcome).await;
}
