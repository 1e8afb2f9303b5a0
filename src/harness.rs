//! Per-test session fixture
//!
//! [`TestSession::start`] attaches to the browser, opens a page sized to the configured
//! viewport and loads the login URL. Page objects are handed out already wired to the
//! session's page, wait bounds and typing pace. [`TestSession::finish`] closes everything.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::cdp::CdpBrowserImpl;
use crate::config::{Account, HarnessConfig};
use crate::cookies::{file_stem, CookieStore};
use crate::pages::{BasePage, CommunityPage, CreatePostPage, FeedPage, LoginPage, PostPage};
use crate::session::{
    BrowserContext, BrowserContextImpl, BrowserOptions, NavigationOptions, PageContext, PageOptions,
};
use crate::wait::Wait;
use crate::{Error, Result};

/// How [`TestSession::authorize`] got the session signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Saved cookies were attached and the login page let the session through
    Cookies,
    /// Credentials were typed into the login form
    Credentials,
    /// No cookie file, but the page was not on the login screen either
    AlreadySignedIn,
}

/// One browser page for the duration of a test
#[derive(Debug)]
pub struct TestSession {
    config: HarnessConfig,
    browser: Arc<dyn BrowserContext>,
    page: Arc<dyn PageContext>,
    cookies: CookieStore,
}

impl TestSession {
    /// Attach to the browser at `config.cdp_endpoint` and open the login page
    pub async fn start(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let options = BrowserOptions {
            cdp_endpoint: config.cdp_endpoint.clone(),
            user_agent: None,
        };
        let cdp_browser = Arc::new(CdpBrowserImpl::new(config.cdp_endpoint.clone()));
        let browser: Arc<dyn BrowserContext> = Arc::new(BrowserContextImpl::new(options, cdp_browser));
        Self::from_parts(config, browser).await
    }

    /// Same as [`TestSession::start`] over an existing browser context
    pub async fn from_parts(config: HarnessConfig, browser: Arc<dyn BrowserContext>) -> Result<Self> {
        let cookies = CookieStore::init(&config.cookie_dir, config.base_url.clone()).await?;

        let page = browser
            .create_page(PageOptions {
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
                ..PageOptions::default()
            })
            .await?;
        page.set_viewport(config.viewport_width, config.viewport_height, 1.0)
            .await?;
        page.navigate(&config.login_url, NavigationOptions::default()).await?;

        info!(
            browser_id = %browser.id(),
            page_id = %page.id(),
            url = %config.login_url,
            "Test session started"
        );

        Ok(Self {
            config,
            browser,
            page,
            cookies,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }

    pub fn browser(&self) -> &Arc<dyn BrowserContext> {
        &self.browser
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    pub fn wait(&self) -> Wait {
        self.config.element_wait()
    }

    pub fn base_page(&self) -> BasePage {
        BasePage::new(Arc::clone(&self.page), self.wait()).with_typing_delay(self.config.typing_delay())
    }

    pub fn login_page(&self) -> LoginPage {
        LoginPage::from_base(self.base_page()).with_login_timeout(self.config.login_timeout())
    }

    pub fn feed_page(&self) -> FeedPage {
        FeedPage::from_base(self.base_page())
    }

    pub fn post_page(&self) -> PostPage {
        PostPage::from_base(self.base_page())
    }

    pub fn create_post_page(&self) -> CreatePostPage {
        CreatePostPage::from_base(self.base_page())
    }

    pub fn community_page(&self) -> CommunityPage {
        CommunityPage::from_base(self.base_page())
    }

    /// Sign `account` in: saved cookies first, the login form otherwise.
    ///
    /// Loaded cookies only count once the login URL redirects away from the login page
    /// or no longer shows the form; stale or empty cookie files fall through to the
    /// credential login. A cookie file that cannot be read counts as absent. After a
    /// credential login that leaves the login page, the fresh cookies are saved.
    pub async fn authorize(&self, account: &Account) -> Result<AuthMethod> {
        let key = account.cookie_key();
        let loaded = match self.cookies.load(self.page.as_ref(), key).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(account = %key, "Ignoring saved cookies: {}", e);
                false
            }
        };

        if loaded {
            if self.signed_in_at_login_url().await? {
                return Ok(AuthMethod::Cookies);
            }
            info!(account = %key, "Saved cookies did not sign in, using credentials");
        } else if !self.page.current_url().await?.contains("/login") {
            return Ok(AuthMethod::AlreadySignedIn);
        }

        if !account.is_complete() {
            return Err(Error::configuration(format!(
                "credentials for {:?} are not configured",
                key
            )));
        }

        let login = self.login_page();
        if !login.is_username_field_visible().await? {
            return Err(Error::element_not_found("login form did not show up"));
        }
        login.login(&account.username, &account.password).await?;

        let url = self.page.current_url().await?;
        if url.contains("/login") {
            return Err(Error::navigation_failed(format!("still on {} after login", url)));
        }

        self.cookies.save(self.page.as_ref(), key).await?;
        Ok(AuthMethod::Credentials)
    }

    /// Open the login URL and report whether the site treats the visitor as signed in
    async fn signed_in_at_login_url(&self) -> Result<bool> {
        self.page
            .navigate(&self.config.login_url, NavigationOptions::default())
            .await?;

        let wait = self.wait().with_timeout(self.config.login_timeout());
        match wait
            .for_url(self.page.as_ref(), "login page to redirect", |url| !url.contains("/login"))
            .await
        {
            Ok(url) => {
                debug!(url = %url, "Login page redirected");
                Ok(true)
            }
            Err(Error::Timeout(_)) => Ok(!self.login_page().is_username_field_visible().await?),
            Err(e) => Err(e),
        }
    }

    /// Screenshot into the artifacts directory, named after `name`
    pub async fn capture_failure(&self, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.artifacts_dir).await?;

        let png = self.page.screenshot().await?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let path = self
            .config
            .artifacts_dir
            .join(format!("{}-{}.png", file_stem(name), stamp));
        fs::write(&path, png).await?;

        warn!(path = %path.display(), "Saved failure screenshot");
        Ok(path)
    }

    /// Close the page, then the browser connection
    pub async fn finish(self) -> Result<()> {
        if let Err(e) = self.page.close().await {
            warn!(page_id = %self.page.id(), "Page did not close cleanly: {}", e);
        }
        self.browser.close().await?;
        info!(browser_id = %self.browser.id(), "Test session finished");
        Ok(())
    }
}
