//! Per-account cookie persistence
//!
//! One JSON file per account under the cookie directory:
//!
//! ```json
//! { "account": "someone", "saved_at": "2026-01-01T10:00:00+00:00", "cookies": [ ... ] }
//! ```
//!
//! [`CookieStore::init`] creates the directory and must run before any other call.
//! Files carry no expiry check, no encryption and no locking.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::session::{Cookie, NavigationOptions, PageContext};
use crate::Result;

/// Cookie file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieFile {
    pub account: String,
    /// RFC 3339 timestamp of the save
    pub saved_at: String,
    pub cookies: Vec<Cookie>,
}

/// Cookie directory bound to the site the cookies belong to
#[derive(Debug, Clone)]
pub struct CookieStore {
    dir: PathBuf,
    base_url: String,
    navigation: NavigationOptions,
}

impl CookieStore {
    /// Create `dir` if needed. Safe to call repeatedly.
    pub async fn init(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Cookie directory ready");

        Ok(Self {
            dir,
            base_url: base_url.into(),
            navigation: NavigationOptions::default(),
        })
    }

    pub fn with_navigation(mut self, navigation: NavigationOptions) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `account`'s cookies
    pub fn path_for(&self, account: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(account)))
    }

    /// Write the page's current cookies to `account`'s file
    pub async fn save(&self, page: &dyn PageContext, account: &str) -> Result<PathBuf> {
        let cookies = page.get_cookies().await?;
        let file = CookieFile {
            account: account.to_string(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            cookies,
        };

        let path = self.path_for(account);
        fs::write(&path, serde_json::to_vec_pretty(&file)?).await?;
        info!(
            account = %account,
            count = file.cookies.len(),
            path = %path.display(),
            "Saved cookies"
        );
        Ok(path)
    }

    /// Attach `account`'s saved cookies and refresh.
    ///
    /// Returns `false` without touching the page when no file exists. Otherwise the
    /// page is first sent to the site root, since cookies only attach on their domain.
    pub async fn load(&self, page: &dyn PageContext, account: &str) -> Result<bool> {
        let path = self.path_for(account);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(account = %account, "No saved cookies");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        let file: CookieFile = serde_json::from_slice(&bytes)?;

        page.navigate(&self.base_url, self.navigation.clone()).await?;
        for cookie in &file.cookies {
            page.set_cookie(cookie).await?;
        }
        page.reload(self.navigation.clone()).await?;

        info!(
            account = %account,
            count = file.cookies.len(),
            saved_at = %file.saved_at,
            "Loaded cookies"
        );
        Ok(true)
    }

    /// Delete `account`'s file; `false` when there was none
    pub async fn clear(&self, account: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(account)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Account name as a file stem: anything outside `[A-Za-z0-9._@-]` becomes `_`
pub(crate) fn file_stem(account: &str) -> String {
    let stem: String = account
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match stem.trim_start_matches('.') {
        "" => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}
