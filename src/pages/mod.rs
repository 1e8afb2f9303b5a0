//! Page objects
//!
//! Each page wraps a [`BasePage`] and exposes the screen's actions as async methods.
//! Pages hold no session state beyond the page handle (the feed also remembers the last
//! post it hid); every call looks its elements up again.

pub mod base;
pub mod community;
pub mod create_post;
pub mod feed;
pub mod login;
pub mod post;

pub use base::BasePage;
pub use community::CommunityPage;
pub use create_post::CreatePostPage;
pub use feed::FeedPage;
pub use login::LoginPage;
pub use post::PostPage;
