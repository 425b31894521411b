use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile image shown when a user has not supplied one.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

/// Header image shown when a user has not supplied one.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Upper bound on message text, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

/// Number of messages on the home feed and on a profile page.
pub const FEED_LIMIT: u32 = 100;

pub type UserId = i64;
pub type MessageId = i64;

/// A registered user. The password hash never leaves the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A posted message, joined with the author fields every listing needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub author_username: String,
    pub author_image_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Counters shown on a profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub messages: u64,
    pub following: u64,
    pub followers: u64,
    pub likes: u64,
}

/// Outcome of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikedState {
    Liked,
    Unliked,
}

impl LikedState {
    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}

/// Fields replaced by a profile edit. Image URLs are already resolved to
/// their defaults when the user left them blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
}
