use serde::{Deserialize, Serialize};

/// Typed view over the handful of fields the cleaner reads from a raw
/// RapidAPI payload. Everything else in the payload is ignored.
///
/// Every field is required: a payload missing any of them fails to
/// deserialize rather than producing a defaulted record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTweetRecord {
    pub user: RawUser,
    pub tweet: RawTweet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub legacy: UserLegacy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLegacy {
    pub profile_image_url_https: String,
    pub screen_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTweet {
    /// Twitter's legacy timestamp, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
    pub created_at: String,
    pub favorite_count: u64,
    pub bookmark_count: u64,
    pub retweet_count: u64,
    pub full_text: String,
    pub conversation_id_str: String,
}

/// Flat, display-ready projection of a tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanTweetRecord {
    pub profile_img: String,
    pub username: String,
    /// Human date such as `10th October 2018`.
    pub created_at: String,
    pub likes: u64,
    pub bookmarks: u64,
    pub reposts: u64,
    pub content: String,
    pub tweet_url: String,
}

impl CleanTweetRecord {
    /// Display handle: `@` plus the lowercased username with whitespace removed.
    pub fn handle(&self) -> String {
        let compact: String = self
            .username
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        format!("@{}", compact.to_lowercase())
    }
}

/// Canonical X status URL for a tweet.
pub fn status_url(screen_name: &str, conversation_id: &str) -> String {
    format!("https://x.com/{screen_name}/status/{conversation_id}")
}
