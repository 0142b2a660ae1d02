// src/models/article.rs

//! Article, corpus and per-friend outcome structures.

use serde::{Deserialize, Serialize};

use crate::models::{CacheMutation, Friend, SourceOrigin};

/// A single aggregated blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,

    /// Canonical `YYYY-MM-DD HH:MM` (UTC+8), or empty when unknown
    #[serde(default)]
    pub created: String,

    /// Post URL after link sanitization; unique within a corpus
    #[serde(default)]
    pub link: String,

    /// Friend name
    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub avatar: String,
}

/// Aggregate run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub friends_num: usize,
    pub active_num: usize,
    pub error_num: usize,
    pub article_num: usize,
    pub last_updated_time: String,
}

/// The published article corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(rename = "statistical_data", default)]
    pub statistics: Statistics,

    #[serde(rename = "article_data", default)]
    pub articles: Vec<Article>,
}

impl Corpus {
    /// Re-sync `article_num` with the article list.
    pub fn refresh_count(&mut self) {
        self.statistics.article_num = self.articles.len();
    }
}

/// Terminal status of one friend's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Active,
    Error,
}

/// Result of resolving a single friend.
#[derive(Debug, Clone)]
pub struct FriendOutcome {
    pub friend: Friend,
    pub status: FriendStatus,
    pub articles: Vec<Article>,
    /// Feed URL that was ultimately used, if any
    pub feed_url: Option<String>,
    /// Discovery label (`atom`, `feed`, ...), `specific` or `none`
    pub feed_type: String,
    /// Origin of the feed URL that was ultimately used
    pub source_used: Option<SourceOrigin>,
    pub cache_mutation: CacheMutation,
}

impl FriendOutcome {
    pub fn is_active(&self) -> bool {
        self.status == FriendStatus::Active
    }

    /// Outcome for a friend whose resolution never finished.
    pub fn failed(friend: Friend) -> Self {
        Self {
            friend,
            status: FriendStatus::Error,
            articles: Vec::new(),
            feed_url: None,
            feed_type: "none".to_string(),
            source_used: None,
            cache_mutation: CacheMutation::None,
        }
    }
}
