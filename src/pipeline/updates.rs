// src/pipeline/updates.rs

//! Newest-post detection for a single blog.
//!
//! Compares the latest entries of a blog's feed with the snapshot stored on
//! the previous check, and reports the entries that were not seen before.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::{FeedDiscovery, FeedEntry, FeedReader};
use crate::storage::{DocumentStore, save_json};
use crate::utils::http::HttpFetch;

/// Stored snapshot of the latest entries of a blog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub articles: Vec<FeedEntry>,
}

impl Snapshot {
    /// Load a snapshot; missing or unreadable documents count as empty.
    pub async fn load(store: &dyn DocumentStore, key: &str) -> Self {
        match store.load(key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("Snapshot {key} is corrupt, treating as empty: {e}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Cannot read snapshot {key}: {e}");
                Self::default()
            }
        }
    }
}

/// Entries of `current` whose link is absent from `previous`.
pub fn new_entries(previous: &[FeedEntry], current: &[FeedEntry]) -> Vec<FeedEntry> {
    let seen: HashSet<&str> = previous.iter().map(|e| e.link.as_str()).collect();
    current
        .iter()
        .filter(|e| !seen.contains(e.link.as_str()))
        .cloned()
        .collect()
}

/// Check one blog for entries published since the last stored snapshot.
///
/// Returns `None` when the blog has no discoverable feed or nothing is new.
/// The fetched entries replace the snapshot whenever the feed was read.
pub async fn detect_new_articles(
    http: &dyn HttpFetch,
    blog_url: &str,
    count: usize,
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<Vec<FeedEntry>>> {
    let Some(found) = FeedDiscovery::new(http).discover(blog_url).await else {
        log::warn!("No feed found for {blog_url}");
        return Ok(None);
    };

    let feed = FeedReader::new(http).read(&found.url, count, blog_url).await;
    if feed.entries.is_empty() {
        log::warn!("Feed {} of {} has no entries", found.url, blog_url);
        return Ok(None);
    }

    let previous = Snapshot::load(store, key).await;
    let fresh = new_entries(&previous.articles, &feed.entries);

    save_json(
        store,
        key,
        &Snapshot {
            articles: feed.entries,
        },
    )
    .await?;

    if fresh.is_empty() {
        log::info!("No new articles on {blog_url}");
        return Ok(None);
    }

    log::info!("{} new article(s) on {}", fresh.len(), blog_url);
    Ok(Some(fresh))
}
