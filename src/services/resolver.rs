// src/services/resolver.rs

//! Per-friend feed resolution.
//!
//! Decides which feed URL to trust for a friend and fetches it:
//!
//! ```text
//! START ──known source──▶ FETCHED ──articles──▶ ACTIVE
//!   │                        │
//!   └──discover──▶ FETCHED   └──none, cache origin──▶ REPAIR ──▶ ACTIVE | ERROR
//! ```
//!
//! Manual sources are never repaired or evicted; only cache-origin sources
//! are re-discovered when they stop producing articles.

use std::collections::HashMap;

use crate::models::{
    Article, CacheMutation, FeedSource, Friend, FriendOutcome, FriendStatus, MutationReason,
    SourceOrigin,
};
use crate::services::discovery::FeedDiscovery;
use crate::services::feed::{FeedEntry, FeedReader};
use crate::utils::http::HttpFetch;

/// Feed type label reported for manual and cached sources.
const SPECIFIC_FEED_TYPE: &str = "specific";

/// Resolves one friend at a time against a shared source lookup.
pub struct SourceResolver<'a> {
    discovery: FeedDiscovery<'a>,
    reader: FeedReader<'a>,
    lookup: &'a HashMap<String, FeedSource>,
    count: usize,
}

impl<'a> SourceResolver<'a> {
    pub fn new(
        http: &'a dyn HttpFetch,
        lookup: &'a HashMap<String, FeedSource>,
        count: usize,
    ) -> Self {
        Self {
            discovery: FeedDiscovery::new(http),
            reader: FeedReader::new(http),
            lookup,
            count,
        }
    }

    /// Run the resolution state machine for a single friend.
    pub async fn resolve(&self, friend: &Friend) -> FriendOutcome {
        let name = friend.name.as_str();
        let mut mutation = CacheMutation::None;

        let (feed_url, feed_type, origin) = match self.lookup.get(name) {
            Some(source) => {
                log::info!(
                    "\"{}\" uses preset feed {} (source={})",
                    name,
                    source.url,
                    source.origin
                );
                (source.url.clone(), SPECIFIC_FEED_TYPE.to_string(), source.origin)
            }
            None => match self.discovery.discover(&friend.blog_url).await {
                Some(found) => {
                    log::info!(
                        "\"{}\" auto-discovered {} feed {}",
                        name,
                        found.feed_type,
                        found.url
                    );
                    mutation =
                        CacheMutation::set(name, found.url.clone(), MutationReason::AutoDiscovered);
                    (found.url, found.feed_type.to_string(), SourceOrigin::Auto)
                }
                None => {
                    log::warn!("{}'s blog {} has no discoverable feed", name, friend.blog_url);
                    return self.outcome(
                        friend,
                        FriendStatus::Error,
                        Vec::new(),
                        None,
                        "none",
                        Some(SourceOrigin::Auto),
                        CacheMutation::None,
                    );
                }
            },
        };

        let articles = self.fetch_articles(friend, &feed_url).await;
        if !articles.is_empty() {
            return self.outcome(
                friend,
                FriendStatus::Active,
                articles,
                Some(feed_url),
                &feed_type,
                Some(origin),
                mutation,
            );
        }

        if !origin.is_repairable() {
            log::warn!("{}'s feed {} produced no articles", name, feed_url);
            return self.outcome(
                friend,
                FriendStatus::Error,
                Vec::new(),
                Some(feed_url),
                &feed_type,
                Some(origin),
                mutation,
            );
        }

        self.repair(friend, &feed_url).await
    }

    /// Re-discover a cached source that stopped producing articles.
    async fn repair(&self, friend: &Friend, stale_url: &str) -> FriendOutcome {
        let name = friend.name.as_str();
        log::info!(
            "Cached feed {} for \"{}\" is stale, re-discovering from {}",
            stale_url,
            name,
            friend.blog_url
        );

        let evict = CacheMutation::delete(name, MutationReason::RemoveInvalid);

        let Some(found) = self.discovery.discover(&friend.blog_url).await else {
            log::warn!("{}'s blog {} has no discoverable feed", name, friend.blog_url);
            return self.outcome(
                friend,
                FriendStatus::Error,
                Vec::new(),
                None,
                "none",
                Some(SourceOrigin::Cache),
                evict,
            );
        };

        let articles = self.fetch_articles(friend, &found.url).await;
        if articles.is_empty() {
            log::warn!(
                "Re-discovered feed {} for \"{}\" still has no articles",
                found.url,
                name
            );
            return self.outcome(
                friend,
                FriendStatus::Error,
                Vec::new(),
                None,
                "none",
                Some(SourceOrigin::Cache),
                evict,
            );
        }

        let mutation = CacheMutation::set(name, found.url.clone(), MutationReason::RepairCache);
        self.outcome(
            friend,
            FriendStatus::Active,
            articles,
            Some(found.url),
            found.feed_type,
            Some(SourceOrigin::Auto),
            mutation,
        )
    }

    async fn fetch_articles(&self, friend: &Friend, feed_url: &str) -> Vec<Article> {
        let feed = self
            .reader
            .read(feed_url, self.count, &friend.blog_url)
            .await;

        feed.entries
            .into_iter()
            .map(|entry| to_article(entry, friend))
            .inspect(|a| {
                log::debug!("{} published \"{}\" at {} ({})", a.author, a.title, a.created, a.link)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn outcome(
        &self,
        friend: &Friend,
        status: FriendStatus,
        articles: Vec<Article>,
        feed_url: Option<String>,
        feed_type: &str,
        source_used: Option<SourceOrigin>,
        cache_mutation: CacheMutation,
    ) -> FriendOutcome {
        FriendOutcome {
            friend: friend.clone(),
            status,
            articles,
            feed_url,
            feed_type: feed_type.to_string(),
            source_used,
            cache_mutation,
        }
    }
}

/// Stamp a feed entry with the friend's identity.
fn to_article(entry: FeedEntry, friend: &Friend) -> Article {
    Article {
        title: entry.title,
        created: entry.created,
        link: entry.link,
        author: friend.name.clone(),
        avatar: friend.avatar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::{StubFetcher, atom_feed};

    fn lookup(sources: &[FeedSource]) -> HashMap<String, FeedSource> {
        sources.iter().map(|s| (s.name.clone(), s.clone())).collect()
    }

    fn one_post(blog: &str) -> String {
        atom_feed("x", &[("Post", &format!("{blog}/post"), "2024-03-11T14:08:32Z")])
    }

    #[tokio::test]
    async fn test_auto_discovery_requests_cache_set() {
        let http = StubFetcher::new().xml("https://a.example/atom.xml", &one_post("https://a.example"));
        let sources = lookup(&[]);
        let friend = Friend::new("Alice", "https://a.example", "a.png");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert!(outcome.is_active());
        assert_eq!(outcome.feed_type, "atom");
        assert_eq!(outcome.source_used, Some(SourceOrigin::Auto));
        assert_eq!(outcome.articles[0].author, "Alice");
        assert_eq!(outcome.articles[0].avatar, "a.png");
        assert_eq!(
            outcome.cache_mutation,
            CacheMutation::set("Alice", "https://a.example/atom.xml", MutationReason::AutoDiscovered)
        );
    }

    #[tokio::test]
    async fn test_discovery_miss_is_error_without_mutation() {
        let http = StubFetcher::new();
        let sources = lookup(&[]);
        let friend = Friend::new("Bob", "https://b.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert_eq!(outcome.status, FriendStatus::Error);
        assert!(outcome.cache_mutation.is_none());
        assert_eq!(outcome.feed_type, "none");
    }

    #[tokio::test]
    async fn test_known_source_skips_discovery() {
        let http = StubFetcher::new().xml("https://a.example/custom.xml", &one_post("https://a.example"));
        let sources = lookup(&[FeedSource::new("Alice", "https://a.example/custom.xml", SourceOrigin::Cache)]);
        let friend = Friend::new("Alice", "https://a.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert!(outcome.is_active());
        assert_eq!(outcome.feed_type, "specific");
        assert!(outcome.cache_mutation.is_none());
        assert_eq!(http.requests(), vec!["https://a.example/custom.xml"]);
    }

    #[tokio::test]
    async fn test_stale_cache_is_repaired() {
        let http = StubFetcher::new().xml("https://c.example/feed", &one_post("https://c.example"));
        let sources = lookup(&[FeedSource::new("Carol", "https://c.example/old-feed.xml", SourceOrigin::Cache)]);
        let friend = Friend::new("Carol", "https://c.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert!(outcome.is_active());
        assert_eq!(outcome.source_used, Some(SourceOrigin::Auto));
        assert_eq!(outcome.feed_url.as_deref(), Some("https://c.example/feed"));
        assert_eq!(
            outcome.cache_mutation,
            CacheMutation::set("Carol", "https://c.example/feed", MutationReason::RepairCache)
        );
    }

    #[tokio::test]
    async fn test_unrepairable_cache_is_evicted() {
        let http = StubFetcher::new();
        let sources = lookup(&[FeedSource::new("Carol", "https://c.example/old-feed.xml", SourceOrigin::Cache)]);
        let friend = Friend::new("Carol", "https://c.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert_eq!(outcome.status, FriendStatus::Error);
        assert_eq!(
            outcome.cache_mutation,
            CacheMutation::delete("Carol", MutationReason::RemoveInvalid)
        );
    }

    #[tokio::test]
    async fn test_repair_with_empty_feed_is_evicted() {
        let empty = atom_feed("x", &[]);
        let http = StubFetcher::new().xml("https://c.example/atom.xml", &empty);
        let sources = lookup(&[FeedSource::new("Carol", "https://c.example/old.xml", SourceOrigin::Cache)]);
        let friend = Friend::new("Carol", "https://c.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert_eq!(outcome.status, FriendStatus::Error);
        assert!(matches!(outcome.cache_mutation, CacheMutation::Delete { .. }));
    }

    #[tokio::test]
    async fn test_broken_manual_source_is_left_alone() {
        let http = StubFetcher::new().xml("https://d.example/atom.xml", &one_post("https://d.example"));
        let sources = lookup(&[FeedSource::new("Dave", "https://d.example/broken", SourceOrigin::Manual)]);
        let friend = Friend::new("Dave", "https://d.example", "");

        let outcome = SourceResolver::new(&http, &sources, 5).resolve(&friend).await;

        assert_eq!(outcome.status, FriendStatus::Error);
        assert!(outcome.cache_mutation.is_none());
        assert_eq!(outcome.source_used, Some(SourceOrigin::Manual));
        assert_eq!(http.requests(), vec!["https://d.example/broken"]);
    }
}
