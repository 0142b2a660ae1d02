// src/pipeline/aggregate.rs

//! Bounded fan-out of the source resolver over the whole roster.

use std::time::Duration;

use futures::{StreamExt, stream};

use crate::models::{
    Article, CacheMutation, Corpus, CrawlerConfig, Friend, FriendOutcome, SourceEntry, Statistics,
};
use crate::pipeline::cache::FeedCache;
use crate::services::SourceResolver;
use crate::utils::http::HttpFetch;
use crate::utils::time::now_stamp;

/// Everything one aggregation run produced.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Unsorted, uncapped corpus with fresh statistics
    pub corpus: Corpus,
    /// Friends whose resolution ended in error
    pub errors: Vec<Friend>,
    /// Cache after reconciliation, ready to persist
    pub cache: FeedCache,
    /// Mutations that changed the cache
    pub applied: Vec<CacheMutation>,
}

/// Aggregation orchestrator.
pub struct Aggregator<'a> {
    http: &'a dyn HttpFetch,
    config: &'a CrawlerConfig,
    manual: &'a [SourceEntry],
}

impl<'a> Aggregator<'a> {
    pub fn new(
        http: &'a dyn HttpFetch,
        config: &'a CrawlerConfig,
        manual: &'a [SourceEntry],
    ) -> Self {
        Self {
            http,
            config,
            manual,
        }
    }

    /// Resolve every friend, then reconcile the collected cache mutations.
    pub async fn run(&self, friends: &[Friend], mut cache: FeedCache) -> Aggregation {
        let lookup = cache.lookup(self.manual);
        let resolver = SourceResolver::new(self.http, &lookup, self.config.article_count);
        let ceiling = Duration::from_secs(self.config.friend_timeout_secs);

        log::info!(
            "Resolving {} friend(s) with {} worker(s)",
            friends.len(),
            self.config.max_concurrent
        );

        let outcomes: Vec<FriendOutcome> = stream::iter(friends)
            .map(|friend| {
                let resolver = &resolver;
                async move {
                    match tokio::time::timeout(ceiling, resolver.resolve(friend)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            log::error!(
                                "Resolving \"{}\" timed out after {}s",
                                friend.name,
                                ceiling.as_secs()
                            );
                            FriendOutcome::failed(friend.clone())
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut active_num = 0;
        let mut articles: Vec<Article> = Vec::new();
        let mut errors: Vec<Friend> = Vec::new();
        let mut mutations: Vec<CacheMutation> = Vec::new();

        for outcome in outcomes {
            if outcome.is_active() {
                active_num += 1;
                articles.extend(outcome.articles);
            } else {
                errors.push(outcome.friend);
            }
            if !outcome.cache_mutation.is_none() {
                mutations.push(outcome.cache_mutation);
            }
        }

        let applied = cache.reconcile(mutations, self.manual);

        let statistics = Statistics {
            friends_num: friends.len(),
            active_num,
            error_num: errors.len(),
            article_num: articles.len(),
            last_updated_time: now_stamp(),
        };
        log::info!(
            "Aggregated {} friend(s): {} active, {} error, {} article(s)",
            statistics.friends_num,
            statistics.active_num,
            statistics.error_num,
            statistics.article_num
        );

        Aggregation {
            corpus: Corpus {
                statistics,
                articles,
            },
            errors,
            cache,
            applied,
        }
    }
}
