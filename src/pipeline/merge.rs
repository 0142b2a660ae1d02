// src/pipeline/merge.rs

//! Cross-instance merge of published corpora and error lists.
//!
//! Peer fetches are fail-open: when a peer document cannot be fetched or
//! parsed, local data is left unchanged.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{Article, Corpus, ErrorMergePolicy, Friend};
use crate::utils::http::{AcceptKind, HttpFetch};

/// Merges another instance's published documents into local ones.
pub struct PeerMerger<'a> {
    http: &'a dyn HttpFetch,
}

impl<'a> PeerMerger<'a> {
    pub fn new(http: &'a dyn HttpFetch) -> Self {
        Self { http }
    }

    /// Append the peer's articles, deduplicated by link with local entries
    /// taking precedence.
    pub async fn merge_data(&self, corpus: &mut Corpus, peer_url: &str) {
        match self.fetch::<Corpus>(peer_url).await {
            Ok(peer) => {
                let before = corpus.articles.len();
                let merged = merge_articles(std::mem::take(&mut corpus.articles), peer.articles);
                corpus.articles = merged;
                corpus.refresh_count();
                log::info!(
                    "Merged peer corpus {}: {} -> {} article(s)",
                    peer_url,
                    before,
                    corpus.articles.len()
                );
            }
            Err(e) => log::error!("Cannot merge peer corpus {peer_url}: {e}"),
        }
    }

    /// Combine the peer's error list with ours according to `policy`.
    pub async fn merge_errors(
        &self,
        errors: Vec<Friend>,
        peer_url: &str,
        policy: ErrorMergePolicy,
    ) -> Vec<Friend> {
        match self.fetch::<Vec<Friend>>(peer_url).await {
            Ok(peer) => {
                let merged = merge_error_lists(errors, peer, policy);
                log::info!(
                    "Merged peer error list {} ({:?}): {} error(s)",
                    peer_url,
                    policy,
                    merged.len()
                );
                merged
            }
            Err(e) => {
                log::error!("Cannot merge peer error list {peer_url}: {e}");
                errors
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let page = self.http.get(url, AcceptKind::Json).await?;
        if !page.is_ok() {
            return Err(AppError::validation(format!(
                "{url} answered HTTP {}",
                page.status
            )));
        }
        Ok(serde_json::from_str(&page.body)?)
    }
}

/// Concatenate and deduplicate by link; the first occurrence wins.
pub fn merge_articles(local: Vec<Article>, peer: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    local
        .into_iter()
        .chain(peer)
        .filter(|a| seen.insert(a.link.clone()))
        .collect()
}

/// Reconcile two error lists keyed by blog URL.
pub fn merge_error_lists(
    local: Vec<Friend>,
    peer: Vec<Friend>,
    policy: ErrorMergePolicy,
) -> Vec<Friend> {
    match policy {
        ErrorMergePolicy::Intersection => {
            let peer_urls: HashSet<&str> = peer.iter().map(|f| f.blog_url.as_str()).collect();
            local
                .into_iter()
                .filter(|f| peer_urls.contains(f.blog_url.as_str()))
                .collect()
        }
        ErrorMergePolicy::Union => {
            let mut seen: HashSet<String> = HashSet::new();
            local
                .into_iter()
                .chain(peer)
                .filter(|f| seen.insert(f.blog_url.clone()))
                .collect()
        }
    }
}
