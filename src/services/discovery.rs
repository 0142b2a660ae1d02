// src/services/discovery.rs

//! Feed endpoint discovery.
//!
//! Probes a fixed, ordered list of conventional feed paths under a blog's
//! base URL. The first candidate that answers 200 with feed-looking content
//! wins, so repeated runs settle on the same URL for caching.

use crate::utils::http::{AcceptKind, FetchedPage, HttpFetch};
use crate::utils::url::join_feed_path;

/// Candidate feed paths, in probe order, with their type labels.
pub const FEED_CANDIDATES: &[(&str, &str)] = &[
    ("atom", "/atom.xml"),
    ("rss", "/rss.xml"),
    ("rss2", "/rss2.xml"),
    ("rss3", "/rss.php"),
    ("feed", "/feed"),
    ("feed2", "/feed.xml"),
    ("feed3", "/feed/"),
    ("feed4", "/feed.php"),
    ("index", "/index.xml"),
];

/// Number of leading body characters inspected for a feed root tag.
const SNIFF_LEN: usize = 1000;

const CONTENT_TYPE_TOKENS: &[&str] = &["xml", "rss", "atom"];
const ROOT_TAGS: &[&str] = &["<rss", "<feed", "<rdf:rdf"];

/// A feed endpoint found by probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFeed {
    pub feed_type: &'static str,
    pub url: String,
}

/// Service probing a blog for its feed endpoint.
pub struct FeedDiscovery<'a> {
    http: &'a dyn HttpFetch,
}

impl<'a> FeedDiscovery<'a> {
    pub fn new(http: &'a dyn HttpFetch) -> Self {
        Self { http }
    }

    /// Probe the candidates sequentially; `None` when no candidate matches.
    pub async fn discover(&self, blog_url: &str) -> Option<DiscoveredFeed> {
        for (feed_type, path) in FEED_CANDIDATES {
            let url = join_feed_path(blog_url, path);

            match self.http.get(&url, AcceptKind::Feed).await {
                Ok(page) if page.is_ok() && looks_like_feed(&page) => {
                    log::debug!("Feed found for {blog_url}: {url} ({feed_type})");
                    return Some(DiscoveredFeed { feed_type, url });
                }
                Ok(page) => {
                    log::debug!("Candidate {url} rejected (status {})", page.status);
                }
                Err(e) => {
                    log::debug!("Candidate {url} failed: {e}");
                }
            }
        }

        log::warn!("No feed found for {blog_url}");
        None
    }
}

/// Content sniffing: a feed-ish content type, or a feed root tag near the
/// start of the body.
pub fn looks_like_feed(page: &FetchedPage) -> bool {
    if CONTENT_TYPE_TOKENS
        .iter()
        .any(|token| page.content_type.contains(token))
    {
        return true;
    }

    let head: String = page.body.chars().take(SNIFF_LEN).collect::<String>().to_lowercase();
    ROOT_TAGS.iter().any(|tag| head.contains(tag))
}
