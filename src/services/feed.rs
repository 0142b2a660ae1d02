// src/services/feed.rs

//! Feed fetching and entry normalization.
//!
//! Fetches an Atom or RSS document, maps it into a strict [`ParsedFeed`]
//! (all "is this field present?" checks live here), normalizes timestamps
//! and links, then keeps the newest `count` entries.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::http::{AcceptKind, HttpFetch};
use crate::utils::time::normalize_timestamp;
use crate::utils::url::sanitize_link;

/// A normalized feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub title: String,
    /// Sanitized entry link
    #[serde(default)]
    pub link: String,
    /// Canonical timestamp, empty when the entry has none usable
    #[serde(default)]
    pub created: String,
    /// Feed-level author, shared by every entry of the feed
    #[serde(default)]
    pub author: String,
}

/// A normalized feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub author: String,
    pub link: String,
    pub entries: Vec<FeedEntry>,
}

/// Feed document as read, before normalization.
#[derive(Debug, Default)]
pub struct RawFeed {
    pub title: String,
    pub author: String,
    pub link: String,
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Default)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub updated: Option<String>,
}

/// Service reading feeds over HTTP.
pub struct FeedReader<'a> {
    http: &'a dyn HttpFetch,
}

impl<'a> FeedReader<'a> {
    pub fn new(http: &'a dyn HttpFetch) -> Self {
        Self { http }
    }

    /// Fetch and normalize a feed, yielding an empty feed on any failure.
    pub async fn read(&self, feed_url: &str, count: usize, blog_url: &str) -> ParsedFeed {
        match self.try_read(feed_url, count, blog_url).await {
            Ok(feed) => feed,
            Err(e) => {
                log::error!("Cannot read feed {feed_url}: {e}");
                ParsedFeed::default()
            }
        }
    }

    /// Fetch and normalize a feed, reporting failures.
    pub async fn try_read(
        &self,
        feed_url: &str,
        count: usize,
        blog_url: &str,
    ) -> Result<ParsedFeed> {
        let page = self.http.get(feed_url, AcceptKind::Feed).await?;
        if !page.is_ok() {
            return Err(AppError::feed(feed_url, format!("HTTP status {}", page.status)));
        }

        let raw = parse_document(&page.body).map_err(|e| AppError::feed(feed_url, e))?;
        Ok(normalize_feed(raw, count, blog_url))
    }
}

/// Parse an Atom, RSS 2.0 or RSS 1.0 (RDF) document.
pub fn parse_document(body: &str) -> std::result::Result<RawFeed, String> {
    let body = body.trim_start_matches('\u{feff}').trim_start();
    let head: String = body.chars().take(1000).collect::<String>().to_lowercase();

    if head.contains("<feed") {
        read_atom(body).or_else(|atom_err| read_rss(body).map_err(|_| atom_err))
    } else {
        read_rss(body).or_else(|rss_err| read_atom(body).map_err(|_| rss_err))
    }
}

fn read_rss(body: &str) -> std::result::Result<RawFeed, String> {
    let channel = rss::Channel::read_from(body.as_bytes()).map_err(|e| e.to_string())?;

    let author = channel
        .managing_editor()
        .map(str::to_string)
        .or_else(|| {
            channel
                .dublin_core_ext()
                .and_then(|dc| dc.creators().first().cloned())
        })
        .unwrap_or_default();

    let entries = channel
        .items()
        .iter()
        .map(|item| RawEntry {
            title: item.title().unwrap_or_default().to_string(),
            link: item
                .link()
                .or_else(|| item.guid().filter(|g| g.is_permalink()).map(|g| g.value()))
                .unwrap_or_default()
                .to_string(),
            published: item.pub_date().map(str::to_string),
            updated: item
                .dublin_core_ext()
                .and_then(|dc| dc.dates().first().cloned()),
        })
        .collect();

    Ok(RawFeed {
        title: channel.title().to_string(),
        author,
        link: channel.link().to_string(),
        entries,
    })
}

fn read_atom(body: &str) -> std::result::Result<RawFeed, String> {
    let feed = atom_syndication::Feed::read_from(body.as_bytes()).map_err(|e| e.to_string())?;

    let entries = feed
        .entries()
        .iter()
        .map(|entry| RawEntry {
            title: entry.title().value.clone(),
            link: alternate_link(entry.links()),
            published: entry.published().map(|d| d.to_rfc3339()),
            // A missing <updated> parses as the epoch
            updated: Some(entry.updated())
                .filter(|d| d.timestamp() != 0)
                .map(|d| d.to_rfc3339()),
        })
        .collect();

    Ok(RawFeed {
        title: feed.title().value.clone(),
        author: feed
            .authors()
            .first()
            .map(|person| person.name().to_string())
            .unwrap_or_default(),
        link: alternate_link(feed.links()),
        entries,
    })
}

fn alternate_link(links: &[atom_syndication::Link]) -> String {
    links
        .iter()
        .find(|link| link.rel() == "alternate")
        .or_else(|| links.first())
        .map(|link| link.href().to_string())
        .unwrap_or_default()
}

/// Resolve timestamps, sanitize links, sort newest first, keep `count`.
pub fn normalize_feed(raw: RawFeed, count: usize, blog_url: &str) -> ParsedFeed {
    let author = raw.author;

    let mut entries: Vec<FeedEntry> = raw
        .entries
        .into_iter()
        .map(|entry| {
            let created = resolve_created(&entry);
            FeedEntry {
                link: if entry.link.is_empty() {
                    entry.link
                } else {
                    sanitize_link(&entry.link, blog_url)
                },
                title: entry.title,
                created,
                author: author.clone(),
            }
        })
        .collect();

    // Canonical timestamps order lexicographically; empty ones sink to the end
    entries.sort_by(|a, b| b.created.cmp(&a.created));
    entries.truncate(count);

    ParsedFeed {
        title: raw.title,
        author,
        link: raw.link,
        entries,
    }
}

fn resolve_created(entry: &RawEntry) -> String {
    let created = match (&entry.published, &entry.updated) {
        (Some(published), _) => normalize_timestamp(published),
        (None, Some(updated)) => {
            let created = normalize_timestamp(updated);
            log::warn!(
                "Entry '{}' has no publish time, using update time {}",
                entry.title,
                created
            );
            created
        }
        (None, None) => {
            log::warn!(
                "Entry '{}' has no time information, default time will be used",
                entry.title
            );
            return String::new();
        }
    };

    if created.is_empty() {
        log::warn!(
            "Entry '{}' has an unparseable timestamp, default time will be used",
            entry.title
        );
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::{StubFetcher, atom_feed, rss_feed};

    #[test]
    fn test_parse_rss() {
        let xml = rss_feed(
            "Alice",
            &[("Hello", "https://a.example/hello", "Mon, 11 Mar 2024 14:08:32 +0000")],
        );
        let raw = parse_document(&xml).unwrap();
        assert_eq!(raw.title, "Alice");
        assert_eq!(raw.entries.len(), 1);
        assert_eq!(raw.entries[0].link, "https://a.example/hello");
        assert!(raw.entries[0].published.is_some());
    }

    #[test]
    fn test_parse_atom() {
        let xml = atom_feed("Alice", &[("Hi", "https://a.example/hi", "2024-03-11T14:08:32Z")]);
        let raw = parse_document(&xml).unwrap();
        assert_eq!(raw.author, "Alice");
        assert_eq!(raw.entries[0].title, "Hi");
        assert_eq!(raw.entries[0].link, "https://a.example/hi");
    }

    #[test]
    fn test_parse_rss1_rdf() {
        let xml = r##"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://r.example/">
    <title>Rita</title>
    <link>https://r.example/</link>
    <description>d</description>
  </channel>
  <item rdf:about="https://r.example/one">
    <title>One</title>
    <link>https://r.example/one</link>
  </item>
</rdf:RDF>"##;
        let raw = parse_document(xml).unwrap();
        assert_eq!(raw.title, "Rita");
        assert_eq!(raw.entries.len(), 1);
        assert_eq!(raw.entries[0].link, "https://r.example/one");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_document("<html><body>nope</body></html>").is_err());
    }

    #[test]
    fn test_normalize_sorts_and_truncates() {
        let raw = RawFeed {
            author: "feed-author".into(),
            entries: vec![
                RawEntry {
                    title: "old".into(),
                    link: "https://a.example/old".into(),
                    published: Some("2023-01-01T00:00:00Z".into()),
                    updated: None,
                },
                RawEntry {
                    title: "undated".into(),
                    link: "https://a.example/undated".into(),
                    published: None,
                    updated: None,
                },
                RawEntry {
                    title: "new".into(),
                    link: "http://localhost:4000/new".into(),
                    published: None,
                    updated: Some("2024-06-01T00:00:00Z".into()),
                },
            ],
            ..RawFeed::default()
        };

        let feed = normalize_feed(raw, 2, "https://a.example");

        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].title, "new");
        assert_eq!(feed.entries[0].created, "2024-06-01 08:00");
        assert_eq!(feed.entries[0].link, "https://a.example/new");
        assert_eq!(feed.entries[0].author, "feed-author");
        assert_eq!(feed.entries[1].title, "old");
    }

    #[test]
    fn test_undated_entries_sort_last() {
        let raw = RawFeed {
            entries: vec![
                RawEntry {
                    title: "undated".into(),
                    published: Some("sometime".into()),
                    ..RawEntry::default()
                },
                RawEntry {
                    title: "dated".into(),
                    published: Some("2020-01-01".into()),
                    ..RawEntry::default()
                },
            ],
            ..RawFeed::default()
        };

        let feed = normalize_feed(raw, 5, "https://a.example");
        assert_eq!(feed.entries[0].title, "dated");
        assert_eq!(feed.entries[1].created, "");
    }

    #[tokio::test]
    async fn test_read_is_fail_soft() {
        let http = StubFetcher::new()
            .unreachable("https://down.example/atom.xml")
            .page("https://html.example/feed", 200, "text/html", "<html></html>");
        let reader = FeedReader::new(&http);

        let down = reader.read("https://down.example/atom.xml", 5, "https://down.example").await;
        let html = reader.read("https://html.example/feed", 5, "https://html.example").await;
        let missing = reader.read("https://gone.example/rss.xml", 5, "https://gone.example").await;

        assert!(down.entries.is_empty());
        assert!(html.entries.is_empty());
        assert!(missing.entries.is_empty());
    }
}
