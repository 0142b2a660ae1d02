// src/utils/http.rs

//! HTTP client utilities.
//!
//! Every outbound request goes through [`HttpFetch`], so the discovery and
//! resolution services can be driven by the real [`HttpClient`] or by an
//! in-memory fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::Result;
use crate::models::CrawlerConfig;

const FEED_ACCEPT: &str =
    "application/atom+xml, application/rss+xml, application/xml;q=0.9, */*;q=0.8";
const JSON_ACCEPT: &str = "application/json, text/plain;q=0.9, */*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "zh-CN,zh;q=0.9,en;q=0.8";
const CIRCLE_HEADER: &str = "x-friend-circle";

/// Which kind of document a request expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptKind {
    Feed,
    Json,
}

impl AcceptKind {
    fn header_value(self) -> &'static str {
        match self {
            AcceptKind::Feed => FEED_ACCEPT,
            AcceptKind::Json => JSON_ACCEPT,
        }
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    /// Lowercased `Content-Type` header, empty when absent
    pub content_type: String,
    /// Body decoded with the response charset, UTF-8 when unspecified
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Minimal GET abstraction shared read-only by all workers.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch `url`; transport failures are errors, HTTP error statuses are not.
    async fn get(&self, url: &str, accept: AcceptKind) -> Result<FetchedPage>;
}

/// `reqwest`-backed fetcher with mandatory connect/read timeouts.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl HttpFetch for HttpClient {
    async fn get(&self, url: &str, accept: AcceptKind) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept.header_value())
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let body = response.text().await?;

        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );
    headers.insert(
        HeaderName::from_static(CIRCLE_HEADER),
        HeaderValue::from_static("1.0"),
    );

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
pub mod testing {
    //! In-memory [`HttpFetch`] for tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::error::AppError;

    enum Stub {
        Page(FetchedPage),
        Unreachable,
    }

    /// Serves canned responses; unknown URLs answer 404.
    #[derive(Default)]
    pub struct StubFetcher {
        routes: HashMap<String, Stub>,
        requests: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
            self.routes.insert(
                url.to_string(),
                Stub::Page(FetchedPage {
                    status,
                    content_type: content_type.to_lowercase(),
                    body: body.to_string(),
                }),
            );
            self
        }

        pub fn xml(self, url: &str, body: &str) -> Self {
            self.page(url, 200, "application/xml; charset=utf-8", body)
        }

        pub fn json(self, url: &str, body: &str) -> Self {
            self.page(url, 200, "application/json", body)
        }

        pub fn unreachable(mut self, url: &str) -> Self {
            self.routes.insert(url.to_string(), Stub::Unreachable);
            self
        }

        /// URLs requested so far, in request order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpFetch for StubFetcher {
        async fn get(&self, url: &str, _accept: AcceptKind) -> Result<FetchedPage> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.routes.get(url) {
                Some(Stub::Page(page)) => Ok(page.clone()),
                Some(Stub::Unreachable) => Err(AppError::feed(url, "connection refused")),
                None => Ok(FetchedPage {
                    status: 404,
                    content_type: "text/html".into(),
                    body: "<html>not found</html>".into(),
                }),
            }
        }
    }

    /// Minimal Atom document with one entry per `(title, link, published)`.
    pub fn atom_feed(author: &str, entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(title, link, published)| {
                format!(
                    "<entry><title>{title}</title><id>{link}</id>\
                     <link href=\"{link}\" rel=\"alternate\"/>\
                     <published>{published}</published><updated>{published}</updated></entry>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <feed xmlns=\"http://www.w3.org/2005/Atom\">\
             <title>{author}'s blog</title><id>urn:feed</id><updated>2024-01-01T00:00:00Z</updated>\
             <author><name>{author}</name></author>{body}</feed>"
        )
    }

    /// Minimal RSS 2.0 document with one item per `(title, link, pub_date)`.
    pub fn rss_feed(title: &str, items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, pub_date)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link><pubDate>{pub_date}</pubDate></item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>{title}</title>\
             <link>https://example.com</link><description>d</description>{body}</channel></rss>"
        )
    }
}
