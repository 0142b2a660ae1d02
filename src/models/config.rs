//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceEntry;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and fetching behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Roster location and operator-declared feeds
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Where published documents and the feed cache live
    #[serde(default)]
    pub output: OutputConfig,

    /// Cross-instance merge settings
    #[serde(default)]
    pub merge: MergeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.connect_timeout_secs == 0 || self.crawler.read_timeout_secs == 0 {
            return Err(AppError::validation("crawler timeouts must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.friend_timeout_secs == 0 {
            return Err(AppError::validation("crawler.friend_timeout_secs must be > 0"));
        }
        if self.crawler.article_count == 0 {
            return Err(AppError::validation("crawler.article_count must be > 0"));
        }
        if self.sources.roster.trim().is_empty() {
            return Err(AppError::validation("sources.roster is empty"));
        }
        if self.output.max_articles == 0 {
            return Err(AppError::validation("output.max_articles must be > 0"));
        }
        if self.merge.enabled && self.merge.data_url.is_none() && self.merge.errors_url.is_none()
        {
            return Err(AppError::validation(
                "merge is enabled but neither merge.data_url nor merge.errors_url is set",
            ));
        }
        Ok(())
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// TCP connect timeout in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds
    #[serde(default = "defaults::read_timeout")]
    pub read_timeout_secs: u64,

    /// Number of friends resolved concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Maximum articles kept per friend
    #[serde(default = "defaults::article_count")]
    pub article_count: usize,

    /// Upper bound for a single friend's resolution
    #[serde(default = "defaults::friend_timeout")]
    pub friend_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            connect_timeout_secs: defaults::connect_timeout(),
            read_timeout_secs: defaults::read_timeout(),
            max_concurrent: defaults::max_concurrent(),
            article_count: defaults::article_count(),
            friend_timeout_secs: defaults::friend_timeout(),
        }
    }
}

/// Roster location and manually configured feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Roster document: an http(s) URL or a local path
    #[serde(default = "defaults::roster")]
    pub roster: String,

    /// Operator-declared feed URLs, by friend name
    #[serde(default)]
    pub manual: Vec<SourceEntry>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            roster: defaults::roster(),
            manual: Vec::new(),
        }
    }
}

impl SourcesConfig {
    /// Manual entries with both a name and a URL; incomplete ones are logged and dropped.
    pub fn manual_entries(&self) -> Vec<SourceEntry> {
        self.manual
            .iter()
            .filter(|entry| {
                let complete = entry.is_complete();
                if !complete {
                    log::warn!("Ignoring incomplete manual source entry: {:?}", entry);
                }
                complete
            })
            .cloned()
            .collect()
    }
}

/// Output document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the documents are written to
    #[serde(default = "defaults::output_dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::corpus_file")]
    pub corpus_file: String,

    #[serde(default = "defaults::errors_file")]
    pub errors_file: String,

    /// Feed cache document; no cache is kept when unset or blank
    #[serde(default, deserialize_with = "non_blank")]
    pub cache_file: Option<String>,

    /// Corpus size ceiling before author-preserving capping
    #[serde(default = "defaults::max_articles")]
    pub max_articles: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            corpus_file: defaults::corpus_file(),
            errors_file: defaults::errors_file(),
            cache_file: None,
            max_articles: defaults::max_articles(),
        }
    }
}

impl OutputConfig {
    /// Cache document key, if a non-blank one is configured.
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_file
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn non_blank<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// How a peer's error list is combined with ours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMergePolicy {
    /// Keep only local errors the peer also reports
    #[default]
    Intersection,
    /// Keep errors reported by either instance
    Union,
}

/// Cross-instance merge settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Peer's published corpus document
    #[serde(default)]
    pub data_url: Option<String>,

    /// Peer's published error list
    #[serde(default)]
    pub errors_url: Option<String>,

    #[serde(default)]
    pub error_policy: ErrorMergePolicy,
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; Friend-Circle/1.0; +https://github.com/willow-god/Friend-Circle-Lite)"
            .into()
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn read_timeout() -> u64 {
        15
    }
    pub fn max_concurrent() -> usize {
        10
    }
    pub fn article_count() -> usize {
        5
    }
    pub fn friend_timeout() -> u64 {
        120
    }

    // Source defaults
    pub fn roster() -> String {
        "data/friend.json".into()
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn corpus_file() -> String {
        "all.json".into()
    }
    pub fn errors_file() -> String {
        "errors.json".into()
    }
    pub fn max_articles() -> usize {
        150
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_friend_timeout() {
        let mut config = Config::default();
        config.crawler.friend_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn cache_file_is_off_unless_configured() {
        let config: Config = toml::from_str("[output]\ndir = \"x\"\n").unwrap();
        assert_eq!(config.output.cache_file, None);
        assert_eq!(config.output.cache_key(), None);
        assert_eq!(Config::default().output.cache_key(), None);
    }

    #[test]
    fn blank_cache_file_means_no_cache() {
        let config: Config = toml::from_str("[output]\ncache_file = \"  \"\n").unwrap();
        assert_eq!(config.output.cache_file, None);

        let mut config = Config::default();
        config.output.cache_file = Some(String::new());
        assert_eq!(config.output.cache_key(), None);
    }

    #[test]
    fn cache_file_is_kept_when_set() {
        let config: Config = toml::from_str("[output]\ncache_file = \"cache.json\"\n").unwrap();
        assert_eq!(config.output.cache_key(), Some("cache.json"));
    }

    #[test]
    fn load_or_default_reads_file_or_falls_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[crawler]\nmax_concurrent = 3\n").unwrap();

        assert_eq!(Config::load_or_default(&path).crawler.max_concurrent, 3);

        let missing = Config::load_or_default(tmp.path().join("missing.toml"));
        assert_eq!(missing.crawler.max_concurrent, 10);
    }

    #[test]
    fn validate_rejects_merge_without_urls() {
        let mut config = Config::default();
        config.merge.enabled = true;
        assert!(config.validate().is_err());

        config.merge.data_url = Some("https://peer.example/all.json".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_concurrent = 4

            [sources]
            roster = "https://example.com/friend.json"
            manual = [
                { name = "Alice", url = "https://a.example/feed" },
                { name = "Broken" },
            ]

            [merge]
            enabled = true
            errors_url = "https://peer.example/errors.json"
            error_policy = "union"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_concurrent, 4);
        assert_eq!(config.crawler.article_count, 5);
        assert_eq!(config.output.max_articles, 150);
        assert_eq!(config.merge.error_policy, ErrorMergePolicy::Union);
        assert_eq!(config.sources.manual.len(), 2);
        assert_eq!(config.sources.manual_entries().len(), 1);
    }
}
