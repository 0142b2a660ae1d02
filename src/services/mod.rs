//! Service layer for the aggregator.
//!
//! This module contains the business logic for:
//! - Feed endpoint discovery (`FeedDiscovery`)
//! - Feed fetching and entry normalization (`FeedReader`)
//! - Per-friend source resolution (`SourceResolver`)

pub mod discovery;
pub mod feed;
pub mod resolver;

pub use discovery::{DiscoveredFeed, FeedDiscovery};
pub use feed::{FeedEntry, FeedReader, ParsedFeed};
pub use resolver::SourceResolver;
