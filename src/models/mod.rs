// src/models/mod.rs

//! Domain models for the aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod friend;
mod source;

// Re-export all public types
pub use article::{Article, Corpus, FriendOutcome, FriendStatus, Statistics};
pub use config::{
    Config, CrawlerConfig, ErrorMergePolicy, MergeConfig, OutputConfig, SourcesConfig,
};
pub use friend::{Friend, Roster};
pub use source::{CacheMutation, FeedSource, MutationReason, SourceEntry, SourceOrigin};
