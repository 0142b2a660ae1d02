// src/models/source.rs

//! Feed sources and cache mutation intents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a believed-working feed URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    /// Declared by the operator; never rewritten by the engine
    Manual,
    /// Remembered from a previous run
    Cache,
    /// Discovered live during this run
    Auto,
}

impl SourceOrigin {
    /// Whether a source of this origin may be repaired or evicted when it
    /// stops producing articles.
    pub fn is_repairable(self) -> bool {
        matches!(self, SourceOrigin::Cache)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceOrigin::Manual => "manual",
            SourceOrigin::Cache => "cache",
            SourceOrigin::Auto => "auto",
        }
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed endpoint believed to work for a friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub origin: SourceOrigin,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            origin,
        }
    }
}

/// Operator-declared `{name, url}` pair, as written in configuration and in
/// the cache document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Both fields are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Why a cache mutation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationReason {
    AutoDiscovered,
    RepairCache,
    RemoveInvalid,
}

impl fmt::Display for MutationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationReason::AutoDiscovered => "auto_discovered",
            MutationReason::RepairCache => "repair_cache",
            MutationReason::RemoveInvalid => "remove_invalid",
        })
    }
}

/// Intent to change the persisted feed cache, reconciled after all friends
/// have been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMutation {
    None,
    Set {
        name: String,
        url: String,
        reason: MutationReason,
    },
    Delete {
        name: String,
        reason: MutationReason,
    },
}

impl CacheMutation {
    pub fn set(name: impl Into<String>, url: impl Into<String>, reason: MutationReason) -> Self {
        Self::Set {
            name: name.into(),
            url: url.into(),
            reason,
        }
    }

    pub fn delete(name: impl Into<String>, reason: MutationReason) -> Self {
        Self::Delete {
            name: name.into(),
            reason,
        }
    }

    /// Friend name targeted by this mutation.
    pub fn name(&self) -> Option<&str> {
        match self {
            CacheMutation::None => None,
            CacheMutation::Set { name, .. } | CacheMutation::Delete { name, .. } => Some(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CacheMutation::None)
    }
}
