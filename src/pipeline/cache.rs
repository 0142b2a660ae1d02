// src/pipeline/cache.rs

//! Persisted feed cache and mutation reconciliation.
//!
//! The cache is loaded once per run, combined with the manual source list
//! into a read-only lookup for the resolvers, and only mutated after every
//! friend has been resolved.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::error::Result;
use crate::models::{CacheMutation, FeedSource, SourceEntry, SourceOrigin};
use crate::storage::{DocumentStore, save_json};

/// Feed URLs remembered between runs, keyed by friend name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCache {
    entries: BTreeMap<String, String>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from `{name, url}` entries, skipping incomplete ones.
    /// A repeated name keeps its last URL.
    pub fn from_entries(entries: impl IntoIterator<Item = SourceEntry>) -> Self {
        let mut cache = Self::new();
        for entry in entries {
            if !entry.is_complete() {
                log::warn!("Skipping incomplete cache entry {:?}", entry);
                continue;
            }
            cache.entries.insert(entry.name, entry.url);
        }
        cache
    }

    /// Interpret a cache document. Anything other than a list of objects
    /// yields an empty cache.
    pub fn from_document(document: &Value) -> Self {
        let Some(rows) = document.as_array() else {
            log::warn!("Cache document is not a list, starting with an empty cache");
            return Self::new();
        };

        Self::from_entries(rows.iter().filter_map(|row| {
            serde_json::from_value::<SourceEntry>(row.clone())
                .inspect_err(|e| log::warn!("Skipping malformed cache entry {row}: {e}"))
                .ok()
        }))
    }

    /// Load the cache document. Missing or corrupt documents are not fatal.
    pub async fn load(store: &dyn DocumentStore, key: &str) -> Self {
        let bytes = match store.load(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No feed cache at {key}, starting empty");
                return Self::new();
            }
            Err(e) => {
                log::warn!("Cannot read feed cache {key}: {e}");
                return Self::new();
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(document) => {
                let cache = Self::from_document(&document);
                log::info!("Loaded {} cached feed(s) from {key}", cache.len());
                cache
            }
            Err(e) => {
                log::warn!("Feed cache {key} is corrupt, starting empty: {e}");
                Self::new()
            }
        }
    }

    /// Persist the cache as a `[{name, url}]` document.
    pub async fn save(&self, store: &dyn DocumentStore, key: &str) -> Result<()> {
        save_json(store, key, &self.to_entries()).await
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_entries(&self) -> Vec<SourceEntry> {
        self.entries
            .iter()
            .map(|(name, url)| SourceEntry::new(name, url))
            .collect()
    }

    /// Combine the cache with manual sources; manual wins by name.
    pub fn lookup(&self, manual: &[SourceEntry]) -> HashMap<String, FeedSource> {
        let mut lookup: HashMap<String, FeedSource> = self
            .entries
            .iter()
            .map(|(name, url)| {
                (
                    name.clone(),
                    FeedSource::new(name, url, SourceOrigin::Cache),
                )
            })
            .collect();

        for entry in manual {
            lookup.insert(
                entry.name.clone(),
                FeedSource::new(&entry.name, &entry.url, SourceOrigin::Manual),
            );
        }
        lookup
    }

    /// Apply the mutations collected during a run and return the ones that
    /// took effect.
    ///
    /// Mutations are deduplicated by name (last one wins), mutations naming a
    /// manual source are dropped, and so are `set` mutations without a
    /// usable URL.
    pub fn reconcile(
        &mut self,
        mutations: impl IntoIterator<Item = CacheMutation>,
        manual: &[SourceEntry],
    ) -> Vec<CacheMutation> {
        let manual_names: HashSet<&str> = manual.iter().map(|e| e.name.as_str()).collect();

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, CacheMutation> = HashMap::new();
        for mutation in mutations {
            let Some(name) = mutation.name().map(str::to_string) else {
                continue;
            };
            if manual_names.contains(name.as_str()) {
                log::debug!("Ignoring cache mutation for manual source \"{name}\"");
                continue;
            }
            if latest.insert(name.clone(), mutation).is_none() {
                order.push(name);
            }
        }

        let mut applied = Vec::new();
        for name in order {
            let Some(mutation) = latest.remove(&name) else {
                continue;
            };
            match &mutation {
                CacheMutation::Set { name, url, reason } => {
                    let url = url.trim();
                    if url.is_empty() || url.eq_ignore_ascii_case("none") {
                        log::debug!("Ignoring cache SET for \"{name}\" without a feed URL");
                        continue;
                    }
                    log::info!("Cache SET {name} -> {url} ({reason})");
                    self.entries.insert(name.clone(), url.to_string());
                }
                CacheMutation::Delete { name, reason } => {
                    if self.entries.remove(name).is_none() {
                        continue;
                    }
                    log::info!("Cache DELETE {name} ({reason})");
                }
                CacheMutation::None => continue,
            }
            applied.push(mutation);
        }
        applied
    }
}
