//! Storage abstractions for published documents and the feed cache.
//!
//! Documents are opaque blobs addressed by key, loaded and overwritten as a
//! whole:
//!
//! ```text
//! {root}/
//! ├── all.json      # Published corpus
//! ├── errors.json   # Friends that failed resolution
//! └── cache.json    # Feed URLs remembered between runs
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Whole-document blob store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document, `None` if it does not exist.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a document atomically.
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Load and deserialize a JSON document.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<T>> {
    match store.load(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize and store a JSON document.
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.save(key, &bytes).await
}
