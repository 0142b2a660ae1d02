//! In-memory storage, for tests and dry runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::DocumentStore;

/// Document store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document.
    pub fn with_document(mut self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        if let Ok(documents) = self.documents.get_mut() {
            documents.insert(key.to_string(), bytes.into());
        }
        self
    }

    fn documents(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.documents
            .lock()
            .map_err(|_| AppError::storage("in-memory document store lock is poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.documents()?.get(key).cloned())
    }

    async fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.documents()?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[tokio::test]
    async fn test_seeded_document_is_loaded() {
        let store = MemoryStorage::new().with_document("a.json", "[]");
        assert_eq!(store.load("a.json").await.unwrap(), Some(b"[]".to_vec()));
        assert!(store.load("b.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_poisoned_store_reports_errors() {
        let store = MemoryStorage::new();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.documents.lock().unwrap();
            panic!("writer crashed");
        }));

        let saved = store.save("all.json", b"{}").await;
        assert!(matches!(saved, Err(AppError::Storage(_))));
        assert!(store.load("all.json").await.is_err());
    }
}
