use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{DocKey, DocKind, DocumentStore, StoreError};

/// In-process document store.
///
/// Each call yields to the scheduler before touching the map, so concurrent
/// sessions on one runtime interleave the way they would against a real
/// backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<DocKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<DocKey, Vec<u8>>>, StoreError> {
        self.docs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, key: &DocKey) -> Result<Option<Vec<u8>>, StoreError> {
        key.validate()?;
        tokio::task::yield_now().await;
        Ok(self.docs()?.get(key).cloned())
    }

    async fn save(&self, key: &DocKey, bytes: &[u8]) -> Result<(), StoreError> {
        key.validate()?;
        tokio::task::yield_now().await;
        self.docs()?.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &DocKey) -> Result<bool, StoreError> {
        key.validate()?;
        tokio::task::yield_now().await;
        Ok(self.docs()?.remove(key).is_some())
    }

    async fn list(&self, kind: DocKind) -> Result<Vec<DocKey>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .docs()?
            .keys()
            .filter(|key| key.kind == kind)
            .cloned()
            .collect())
    }
}
