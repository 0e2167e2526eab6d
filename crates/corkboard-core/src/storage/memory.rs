//! In-memory storage implementation.

use super::{BoxFuture, PersistedEnvelope, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    envelopes: RwLock<HashMap<String, PersistedEnvelope>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, envelope: &PersistedEnvelope) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let envelope = envelope.clone();
        Box::pin(async move {
            let mut map = self
                .envelopes
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            map.insert(id, envelope);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<PersistedEnvelope>>> {
        let id = id.to_string();
        Box::pin(async move {
            let map = self
                .envelopes
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            Ok(map.get(&id).cloned())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut map = self
                .envelopes
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            map.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let map = self
                .envelopes
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            Ok(map.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let map = self
                .envelopes
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            Ok(map.contains_key(&id))
        })
    }
}
