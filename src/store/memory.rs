//! In-process store, lost on restart. Used for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::ProgressStore;
use crate::error::StoreError;

/// `HashMap`-backed [`ProgressStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes and removes fail, as an unavailable backend would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store rejecting writes".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn read(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn write(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
