//! The narrow persistence capability the onboarding controller writes
//! through to.

use async_trait::async_trait;

use crate::error::StoreError;

/// Durable key-value storage for the onboarding records.
///
/// Implementations must not fail reads: a missing key, an unreachable
/// backend and an unreadable value all come back as `None`. Writes report
/// their outcome, but callers are free to ignore it.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn read(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`.
    async fn write(&self, key: &str, raw: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
