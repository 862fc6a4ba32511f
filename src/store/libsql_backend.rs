//! libSQL backend — durable `ProgressStore` on a per-user settings table.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::ProgressStore;

/// libSQL-backed store.
///
/// Every key is scoped to `user_id`, so several profiles can share one file.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    user_id: String,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path, user_id: impl Into<String>) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db, user_id.into()).await?;
        info!(path = %path.display(), user_id = %store.user_id, "Onboarding store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory(user_id: impl Into<String>) -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db, user_id.into()).await
    }

    /// A store for another user sharing this database and connection.
    pub fn for_user(&self, user_id: impl Into<String>) -> Self {
        Self {
            db: Arc::clone(&self.db),
            conn: self.conn.clone(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn from_database(db: LibSqlDatabase, user_id: String) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            user_id,
        })
    }

    async fn try_read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![self.user_id.as_str(), key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("read: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map(Some)
                .map_err(|e| StoreError::Query(format!("read: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("read: {e}"))),
        }
    }
}

#[async_trait]
impl ProgressStore for LibSqlStore {
    async fn read(&self, key: &str) -> Option<String> {
        match self.try_read(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Store read failed, treating as absent");
                None
            }
        }
    }

    async fn write(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.user_id.as_str(), key, raw, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("write: {e}")))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![self.user_id.as_str(), key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("remove: {e}")))?;
        Ok(())
    }
}
