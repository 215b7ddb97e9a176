//! libSQL backend — async `WatermarkStore` implementation.
//!
//! Supports a local file (held with an exclusive lock for the life of the
//! process) and an in-memory database for tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::WatermarkStore;

/// libSQL-backed watermark store.
pub struct LibSqlWatermarkStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    closed: AtomicBool,
}

impl LibSqlWatermarkStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Open(format!("Failed to create store directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let mut rows = conn
            .query("PRAGMA locking_mode = EXCLUSIVE", ())
            .await
            .map_err(|e| StoreError::Open(format!("Failed to set locking mode: {e}")))?;
        rows.next()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to set locking mode: {e}")))?;
        drop(rows);

        // Exclusive mode only locks on the first write; take it now so a
        // second process fails here instead of on every later put.
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")
            .await
            .map_err(|e| StoreError::Open(format!("Store is locked by another process: {e}")))?;

        let store = Self::from_parts(db, conn).await?;
        info!(path = %path.display(), "Watermark store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        Self::from_parts(db, conn).await
    }

    async fn from_parts(db: LibSqlDatabase, conn: Connection) -> Result<Self, StoreError> {
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            closed: AtomicBool::new(false),
        })
    }

    /// Get the connection, unless the store was closed.
    fn conn(&self) -> Result<&Connection, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(&self.conn)
    }
}

#[async_trait]
impl WatermarkStore for LibSqlWatermarkStore {
    async fn get(&self, source: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT last_id FROM watermarks WHERE source = ?1",
                params![source],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get watermark: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let last_id: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("row parse: {e}")))?;
                Ok(Some(last_id))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get watermark: {e}"))),
        }
    }

    async fn put(&self, source: &str, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO watermarks (source, last_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (source) DO UPDATE SET last_id = ?2, updated_at = ?3",
            params![source, id, now],
        )
        .await
        .map_err(|e| StoreError::Query(format!("put watermark: {e}")))?;

        debug!(source, id, "Watermark stored");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Watermark store closed");
        }
        Ok(())
    }
}
