//! `WatermarkStore` trait — opaque get/put-by-key persistence.

use async_trait::async_trait;

use crate::error::StoreError;

/// Last-delivered post identifier per source name.
///
/// Single writer: only the poll loop touches it, so there is no
/// transactional guarantee across a `get`/`put` pair.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Read the watermark for `source`. `None` on first run.
    async fn get(&self, source: &str) -> Result<Option<String>, StoreError>;

    /// Durably record `id` as the watermark for `source`.
    async fn put(&self, source: &str, id: &str) -> Result<(), StoreError>;

    /// Release the store. Later calls fail with `StoreError::Closed`.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
