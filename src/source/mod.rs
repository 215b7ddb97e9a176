//! Upstream post sources.

pub mod reddit;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::Post;

pub use reddit::RedditSource;

/// Read side of the relay: newest posts for a named source.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch at most `limit` posts for `source_name`, newest first.
    async fn fetch_newest(&self, source_name: &str, limit: usize) -> Result<Vec<Post>, FetchError>;
}
