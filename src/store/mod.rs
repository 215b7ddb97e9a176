//! Persistence layer — durable per-source watermarks.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlWatermarkStore;
pub use traits::WatermarkStore;
