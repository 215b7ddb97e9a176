//! Error types for the relay.

use std::time::Duration;

/// Errors that end a relay run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Poller failed: {0}")]
    Poll(#[from] PollError),

    #[error("Sender task failed: {0}")]
    SenderTask(String),
}

/// Configuration-related errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Watermark store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Store is closed")]
    Closed,
}

/// Errors from the upstream post source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {source_name} failed: {reason}")]
    Request { source_name: String, reason: String },

    #[error("{source_name} returned {status}: {body}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Rate limited by {source_name}")]
    RateLimited { source_name: String },

    #[error("Invalid listing from {source_name}: {reason}")]
    Decode { source_name: String, reason: String },
}

/// Errors from the chat endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("sendMessage request failed: {reason}")]
    Request { reason: String },

    #[error("sendMessage rejected ({status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
}

/// Chat channel lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },
}

/// Reasons a single poll cycle was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Delivery queue closed")]
    QueueClosed,

    #[error("Cancelled while waiting for queue space")]
    Cancelled,
}
