//! Reddit relay — polls a subreddit and forwards new posts to Telegram.

pub mod channels;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod relay;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
