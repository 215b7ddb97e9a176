//! Outbound chat channels.

pub mod telegram;

use async_trait::async_trait;

use crate::error::SendError;

pub use telegram::TelegramChannel;

/// Write side of the relay: deliver one text message to a chat.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}
