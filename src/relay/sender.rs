//! Message sender — drains the delivery queue into the chat, one post at
//! a time, pausing between sends.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channels::ChatSink;
use crate::relay::queue::QueueReceiver;

/// Build the chat text for a post: base URL joined with its permalink at
/// exactly one `/`.
pub fn format_message(base_url: &str, permalink: &str) -> String {
    match (base_url.ends_with('/'), permalink.starts_with('/')) {
        (true, true) => format!("{base_url}{}", &permalink[1..]),
        (false, false) if !base_url.is_empty() && !permalink.is_empty() => {
            format!("{base_url}/{permalink}")
        }
        _ => format!("{base_url}{permalink}"),
    }
}

/// Counters reported when the send loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    pub sent: usize,
    pub failed: usize,
}

pub struct MessageSender {
    sink: Arc<dyn ChatSink>,
    chat_id: i64,
    base_url: String,
    delay: Duration,
}

impl MessageSender {
    pub fn new(
        sink: Arc<dyn ChatSink>,
        chat_id: i64,
        base_url: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            sink,
            chat_id,
            base_url: base_url.into(),
            delay,
        }
    }

    /// Send queued posts until `cancel` fires or the queue closes.
    ///
    /// Each attempt is made once; failures are logged and the post is
    /// dropped. The delay after a send is not interrupted by cancellation,
    /// and posts still queued at shutdown are not drained.
    pub async fn run(self, mut queue: QueueReceiver, cancel: CancellationToken) -> SendStats {
        let mut stats = SendStats::default();
        info!(
            chat_id = self.chat_id,
            delay_secs = self.delay.as_secs_f64(),
            "Sender started"
        );

        while let Some(post) = queue.pop(&cancel).await {
            let text = format_message(&self.base_url, &post.permalink);

            match self.sink.send_message(self.chat_id, &text).await {
                Ok(()) => {
                    stats.sent += 1;
                    debug!(
                        id = %post.id,
                        title = %post.title,
                        age_secs = post.age_secs(Utc::now()),
                        "Post sent"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(id = %post.id, error = %e, "Failed to send post; dropping it");
                }
            }

            tokio::time::sleep(self.delay).await;
        }

        info!(sent = stats.sent, failed = stats.failed, "Sender stopped");
        stats
    }
}
