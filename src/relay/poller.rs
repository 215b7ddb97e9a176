//! Source poller — one fetch/diff/enqueue cycle per timer tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::PollError;
use crate::relay::queue::QueueSender;
use crate::source::PostSource;
use crate::store::WatermarkStore;

/// What a completed poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub fetched: usize,
    pub enqueued: usize,
    /// Watermark written this cycle, if it moved.
    pub advanced_to: Option<String>,
}

/// Fetches new posts and hands them to the delivery queue.
///
/// The only reader and writer of the watermark store.
pub struct Poller {
    source: Arc<dyn PostSource>,
    store: Arc<dyn WatermarkStore>,
    queue: QueueSender,
    source_name: String,
    page_size: usize,
}

impl Poller {
    pub fn new(
        source: Arc<dyn PostSource>,
        store: Arc<dyn WatermarkStore>,
        queue: QueueSender,
        source_name: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            source,
            store,
            queue,
            source_name: source_name.into(),
            page_size,
        }
    }

    /// Run a single cycle: fetch → read watermark → enqueue newer posts →
    /// advance watermark.
    ///
    /// The watermark is only written after every new post has been
    /// enqueued, so any error leaves it untouched.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<PollOutcome, PollError> {
        let mut posts = self
            .source
            .fetch_newest(&self.source_name, self.page_size)
            .await?;
        posts.truncate(self.page_size);

        let Some(newest) = posts.first().map(|p| p.id.clone()) else {
            debug!(source = %self.source_name, "No posts returned");
            return Ok(PollOutcome::default());
        };

        let last_seen = self.store.get(&self.source_name).await?;

        let fetched = posts.len();
        let mut enqueued = 0;
        for post in posts {
            if last_seen.as_deref() == Some(post.id.as_str()) {
                break;
            }
            debug!(id = %post.id, "Enqueueing post");
            self.queue.push(post, cancel).await?;
            enqueued += 1;
        }

        if enqueued == 0 {
            debug!(source = %self.source_name, fetched, "Nothing new");
            return Ok(PollOutcome {
                fetched,
                ..PollOutcome::default()
            });
        }

        if enqueued == fetched && last_seen.is_some() {
            warn!(
                source = %self.source_name,
                page_size = self.page_size,
                "Watermark not found in page; older posts beyond it are skipped"
            );
        }

        self.store.put(&self.source_name, &newest).await?;
        info!(
            source = %self.source_name,
            fetched,
            enqueued,
            watermark = %newest,
            "Poll cycle complete"
        );

        Ok(PollOutcome {
            fetched,
            enqueued,
            advanced_to: Some(newest),
        })
    }

    /// Poll every `interval` until `cancel` fires.
    ///
    /// The first poll happens one interval after start. A cycle held up
    /// by a full queue delays the following ticks rather than bursting
    /// them. Returns an error only when the queue's consumer is gone.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) -> Result<(), PollError> {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            source = %self.source_name,
            interval_secs = interval.as_secs_f64(),
            page_size = self.page_size,
            "Poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.poll_once(&cancel).await {
                Ok(_) => {}
                Err(PollError::Cancelled) => {
                    info!("Poll cycle abandoned by shutdown; watermark unchanged");
                    break;
                }
                Err(PollError::QueueClosed) => {
                    error!("Delivery queue closed; stopping poller");
                    return Err(PollError::QueueClosed);
                }
                Err(e @ PollError::Fetch(_)) => {
                    warn!(source = %self.source_name, error = %e, "Fetch failed; skipping cycle");
                }
                Err(e @ PollError::Store(_)) => {
                    error!(source = %self.source_name, error = %e, "Store failed; skipping cycle");
                }
            }
        }

        info!("Poller shutting down");
        Ok(())
    }
}
