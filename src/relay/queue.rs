//! Bounded FIFO between the poller and the sender.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::PollError;
use crate::model::Post;

/// Create a delivery queue holding at most `capacity` posts.
///
/// # Panics
///
/// Panics if `capacity` is zero; config validation rejects that earlier.
pub fn delivery_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer half, owned by the poller.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<Post>,
}

impl QueueSender {
    /// Push a post, waiting for space while the queue is full.
    ///
    /// Never drops: the call only gives up if `cancel` fires or the
    /// receiver is gone.
    pub async fn push(&self, post: Post, cancel: &CancellationToken) -> Result<(), PollError> {
        tokio::select! {
            biased;
            res = self.tx.send(post) => res.map_err(|_| PollError::QueueClosed),
            _ = cancel.cancelled() => Err(PollError::Cancelled),
        }
    }

    /// Posts currently waiting for the sender.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer half, owned by the sender.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Post>,
}

impl QueueReceiver {
    /// Wait for the next post. Returns `None` once `cancel` fires (checked
    /// first) or every producer is gone and the queue is empty.
    pub async fn pop(&mut self, cancel: &CancellationToken) -> Option<Post> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            post = self.rx.recv() => post,
        }
    }

    /// Take the next post if one is already waiting.
    pub fn try_pop(&mut self) -> Option<Post> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fifo_order() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = delivery_queue(4);
        for id in ["t3_a", "t3_b", "t3_c"] {
            tx.push(Post::new(id, "/"), &cancel).await.unwrap();
        }
        assert_eq!(tx.len(), 3);

        for expected in ["t3_a", "t3_b", "t3_c"] {
            assert_eq!(rx.pop(&cancel).await.unwrap().id, expected);
        }
        assert!(tx.is_empty());
    }

    #[tokio::test]
    async fn push_blocks_when_full() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = delivery_queue(1);
        tx.push(Post::new("t3_a", "/"), &cancel).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), tx.push(Post::new("t3_b", "/"), &cancel))
                .await;
        assert!(blocked.is_err(), "push should wait for space");

        assert_eq!(rx.pop(&cancel).await.unwrap().id, "t3_a");
        tx.push(Post::new("t3_b", "/"), &cancel).await.unwrap();
        assert_eq!(rx.pop(&cancel).await.unwrap().id, "t3_b");
    }

    #[tokio::test]
    async fn blocked_push_observes_cancellation() {
        let cancel = CancellationToken::new();
        let (tx, _rx) = delivery_queue(1);
        tx.push(Post::new("t3_a", "/"), &cancel).await.unwrap();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = tx.push(Post::new("t3_b", "/"), &cancel).await.unwrap_err();
        assert!(matches!(err, PollError::Cancelled));
    }

    #[tokio::test]
    async fn push_fails_when_receiver_dropped() {
        let cancel = CancellationToken::new();
        let (tx, rx) = delivery_queue(1);
        drop(rx);
        let err = tx.push(Post::new("t3_a", "/"), &cancel).await.unwrap_err();
        assert!(matches!(err, PollError::QueueClosed));
    }

    #[tokio::test]
    async fn pop_prefers_cancellation_over_items() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = delivery_queue(2);
        tx.push(Post::new("t3_a", "/"), &cancel).await.unwrap();
        cancel.cancel();
        assert!(rx.pop(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn pop_returns_none_when_closed_and_drained() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = delivery_queue(2);
        tx.push(Post::new("t3_a", "/"), &cancel).await.unwrap();
        drop(tx);
        assert_eq!(rx.pop(&cancel).await.unwrap().id, "t3_a");
        assert!(rx.pop(&cancel).await.is_none());
    }
}
