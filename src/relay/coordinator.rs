//! Lifecycle coordinator — wires poller, queue and sender together and
//! runs them until shutdown.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::channels::ChatSink;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::relay::poller::Poller;
use crate::relay::queue::delivery_queue;
use crate::relay::sender::{MessageSender, SendStats};
use crate::source::PostSource;
use crate::store::WatermarkStore;

/// `Starting → Running → ShuttingDown → Stopped`, in that order only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Owns the shared handles (store, clients, queue) and injects them into
/// the two loops.
pub struct Relay {
    config: PipelineConfig,
    source: Arc<dyn PostSource>,
    store: Arc<dyn WatermarkStore>,
    sink: Arc<dyn ChatSink>,
    state: watch::Sender<LifecycleState>,
}

impl Relay {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn PostSource>,
        store: Arc<dyn WatermarkStore>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            config,
            source,
            store,
            sink,
            state,
        }
    }

    /// Observe lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    fn transition(&self, next: LifecycleState) {
        info!(state = %next, "Relay state change");
        self.state.send_replace(next);
    }

    /// Run until `cancel` fires, then stop the sender and close the store.
    ///
    /// The store is closed even when a loop fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<SendStats, Error> {
        self.transition(LifecycleState::Starting);

        let (queue_tx, queue_rx) = delivery_queue(self.config.queue_capacity);

        let sender = MessageSender::new(
            Arc::clone(&self.sink),
            self.config.chat_id,
            self.config.message_base_url.clone(),
            self.config.send_delay,
        );
        let sender_handle: JoinHandle<SendStats> =
            tokio::spawn(sender.run(queue_rx, cancel.clone()));

        let poller = Poller::new(
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            queue_tx,
            self.config.source_name.clone(),
            self.config.page_size,
        );

        self.transition(LifecycleState::Running);
        info!(
            source = %self.config.source_name,
            chat_id = self.config.chat_id,
            "Relay running"
        );

        let poll_result = poller.run(self.config.poll_interval, cancel.clone()).await;

        self.transition(LifecycleState::ShuttingDown);
        cancel.cancel();

        let sender_result = sender_handle.await;

        if let Err(e) = self.store.close().await {
            warn!(error = %e, "Failed to close watermark store");
        }
        self.transition(LifecycleState::Stopped);

        poll_result?;
        let stats = sender_result.map_err(|e| {
            error!(error = %e, "Sender task failed");
            Error::SenderTask(e.to_string())
        })?;
        Ok(stats)
    }
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down..."),
        _ = terminate => info!("SIGTERM received, shutting down..."),
    }
}

/// Cancel `cancel` when a termination signal arrives.
pub fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => cancel.cancel(),
            _ = cancel.cancelled() => {}
        }
    })
}
