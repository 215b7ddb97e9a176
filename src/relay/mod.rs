//! The poll → queue → send pipeline and its lifecycle.
//!
//! Two tasks share nothing but the bounded delivery queue and a
//! cancellation token:
//! - the poll loop fetches on a timer, diffs against the watermark and
//!   pushes new posts (blocking while the queue is full);
//! - the send loop pops one post at a time, delivers it and pauses for
//!   the configured delay.

pub mod coordinator;
pub mod poller;
pub mod queue;
pub mod sender;

pub use coordinator::{LifecycleState, Relay, shutdown_signal, spawn_signal_listener};
pub use poller::{PollOutcome, Poller};
pub use queue::{QueueReceiver, QueueSender, delivery_queue};
pub use sender::{MessageSender, SendStats, format_message};
