//! Events leaving the core.
//!
//! The hook callback must never block, so everything it wants the rest of
//! the process to know about goes through an unbounded channel whose `send`
//! never waits.  The UI commands publish into the same channel so the status
//! display sees one ordered stream.

use keyremap_core::{KeyCode, StatusReport};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// An event published by the gateway or the command handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// The status line or the mapping table changed.
    Status(StatusReport),
    /// The toggle hotkey was reassigned and should be persisted.
    HotkeyChanged(KeyCode),
    /// The exit gesture was pressed.
    ExitRequested,
}

/// Sending half of the core event channel.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: UnboundedSender<CoreEvent>,
}

impl EventPublisher {
    /// Creates a publisher and the receiver the event pump drains.
    pub fn channel() -> (Self, UnboundedReceiver<CoreEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publishes `event` without blocking. Events sent after the receiver
    /// is gone (during shutdown) are dropped.
    pub fn publish(&self, event: CoreEvent) {
        if self.tx.send(event).is_err() {
            trace!("core event dropped: receiver closed");
        }
    }
}
