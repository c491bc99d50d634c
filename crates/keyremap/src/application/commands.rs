//! Handlers for UI-originated commands.
//!
//! Each handler locks the shared session, applies one transition, snapshots
//! the resulting status, and releases the lock before doing any I/O.  The
//! mapping file is written only after the lock is gone so the hook callback
//! is never kept waiting on the disk.

use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};

use keyremap_core::{KeyCode, KeyMapping, RemapSession, StatusReport, Update};
use thiserror::Error;
use tracing::{info, warn};

use super::events::{CoreEvent, EventPublisher};
use super::SharedSession;

/// Error type for mapping persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mapping storage unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode mappings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Saves the mapping table somewhere durable.
///
/// Implemented by the JSON store in the infrastructure layer.
#[cfg_attr(test, mockall::automock)]
pub trait MappingPersistence: Send + Sync {
    fn persist(&self, mapping: &KeyMapping) -> Result<(), StoreError>;
}

/// Executes pick/reset/toggle/hotkey commands against the shared session.
#[derive(Clone)]
pub struct RemapCommands {
    session: SharedSession,
    store: Arc<dyn MappingPersistence>,
    events: EventPublisher,
}

impl RemapCommands {
    pub fn new(
        session: SharedSession,
        store: Arc<dyn MappingPersistence>,
        events: EventPublisher,
    ) -> Self {
        Self {
            session,
            store,
            events,
        }
    }

    /// Picks a key on the on-screen keyboard (first pick = source, second = target).
    pub fn pick_key(&self, code: KeyCode) -> StatusReport {
        self.apply(|s| s.pick_key(code))
    }

    /// Clears every mapping and saves the empty table.
    pub fn reset(&self) -> StatusReport {
        self.apply(RemapSession::reset)
    }

    /// Flips remapping on or off.
    pub fn toggle_enabled(&self) -> StatusReport {
        self.apply(RemapSession::toggle_enabled)
    }

    /// Arms capture of the next physical key-down as the toggle hotkey.
    pub fn begin_hotkey_capture(&self) -> StatusReport {
        self.apply(RemapSession::begin_hotkey_capture)
    }

    /// Publishes `message` with the current state without changing anything.
    pub fn announce(&self, message: &str) -> StatusReport {
        let report = self.lock().status(message);
        self.events.publish(CoreEvent::Status(report.clone()));
        report
    }

    /// Returns the current state paired with `message`, publishing nothing.
    pub fn snapshot(&self, message: &str) -> StatusReport {
        self.lock().status(message)
    }

    fn apply(&self, transition: impl FnOnce(&mut RemapSession) -> Update) -> StatusReport {
        let (update, report, mapping) = {
            let mut session = self.lock();
            let update = transition(&mut *session);
            let report = session.status(update.notice.clone().unwrap_or_default());
            let mapping = update.mapping_changed.then(|| session.mapping().clone());
            (update, report, mapping)
        };

        if let Some(mapping) = mapping {
            match self.store.persist(&mapping) {
                Ok(()) => info!(entries = mapping.len(), "mappings saved"),
                Err(e) => warn!("failed to save mappings: {e}"),
            }
        }
        if let Some(code) = update.hotkey_changed {
            self.events.publish(CoreEvent::HotkeyChanged(code));
        }
        self.events.publish(CoreEvent::Status(report.clone()));
        report
    }

    fn lock(&self) -> MutexGuard<'_, RemapSession> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!("session lock poisoned; continuing with last known state");
            poisoned.into_inner()
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
