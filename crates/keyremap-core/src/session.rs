//! The enable/disable and capture state machine.
//!
//! A [`RemapSession`] owns the mapping table, the enabled flag, the toggle
//! hotkey, and the current [`CaptureMode`].  Both the hook callback and the UI
//! command handlers drive it; the application layer serializes them behind a
//! single mutex.
//!
//! # States
//!
//! ```text
//!                 begin_hotkey_capture (any state)
//!        ┌────────────────────────────────────────────┐
//!        ▼                                            │
//!  ┌──────────────┐  key down: capture_hotkey   ┌─────┴──┐
//!  │AwaitingHotkey│ ───────────────────────────►│ Normal │◄──────┐
//!  └──────┬───────┘                             └───┬────┘       │
//!         │ pick_key(x)                 pick_key(x) │            │ pick_key(y):
//!         └────────────────────────┐                ▼            │ assign x→y
//!                                  └──────►┌─────────────────┐   │
//!                                          │PickingTarget(x) │───┘
//!                                          └─────────────────┘
//! ```
//!
//! No method performs I/O.  Each returns an [`Update`] describing what the
//! caller must persist and which notice to publish, so the caller can do that
//! work after releasing the lock.

use tracing::debug;

use crate::keys::KeyCode;
use crate::mapping::{KeyMapping, MappingError};
use crate::status::StatusReport;

/// How the next key pick or physical key press is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Remapping as usual; the next pick selects a source key.
    #[default]
    Normal,
    /// The next physical key-down becomes the toggle hotkey.
    AwaitingHotkey,
    /// A source has been picked; the next pick selects its target.
    PickingTarget { source: KeyCode },
}

/// Process-wide enable flag and toggle hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    pub enabled: bool,
    pub toggle_hotkey: KeyCode,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            enabled: true,
            toggle_hotkey: KeyCode::DOWN,
        }
    }
}

/// Side effects a caller must carry out after a state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    /// Status line to publish, if the transition produced one.
    pub notice: Option<String>,
    /// The mapping table changed and must be saved.
    pub mapping_changed: bool,
    /// The toggle hotkey was reassigned to this code.
    pub hotkey_changed: Option<KeyCode>,
}

impl Update {
    fn notice(message: impl Into<String>) -> Self {
        Self {
            notice: Some(message.into()),
            ..Self::default()
        }
    }

    /// `true` when nothing observable happened.
    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && !self.mapping_changed && self.hotkey_changed.is_none()
    }
}

/// Shared remapper state: table, engine flags, and capture mode.
#[derive(Debug, Clone, Default)]
pub struct RemapSession {
    mapping: KeyMapping,
    engine: EngineState,
    mode: CaptureMode,
}

impl RemapSession {
    /// Creates a session in [`CaptureMode::Normal`].
    pub fn new(mapping: KeyMapping, engine: EngineState) -> Self {
        Self {
            mapping,
            engine,
            mode: CaptureMode::Normal,
        }
    }

    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    pub fn engine(&self) -> EngineState {
        self.engine
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.enabled
    }

    pub fn toggle_hotkey(&self) -> KeyCode {
        self.engine.toggle_hotkey
    }

    pub fn is_awaiting_hotkey(&self) -> bool {
        self.mode == CaptureMode::AwaitingHotkey
    }

    /// Handles a key picked on the on-screen keyboard.
    ///
    /// The first pick records the source; the second assigns source→target
    /// and returns to [`CaptureMode::Normal`] whether or not the table had room.
    pub fn pick_key(&mut self, code: KeyCode) -> Update {
        match self.mode {
            CaptureMode::Normal | CaptureMode::AwaitingHotkey => {
                self.mode = CaptureMode::PickingTarget { source: code };
                Update::notice(format!("Source = {code}"))
            }
            CaptureMode::PickingTarget { source } => {
                self.mode = CaptureMode::Normal;
                match self.mapping.assign(source, code) {
                    Ok(()) => {
                        debug!(%source, destination = %code, "mapping assigned");
                        Update {
                            notice: Some(format!("Mapped {source}→{code}")),
                            mapping_changed: true,
                            hotkey_changed: None,
                        }
                    }
                    Err(MappingError::CapacityExceeded { max }) => {
                        debug!(%source, max, "mapping table full");
                        Update::notice(format!("Max {max} reached."))
                    }
                }
            }
        }
    }

    /// Clears the table. The capture mode is left as it was.
    pub fn reset(&mut self) -> Update {
        self.mapping.reset();
        Update {
            notice: Some("Mappings reset.".to_string()),
            mapping_changed: true,
            hotkey_changed: None,
        }
    }

    /// Flips the enabled flag from the UI.
    ///
    /// Refused while a hotkey capture is pending so the capture prompt stays
    /// in front of the user.
    pub fn toggle_enabled(&mut self) -> Update {
        if self.is_awaiting_hotkey() {
            return Update::notice("Press key for new toggle…");
        }
        self.flip_enabled()
    }

    /// Flips the enabled flag because the toggle hotkey was pressed.
    pub fn toggle_from_hotkey(&mut self) -> Update {
        self.flip_enabled()
    }

    /// Arms hotkey capture from any mode, abandoning a pending source pick.
    pub fn begin_hotkey_capture(&mut self) -> Update {
        self.mode = CaptureMode::AwaitingHotkey;
        Update::notice("Press key for new toggle…")
    }

    /// Records `code` as the toggle hotkey if a capture is pending.
    pub fn capture_hotkey(&mut self, code: KeyCode) -> Update {
        if !self.is_awaiting_hotkey() {
            return Update::default();
        }
        self.engine.toggle_hotkey = code;
        self.mode = CaptureMode::Normal;
        Update {
            notice: Some(format!("Toggle hotkey set to {code}")),
            mapping_changed: false,
            hotkey_changed: Some(code),
        }
    }

    /// Builds the status report published alongside `message`.
    pub fn status(&self, message: impl Into<String>) -> StatusReport {
        StatusReport {
            message: message.into(),
            enabled: self.engine.enabled,
            toggle_hotkey: self.engine.toggle_hotkey,
            mappings: self.mapping.pairs(),
        }
    }

    fn flip_enabled(&mut self) -> Update {
        self.engine.enabled = !self.engine.enabled;
        Update::notice(if self.engine.enabled {
            "Remap ON"
        } else {
            "Remap OFF"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MAX_MAPPINGS;

    fn full_session() -> RemapSession {
        let mut mapping = KeyMapping::new();
        for i in 0..MAX_MAPPINGS as u16 {
            mapping.assign(KeyCode(0x41 + i), KeyCode(0x61 + i)).unwrap();
        }
        RemapSession::new(mapping, EngineState::default())
    }

    #[test]
    fn test_new_session_starts_normal_enabled_with_down_hotkey() {
        let s = RemapSession::default();

        assert_eq!(s.mode(), CaptureMode::Normal);
        assert!(s.is_enabled());
        assert_eq!(s.toggle_hotkey(), KeyCode(40));
    }

    #[test]
    fn test_two_picks_assign_mapping() {
        // Arrange
        let mut s = RemapSession::default();

        // Act
        let first = s.pick_key(KeyCode(65));
        let second = s.pick_key(KeyCode(66));

        // Assert
        assert_eq!(first.notice.as_deref(), Some("Source = 65"));
        assert!(!first.mapping_changed);
        assert_eq!(second.notice.as_deref(), Some("Mapped 65→66"));
        assert!(second.mapping_changed);
        assert_eq!(s.mapping().get(KeyCode(65)), Some(KeyCode(66)));
        assert_eq!(s.mode(), CaptureMode::Normal);
    }

    #[test]
    fn test_first_pick_enters_picking_target() {
        let mut s = RemapSession::default();

        s.pick_key(KeyCode(65));

        assert_eq!(s.mode(), CaptureMode::PickingTarget { source: KeyCode(65) });
    }

    #[test]
    fn test_pick_on_full_table_reports_max_and_discards_source() {
        // Arrange
        let mut s = full_session();
        let before = s.mapping().clone();

        // Act
        s.pick_key(KeyCode(0x70));
        let update = s.pick_key(KeyCode(0x71));

        // Assert
        assert_eq!(update.notice.as_deref(), Some("Max 5 reached."));
        assert!(!update.mapping_changed);
        assert_eq!(s.mapping(), &before);
        assert_eq!(s.mode(), CaptureMode::Normal);
    }

    #[test]
    fn test_pick_on_full_table_can_overwrite_existing_source() {
        let mut s = full_session();

        s.pick_key(KeyCode(0x41));
        let update = s.pick_key(KeyCode(0x20));

        assert!(update.mapping_changed);
        assert_eq!(s.mapping().get(KeyCode(0x41)), Some(KeyCode(0x20)));
    }

    #[test]
    fn test_reset_clears_mapping_and_keeps_mode() {
        let mut s = full_session();
        s.pick_key(KeyCode(0x70));

        let update = s.reset();

        assert_eq!(update.notice.as_deref(), Some("Mappings reset."));
        assert!(update.mapping_changed);
        assert!(s.mapping().is_empty());
        assert_eq!(s.mode(), CaptureMode::PickingTarget { source: KeyCode(0x70) });
    }

    #[test]
    fn test_toggle_enabled_flips_and_reports() {
        let mut s = RemapSession::default();

        let off = s.toggle_enabled();
        assert!(!s.is_enabled());
        let on = s.toggle_enabled();

        assert!(s.is_enabled());
        assert_eq!(off.notice.as_deref(), Some("Remap OFF"));
        assert_eq!(on.notice.as_deref(), Some("Remap ON"));
    }

    #[test]
    fn test_toggle_enabled_refused_while_awaiting_hotkey() {
        let mut s = RemapSession::default();
        s.begin_hotkey_capture();

        let update = s.toggle_enabled();

        assert!(s.is_enabled());
        assert_eq!(update.notice.as_deref(), Some("Press key for new toggle…"));
    }

    #[test]
    fn test_hotkey_capture_sets_hotkey_and_returns_to_normal() {
        // Arrange
        let mut s = RemapSession::default();
        s.begin_hotkey_capture();
        assert!(s.is_awaiting_hotkey());

        // Act
        let update = s.capture_hotkey(KeyCode(40));

        // Assert
        assert_eq!(s.toggle_hotkey(), KeyCode(40));
        assert_eq!(s.mode(), CaptureMode::Normal);
        assert_eq!(update.hotkey_changed, Some(KeyCode(40)));
        assert!(update.notice.unwrap().contains("40"));
    }

    #[test]
    fn test_capture_hotkey_without_pending_capture_is_noop() {
        let mut s = RemapSession::default();

        let update = s.capture_hotkey(KeyCode(0x41));

        assert!(update.is_empty());
        assert_eq!(s.toggle_hotkey(), KeyCode::DOWN);
    }

    #[test]
    fn test_begin_hotkey_capture_abandons_pending_source() {
        let mut s = RemapSession::default();
        s.pick_key(KeyCode(65));

        s.begin_hotkey_capture();
        s.capture_hotkey(KeyCode(0x91));
        let update = s.pick_key(KeyCode(66));

        assert_eq!(update.notice.as_deref(), Some("Source = 66"));
        assert!(s.mapping().is_empty());
    }

    #[test]
    fn test_pick_while_awaiting_hotkey_starts_new_pick() {
        let mut s = RemapSession::default();
        s.begin_hotkey_capture();

        let update = s.pick_key(KeyCode(65));

        assert_eq!(update.notice.as_deref(), Some("Source = 65"));
        assert_eq!(s.mode(), CaptureMode::PickingTarget { source: KeyCode(65) });
    }

    #[test]
    fn test_status_snapshots_engine_and_mapping() {
        let mut s = RemapSession::default();
        s.pick_key(KeyCode(65));
        s.pick_key(KeyCode(66));
        s.toggle_enabled();

        let report = s.status("Remap OFF");

        assert_eq!(report.message, "Remap OFF");
        assert!(!report.enabled);
        assert_eq!(report.toggle_hotkey, KeyCode::DOWN);
        assert_eq!(report.mappings, vec![(KeyCode(65), KeyCode(66))]);
    }
}
