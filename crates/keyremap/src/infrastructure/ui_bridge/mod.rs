//! UI command bridge: exposes application-layer operations to the front end.
//!
//! Every command function lives here and delegates to the shared
//! [`AppState`].  The console in [`console`] is the bundled front end; any
//! other widget (tray app, web view) would call the same functions.
//!
//! # Data Transfer Objects
//!
//! Core types such as [`KeyCode`] and [`StatusReport`] are converted into
//! plain serializable DTOs (`StatusDto`, `MappingDto`, `KeyButtonDto`) that
//! carry both numeric codes and display labels.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so
//! every response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.

pub mod console;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keyremap_core::layout::KEY_ROWS;
use keyremap_core::{KeyCode, StatusReport};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::commands::RemapCommands;
use crate::application::events::CoreEvent;
use crate::infrastructure::storage::config::{save_config_to, AppConfig};

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between the UI commands and the event pump.
///
/// `config` and `latest_status` use the async Tokio mutex because they are
/// only touched from async tasks.  The remap session itself sits behind the
/// std mutex inside [`RemapCommands`] since the hook thread shares it.
pub struct AppState {
    pub commands: RemapCommands,
    /// The most recent status pushed by the core.
    pub latest_status: Mutex<StatusReport>,
    /// The current application configuration.
    pub config: Mutex<AppConfig>,
    /// Where config changes are written back; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    /// Cleared when the process should shut down.
    pub running: AtomicBool,
}

impl AppState {
    pub fn new(
        commands: RemapCommands,
        config: AppConfig,
        config_path: Option<PathBuf>,
    ) -> Arc<Self> {
        let initial = commands.snapshot("");
        Arc::new(Self {
            commands,
            latest_status: Mutex::new(initial),
            config: Mutex::new(config),
            config_path,
            running: AtomicBool::new(true),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals every loop in the process to wind down.
    pub fn request_exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// DTO for one `source → destination` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDto {
    pub source: u16,
    pub destination: u16,
    pub source_label: Option<String>,
    pub destination_label: Option<String>,
}

/// DTO for the status display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    pub message: String,
    pub enabled: bool,
    pub toggle_hotkey: u16,
    pub toggle_hotkey_label: Option<String>,
    pub mappings: Vec<MappingDto>,
    /// Pre-rendered mapping dump.
    pub console_text: String,
}

impl From<&StatusReport> for StatusDto {
    fn from(r: &StatusReport) -> Self {
        Self {
            message: r.message.clone(),
            enabled: r.enabled,
            toggle_hotkey: r.toggle_hotkey.value(),
            toggle_hotkey_label: label_string(r.toggle_hotkey),
            mappings: r
                .mappings
                .iter()
                .map(|&(source, destination)| MappingDto {
                    source: source.value(),
                    destination: destination.value(),
                    source_label: label_string(source),
                    destination_label: label_string(destination),
                })
                .collect(),
            console_text: r.console_text(),
        }
    }
}

/// DTO for one on-screen keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyButtonDto {
    pub label: String,
    pub code: u16,
}

fn label_string(code: KeyCode) -> Option<String> {
    code.label().map(str::to_string)
}

/// Unified response wrapper used by every UI command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── UI commands ───────────────────────────────────────────────────────────────

/// Picks a key on the on-screen keyboard.
///
/// The first pick selects the source, the second assigns source → `code`.
pub async fn pick_key(state: Arc<AppState>, code: u16) -> CommandResult<StatusDto> {
    let report = state.commands.pick_key(KeyCode(code));
    CommandResult::ok(StatusDto::from(&report))
}

/// Clears all mappings.
pub async fn reset_mappings(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let report = state.commands.reset();
    CommandResult::ok(StatusDto::from(&report))
}

/// Flips remapping on or off.  Refused while a hotkey capture is pending.
pub async fn toggle_enabled(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let report = state.commands.toggle_enabled();
    CommandResult::ok(StatusDto::from(&report))
}

/// Arms capture: the next physical key press becomes the toggle hotkey.
pub async fn begin_hotkey_capture(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let report = state.commands.begin_hotkey_capture();
    CommandResult::ok(StatusDto::from(&report))
}

/// Returns the most recent status pushed by the core.
pub async fn get_status(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let report = state.latest_status.lock().await;
    CommandResult::ok(StatusDto::from(&*report))
}

/// Returns the on-screen keyboard grid, row by row.
pub async fn get_keyboard_layout() -> CommandResult<Vec<Vec<KeyButtonDto>>> {
    let rows = KEY_ROWS
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| KeyButtonDto {
                    label: b.label.to_string(),
                    code: b.code.value(),
                })
                .collect()
        })
        .collect();
    CommandResult::ok(rows)
}

/// Requests process shutdown.
pub async fn quit(state: Arc<AppState>) -> CommandResult<()> {
    info!("exit requested from UI");
    state.request_exit();
    CommandResult::ok(())
}

// ── Event pump ────────────────────────────────────────────────────────────────

/// Applies one core event to the shared state.
///
/// Returns the status report to render when the event carried one.
pub async fn apply_core_event(state: &AppState, event: CoreEvent) -> Option<StatusReport> {
    match event {
        CoreEvent::Status(report) => {
            *state.latest_status.lock().await = report.clone();
            Some(report)
        }
        CoreEvent::HotkeyChanged(code) => {
            let mut config = state.config.lock().await;
            config.remap.toggle_hotkey = code.value();
            match &state.config_path {
                Some(path) => match save_config_to(path, &config) {
                    Ok(()) => debug!(hotkey = %code, "toggle hotkey saved to config"),
                    Err(e) => warn!("failed to save toggle hotkey: {e}"),
                },
                None => warn!(hotkey = %code, "toggle hotkey changed for this session only"),
            }
            None
        }
        CoreEvent::ExitRequested => {
            info!("exit gesture received");
            state.request_exit();
            None
        }
    }
}

/// Drains core events until the channel closes or shutdown is requested,
/// handing every status report to `render`.
pub async fn run_event_pump(
    state: Arc<AppState>,
    mut events: UnboundedReceiver<CoreEvent>,
    render: impl Fn(&StatusReport),
) {
    while let Some(event) = events.recv().await {
        if let Some(report) = apply_core_event(&state, event).await {
            render(&report);
        }
        if !state.is_running() {
            break;
        }
    }
    debug!("event pump stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::{MappingPersistence, StoreError};
    use crate::application::events::EventPublisher;
    use crate::application::share_session;
    use crate::infrastructure::storage::config::{load_config_from, load_startup_config};
    use keyremap_core::{EngineState, KeyMapping, RemapSession};

    struct NullStore;

    impl MappingPersistence for NullStore {
        fn persist(&self, _mapping: &KeyMapping) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn make_state(config_path: Option<PathBuf>) -> (Arc<AppState>, UnboundedReceiver<CoreEvent>) {
        let session = share_session(RemapSession::new(KeyMapping::new(), EngineState::default()));
        let (events, rx) = EventPublisher::channel();
        let commands = RemapCommands::new(session, Arc::new(NullStore), events);
        (AppState::new(commands, AppConfig::default(), config_path), rx)
    }

    #[tokio::test]
    async fn test_pick_key_twice_returns_mapping_dto() {
        // Arrange
        let (state, _rx) = make_state(None);

        // Act
        pick_key(state.clone(), 0x41).await;
        let result = pick_key(state, 0x42).await;

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.message, "Mapped 65→66");
        assert_eq!(
            dto.mappings,
            vec![MappingDto {
                source: 65,
                destination: 66,
                source_label: Some("A".to_string()),
                destination_label: Some("B".to_string()),
            }]
        );
        assert!(dto.console_text.contains("65 → 66"));
    }

    #[tokio::test]
    async fn test_toggle_then_status_reflects_pump() {
        // Arrange
        let (state, mut rx) = make_state(None);

        // Act
        let toggled = toggle_enabled(state.clone()).await;
        let event = rx.recv().await.unwrap();
        apply_core_event(&state, event).await;
        let status = get_status(state).await;

        // Assert
        assert!(!toggled.data.unwrap().enabled);
        let status = status.data.unwrap();
        assert_eq!(status.message, "Remap OFF");
        assert!(!status.enabled);
    }

    #[tokio::test]
    async fn test_begin_hotkey_capture_prompts_user() {
        let (state, _rx) = make_state(None);

        let result = begin_hotkey_capture(state).await;

        assert_eq!(result.data.unwrap().message, "Press key for new toggle…");
    }

    #[tokio::test]
    async fn test_reset_mappings_clears_table() {
        let (state, _rx) = make_state(None);
        pick_key(state.clone(), 0x41).await;
        pick_key(state.clone(), 0x42).await;

        let result = reset_mappings(state).await;

        assert!(result.data.unwrap().mappings.is_empty());
    }

    #[tokio::test]
    async fn test_keyboard_layout_has_six_rows() {
        let result = get_keyboard_layout().await;

        let rows = result.data.unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0][0], KeyButtonDto { label: "Esc".to_string(), code: 0x1B });
    }

    #[tokio::test]
    async fn test_hotkey_changed_is_written_to_config_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let (state, _rx) = make_state(Some(path.clone()));

        // Act
        apply_core_event(&state, CoreEvent::HotkeyChanged(KeyCode(0x91))).await;

        // Assert
        assert_eq!(state.config.lock().await.remap.toggle_hotkey, 0x91);
        assert_eq!(load_config_from(&path).unwrap().remap.toggle_hotkey, 0x91);
    }

    #[tokio::test]
    async fn test_hotkey_changed_leaves_unparsable_config_untouched() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let broken = "[remap]\ntoggle_hotkey = 145\nstart_enabled = maybe\n";
        std::fs::write(&path, broken).unwrap();
        let startup = load_startup_config(Ok(path.clone()));
        let (state, _rx) = make_state(startup.save_path);

        // Act
        apply_core_event(&state, CoreEvent::HotkeyChanged(KeyCode(0x91))).await;

        // Assert
        assert_eq!(state.config.lock().await.remap.toggle_hotkey, 0x91);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[tokio::test]
    async fn test_exit_requested_stops_pump() {
        // Arrange
        let (state, _rx) = make_state(None);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(CoreEvent::ExitRequested).unwrap();

        // Act: returns even though the sender is still alive
        run_event_pump(state.clone(), rx, |_| {}).await;

        // Assert
        assert!(!state.is_running());
    }

    #[test]
    fn test_command_result_err_has_no_data() {
        let result: CommandResult<u8> = CommandResult::err("boom");

        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
