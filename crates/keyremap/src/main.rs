//! Key Remapper entry point.
//!
//! Wires together the infrastructure services and starts the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config.toml + mappings.json
//!  └─ RemapSession (shared by hook thread and UI)
//!  └─ start services
//!       ├─ WindowsKeyboardHook  (dedicated Win32 message-loop thread)
//!       ├─ event pump           (Tokio task: status, hotkey persistence, exit)
//!       └─ command console      (Tokio task reading stdin)
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyremap::application::commands::RemapCommands;
use keyremap::application::events::EventPublisher;
use keyremap::application::intercept::InterceptionGateway;
use keyremap::application::share_session;
use keyremap::infrastructure::input_hook::platform_hook;
use keyremap::infrastructure::input_injection::platform_injector;
use keyremap::infrastructure::storage::config::{
    config_file_path, load_startup_config, mappings_file_path,
};
use keyremap::infrastructure::storage::mappings::MappingStore;
use keyremap::infrastructure::ui_bridge::console::{render_status, run_console};
use keyremap::infrastructure::ui_bridge::{run_event_pump, AppState};
use keyremap_core::status::WELCOME_MESSAGE;
use keyremap_core::RemapSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config comes first so its log level can seed the filter; problems are
    // reported once logging is up.
    let startup = load_startup_config(config_file_path());
    let config = startup.config;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!("Key Remapper starting");
    if let Some(problem) = &startup.problem {
        warn!("using default configuration: {problem}");
        if startup.save_path.is_none() {
            warn!("configuration changes will not be saved this session");
        }
    }

    // ── Shared state ──────────────────────────────────────────────────────────
    let store = Arc::new(MappingStore::new(mappings_file_path(&config, &startup.base_dir)));
    let session = share_session(RemapSession::new(store.load(), config.engine_state()));

    let (events, event_rx) = EventPublisher::channel();
    let commands = RemapCommands::new(session.clone(), store, events.clone());
    let state = AppState::new(commands, config, startup.save_path);

    // ── Keyboard hook ─────────────────────────────────────────────────────────
    let injector = platform_injector().context("key injection unavailable")?;
    let gateway = InterceptionGateway::new(session, injector, events);
    let mut hook = platform_hook().context("keyboard hook unavailable")?;
    hook.install(gateway).context("failed to install keyboard hook")?;

    // ── Event pump ────────────────────────────────────────────────────────────
    tokio::spawn(run_event_pump(Arc::clone(&state), event_rx, |report| {
        print!("{}", render_status(report));
    }));
    state.commands.announce(WELCOME_MESSAGE);

    // ── Command console ───────────────────────────────────────────────────────
    tokio::spawn(run_console(
        Arc::clone(&state),
        BufReader::new(tokio::io::stdin()),
    ));

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            state_clone.request_exit();
        }
    });

    info!("Key Remapper ready.  Press Ctrl+C or type `quit` to exit.");

    while state.is_running() {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    hook.uninstall();
    info!("Key Remapper stopped");

    // A pending stdin read would otherwise keep the runtime alive.
    std::process::exit(0)
}
