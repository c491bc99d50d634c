//! Line-oriented command console, the bundled front end.
//!
//! ```text
//! pick <code|label>   pick a source, then a target (e.g. `pick caps`, `pick 27`)
//! reset               clear all mappings
//! toggle              turn remapping on/off
//! hotkey              capture the next key press as the toggle hotkey
//! status              show the current status and mappings
//! keys                show the on-screen keyboard
//! quit                exit
//! ```

use std::sync::Arc;

use keyremap_core::layout::{code_for_label, KEY_ROWS};
use keyremap_core::{KeyCode, StatusReport};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::{
    begin_hotkey_capture, get_status, pick_key, quit, reset_mappings, toggle_enabled, AppState,
};

pub const HELP_TEXT: &str = "\
commands:
  pick <code|label>   pick a source, then a target (`none` disables the source)
  reset               clear all mappings
  toggle              turn remapping on/off
  hotkey              capture the next key press as the toggle hotkey
  status              show the current status and mappings
  keys                show the on-screen keyboard
  quit                exit
";

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pick(KeyCode),
    Reset,
    Toggle,
    Hotkey,
    Status,
    Keys,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("`pick` needs a key code or label")]
    MissingKey,
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

impl ConsoleCommand {
    /// Parses one line.  Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "pick" | "p" => {
                let key = words.next().ok_or(ParseError::MissingKey)?;
                ConsoleCommand::Pick(parse_key(key)?)
            }
            "reset" => ConsoleCommand::Reset,
            "toggle" | "t" => ConsoleCommand::Toggle,
            "hotkey" => ConsoleCommand::Hotkey,
            "status" | "s" => ConsoleCommand::Status,
            "keys" => ConsoleCommand::Keys,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Resolves a key argument: grid labels first, then `none`, decimal, or `0x` hex.
fn parse_key(text: &str) -> Result<KeyCode, ParseError> {
    if let Some(code) = code_for_label(text) {
        return Ok(code);
    }
    if text.eq_ignore_ascii_case("none") {
        return Ok(KeyCode::NONE);
    }
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed
        .map(KeyCode)
        .map_err(|_| ParseError::UnknownKey(text.to_string()))
}

/// Renders a status report the way the console prints it.
pub fn render_status(report: &StatusReport) -> String {
    let mut text = String::new();
    if !report.message.is_empty() {
        text.push_str(&report.message);
        text.push_str("\r\n");
    }
    text.push_str(&report.console_text());
    text
}

/// Renders the on-screen keyboard as `label(code)` rows.
pub fn render_keyboard() -> String {
    KEY_ROWS
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| format!("{}({})", b.label, b.code))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Executes one command and returns text to print directly.
///
/// State-changing commands print nothing here; their status arrives through
/// the event pump like every other update.
pub async fn execute(state: Arc<AppState>, command: ConsoleCommand) -> Option<String> {
    match command {
        ConsoleCommand::Pick(code) => {
            pick_key(state, code.value()).await;
            None
        }
        ConsoleCommand::Reset => {
            reset_mappings(state).await;
            None
        }
        ConsoleCommand::Toggle => {
            toggle_enabled(state).await;
            None
        }
        ConsoleCommand::Hotkey => {
            begin_hotkey_capture(state).await;
            None
        }
        ConsoleCommand::Status => get_status(state).await.data.map(|dto| {
            let hotkey = dto
                .toggle_hotkey_label
                .unwrap_or_else(|| dto.toggle_hotkey.to_string());
            format!("toggle hotkey: {hotkey}\r\n{}", dto.console_text)
        }),
        ConsoleCommand::Keys => Some(render_keyboard()),
        ConsoleCommand::Help => Some(HELP_TEXT.to_string()),
        ConsoleCommand::Quit => {
            quit(state).await;
            None
        }
    }
}

/// Reads commands from `input` until EOF, `quit`, or shutdown.
pub async fn run_console<R>(state: Arc<AppState>, input: R)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while state.is_running() {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!("console input closed: {e}");
                break;
            }
        };
        match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => {
                if let Some(text) = execute(state.clone(), command).await {
                    println!("{text}");
                }
            }
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }
    debug!("console stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
