//! Status notifications pushed to the UI after every state change.

use std::fmt;

use crate::keys::KeyCode;

/// Prompt shown when the remapper starts.
pub const WELCOME_MESSAGE: &str = "Click source→target (max 5). ▼ toggles; Set Hotkey to change.";

/// A snapshot of everything the status display shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// The single current-status line.
    pub message: String,
    pub enabled: bool,
    pub toggle_hotkey: KeyCode,
    /// `(source, destination)` pairs in ascending source order.
    pub mappings: Vec<(KeyCode, KeyCode)>,
}

impl StatusReport {
    /// Renders the mapping dump shown below the key grid.
    ///
    /// ```text
    /// [ON] Active remaps:
    ///   65 → 66
    /// ```
    pub fn console_text(&self) -> String {
        let mut text = if self.enabled {
            String::from("[ON] Active remaps:\r\n")
        } else {
            String::from("[OFF] Remapping paused\r\n")
        };
        for (source, destination) in &self.mappings {
            text.push_str(&format!("  {source} → {destination}\r\n"));
        }
        text
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
