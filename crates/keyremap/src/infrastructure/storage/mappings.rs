//! JSON persistence for the mapping table.
//!
//! The file is a flat object keyed by the decimal source code:
//!
//! ```json
//! {
//!   "20": 27,
//!   "65": 66
//! }
//! ```
//!
//! Loading is forgiving: anything unreadable yields an empty table and a
//! warning, and a table with too many entries is cut down to the lowest
//! sources.  Saving writes a sibling temp file and renames it over the
//! target so a crash mid-write never leaves a truncated file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use keyremap_core::{KeyCode, KeyMapping};
use tracing::{debug, info, warn};

pub use crate::application::commands::StoreError;
use crate::application::commands::MappingPersistence;

/// Reads and writes the mapping table at a fixed path.
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted table.  Never fails; problems are logged and an
    /// empty table is returned.
    pub fn load(&self) -> KeyMapping {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no mapping file yet");
                return KeyMapping::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), "cannot read mapping file: {e}");
                return KeyMapping::new();
            }
        };

        let Some(text) = decode_text(&bytes) else {
            warn!(path = %self.path.display(), "mapping file is not valid UTF-8 or UTF-16");
            return KeyMapping::new();
        };

        let raw: BTreeMap<u16, u16> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), "malformed mapping file, starting empty: {e}");
                return KeyMapping::new();
            }
        };

        let (mapping, dropped) =
            KeyMapping::from_pairs_truncated(raw.into_iter().map(|(s, d)| (KeyCode(s), KeyCode(d))));
        if dropped > 0 {
            warn!(dropped, kept = mapping.len(), "mapping file over capacity, extra entries ignored");
        }
        info!(entries = mapping.len(), path = %self.path.display(), "mappings loaded");
        mapping
    }

    /// Writes `mapping` atomically, creating parent directories on demand.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] on any I/O failure, [`StoreError::Encode`]
    /// if serialization fails.
    pub fn save(&self, mapping: &KeyMapping) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Unavailable {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(mapping)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, content).map_err(|source| StoreError::Unavailable {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            StoreError::Unavailable {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(entries = mapping.len(), path = %self.path.display(), "mappings written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl MappingPersistence for MappingStore {
    fn persist(&self, mapping: &KeyMapping) -> Result<(), StoreError> {
        self.save(mapping)
    }
}

/// Decodes UTF-8 (optional BOM) or BOM-prefixed UTF-16 text.
fn decode_text(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).ok(),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
