//! # keyremap-core
//!
//! Platform-independent heart of the key remapper: the source→destination
//! key table, the pure remap decision, and the state machine that decides
//! how the next physical key press is interpreted.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or the file
//! system.  The `keyremap` application crate wires it to the Windows
//! low-level keyboard hook and to persistent storage.
//!
//! # Architecture overview
//!
//! - **`keys`** – Key codes, normalized key events, and the repeat tracker
//!   that turns raw hook notifications into [`KeyEvent`]s.
//!
//! - **`mapping`** – [`KeyMapping`], the bounded source→destination table.
//!
//! - **`engine`** – [`decide`], the pure function that turns one key event
//!   into a pass-through, a suppression, or a synthesized replacement.
//!
//! - **`session`** – [`RemapSession`], the enable/disable and capture state
//!   machine shared by the hook callback and the UI commands.
//!
//! - **`status`** – [`StatusReport`], the notification pushed to the UI after
//!   every state change.
//!
//! - **`layout`** – The rows of the on-screen keyboard the UI offers for
//!   picking source and target keys.

pub mod engine;
pub mod keys;
pub mod layout;
pub mod mapping;
pub mod session;
pub mod status;

pub use engine::{decide, Action};
pub use keys::{KeyCode, KeyEvent, KeyEventNormalizer, Modifiers, Transition};
pub use mapping::{KeyMapping, MappingError, MAX_MAPPINGS};
pub use session::{CaptureMode, EngineState, RemapSession, Update};
pub use status::StatusReport;
