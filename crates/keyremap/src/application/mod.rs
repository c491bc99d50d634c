//! Application layer use cases for the remapper.
//!
//! Use cases in this layer orchestrate `keyremap-core` types, depend only on
//! traits they declare themselves (`KeyInjector`, `MappingPersistence`), and
//! contain no OS calls or file system access.
//!
//! # Sub-modules
//!
//! - **`intercept`** – The interception gateway invoked for every physical
//!   key event.  Runs inside the low-level hook callback, so it never blocks.
//!
//! - **`commands`** – Handlers for the UI-originated commands (pick key,
//!   reset, toggle, set hotkey).  They share the session with the gateway
//!   through the same mutex.
//!
//! - **`events`** – Events leaving the core for the UI and the process
//!   lifecycle (status updates, hotkey changes, exit requests).

pub mod commands;
pub mod events;
pub mod intercept;

use std::sync::{Arc, Mutex};

use keyremap_core::RemapSession;

/// The single serialization point shared by the hook callback and the UI commands.
pub type SharedSession = Arc<Mutex<RemapSession>>;

/// Wraps a session for sharing between the hook thread and the UI.
pub fn share_session(session: RemapSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}
