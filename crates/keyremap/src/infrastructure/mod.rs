//! Infrastructure layer for the remapper.
//!
//! Contains OS-facing adapters: the low-level keyboard hook, synthetic key
//! injection, file-system storage, and the console UI bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyremap_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod input_hook;
pub mod input_injection;
pub mod storage;
pub mod ui_bridge;
