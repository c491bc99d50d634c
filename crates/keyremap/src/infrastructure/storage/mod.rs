//! Storage infrastructure: configuration and mapping file persistence.
//!
//! - **`config`** reads and writes the TOML settings file in the platform
//!   config directory, with serde defaults for first run.
//! - **`mappings`** loads and saves the JSON mapping table.  Loading never
//!   fails the caller; saving is atomic (temp file + rename).

pub mod config;
pub mod mappings;
