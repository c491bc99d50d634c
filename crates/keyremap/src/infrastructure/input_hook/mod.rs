//! Keyboard hook infrastructure.
//!
//! On Windows this installs a low-level keyboard hook (WH_KEYBOARD_LL) on a
//! dedicated Win32 message loop thread.  Unlike a capture-only hook, the
//! callback decides synchronously whether each event is forwarded or
//! blocked, so it calls straight into the
//! [`InterceptionGateway`](crate::application::intercept::InterceptionGateway)
//! rather than deferring work through a channel.
//!
//! # Testability
//!
//! The [`KeyboardHook`] trait lets tests drive the gateway with synthetic
//! events through [`mock::MockKeyboardHook`] without any OS hooks.

use crate::application::intercept::InterceptionGateway;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for hook installation.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),
    #[error("keyboard hook is already installed")]
    AlreadyInstalled,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Routes every physical key event through an [`InterceptionGateway`].
pub trait KeyboardHook: Send {
    /// Installs the hook. Events start flowing to `gateway` immediately.
    fn install(&mut self, gateway: InterceptionGateway) -> Result<(), HookError>;
    /// Removes the hook and releases all OS resources. Idempotent.
    fn uninstall(&mut self);
}

/// Returns the keyboard hook for the current platform.
///
/// # Errors
///
/// Returns [`HookError::UnsupportedPlatform`] on anything but Windows.
pub fn platform_hook() -> Result<Box<dyn KeyboardHook>, HookError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsKeyboardHook::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(HookError::UnsupportedPlatform(
            "low-level keyboard hooks require Windows".to_string(),
        ))
    }
}
