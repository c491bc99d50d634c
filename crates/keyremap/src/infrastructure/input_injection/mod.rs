//! Synthetic key injection.
//!
//! Implements the application layer's
//! [`KeyInjector`](crate::application::intercept::KeyInjector) port.  Every
//! event we inject is tagged with [`INJECTION_SIGNATURE`] so the hook can
//! recognize its own output and forward it instead of remapping it again.

use std::sync::Arc;

use crate::application::intercept::{InjectionError, KeyInjector};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Value written to `dwExtraInfo` of every injected event ("KRMP").
pub const INJECTION_SIGNATURE: usize = 0x4B52_4D50;

/// Returns the injector for the current platform.
///
/// # Errors
///
/// Returns [`InjectionError::Platform`] on anything but Windows.
pub fn platform_injector() -> Result<Arc<dyn KeyInjector>, InjectionError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::SendInputInjector::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(InjectionError::Platform(
            "key injection requires Windows".to_string(),
        ))
    }
}
