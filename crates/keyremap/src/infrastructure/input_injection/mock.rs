//! Recording key injector for unit and integration testing.
//!
//! Replaces `SendInput` with in-memory recording so assertions can inspect
//! exactly what would have been injected and in what order.
//!
//! ```ignore
//! let injector = Arc::new(RecordingInjector::new());
//! let mut gateway = InterceptionGateway::new(session, injector.clone(), events);
//!
//! gateway.handle(&KeyEvent::down(KeyCode(0x41)));
//!
//! assert_eq!(injector.injected(), vec![(KeyCode(0x42), Transition::Down)]);
//! ```

use std::sync::Mutex;

use keyremap_core::{KeyCode, Transition};

use crate::application::intercept::{InjectionError, KeyInjector};

/// A [`KeyInjector`] that records calls instead of touching the OS.
#[derive(Default)]
pub struct RecordingInjector {
    /// Every `(code, transition)` passed to `inject`, in call order.
    pub calls: Mutex<Vec<(KeyCode, Transition)>>,
    /// When `true`, every call is recorded and then fails with
    /// [`InjectionError::Platform`].
    pub should_fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded calls.
    pub fn injected(&self) -> Vec<(KeyCode, Transition)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&self, code: KeyCode, transition: Transition) -> Result<(), InjectionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((code, transition));
        }
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        // Arrange
        let injector = RecordingInjector::new();

        // Act
        injector.inject(KeyCode(0x42), Transition::Down).unwrap();
        injector.inject(KeyCode(0x42), Transition::Up).unwrap();

        // Assert
        assert_eq!(
            injector.injected(),
            vec![
                (KeyCode(0x42), Transition::Down),
                (KeyCode(0x42), Transition::Up)
            ]
        );
    }

    #[test]
    fn test_failing_injector_returns_platform_error() {
        let injector = RecordingInjector::failing();

        let result = injector.inject(KeyCode(0x42), Transition::Down);

        assert!(matches!(result, Err(InjectionError::Platform(_))));
        assert_eq!(injector.injected().len(), 1);
    }
}
