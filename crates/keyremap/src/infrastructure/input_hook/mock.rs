//! Mock keyboard hook for unit and integration testing.
//!
//! Feeds synthetic key events through the same normalization and gateway
//! path the Windows hook uses, and returns the verdict the real callback
//! would act on.

use keyremap_core::{KeyCode, KeyEventNormalizer, Modifiers, Transition};

use super::{HookError, KeyboardHook};
use crate::application::intercept::{HookVerdict, InterceptionGateway};

/// A [`KeyboardHook`] driven by test code instead of the OS.
#[derive(Default)]
pub struct MockKeyboardHook {
    gateway: Option<InterceptionGateway>,
    normalizer: KeyEventNormalizer,
}

impl MockKeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.gateway.is_some()
    }

    /// Delivers one raw event, as if the OS had called the hook procedure.
    ///
    /// Panics if the hook is not installed.
    pub fn feed(
        &mut self,
        code: KeyCode,
        transition: Transition,
        modifiers: Modifiers,
        injected: bool,
    ) -> HookVerdict {
        let gateway = self
            .gateway
            .as_mut()
            .expect("MockKeyboardHook::feed called before install()");
        let event = self
            .normalizer
            .normalize(code, transition, modifiers, injected);
        gateway.handle(&event)
    }

    /// Shorthand for a physical press with no modifiers.
    pub fn press(&mut self, code: KeyCode) -> HookVerdict {
        self.feed(code, Transition::Down, Modifiers::NONE, false)
    }

    /// Shorthand for a physical release with no modifiers.
    pub fn release(&mut self, code: KeyCode) -> HookVerdict {
        self.feed(code, Transition::Up, Modifiers::NONE, false)
    }
}

impl KeyboardHook for MockKeyboardHook {
    fn install(&mut self, gateway: InterceptionGateway) -> Result<(), HookError> {
        if self.gateway.is_some() {
            return Err(HookError::AlreadyInstalled);
        }
        self.gateway = Some(gateway);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.gateway = None;
        self.normalizer = KeyEventNormalizer::new();
    }
}
