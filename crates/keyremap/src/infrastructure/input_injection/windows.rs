//! Windows key injection via the SendInput API.

#![cfg(target_os = "windows")]

use keyremap_core::{KeyCode, Transition};
use tracing::trace;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY,
};

use super::INJECTION_SIGNATURE;
use crate::application::intercept::{InjectionError, KeyInjector};

/// Virtual keys that live on the extended part of the keyboard.
const EXTENDED_VKS: &[u16] = &[
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // nav
    0x2D, 0x2E, // Insert, Delete
    0x5B, 0x5C, 0x5D, // Win keys, Menu
    0x6F, // Numpad divide
    0x90, // NumLock
    0xA3, 0xA5, // Right Ctrl, Right Alt
];

/// [`KeyInjector`] backed by `SendInput`, injecting by virtual-key code.
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SendInputInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInjector for SendInputInjector {
    fn inject(&self, code: KeyCode, transition: Transition) -> Result<(), InjectionError> {
        let vk = code.value();
        if vk == 0 || vk > 0xFF {
            return Err(InjectionError::InvalidKeyCode(code));
        }

        let mut flags = KEYBD_EVENT_FLAGS(0);
        if transition == Transition::Up {
            flags |= KEYEVENTF_KEYUP;
        }
        if EXTENDED_VKS.contains(&vk) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: INJECTION_SIGNATURE,
                },
            },
        };

        // SAFETY: input is a valid KEYBDINPUT structure on the stack
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(InjectionError::Platform(format!(
                "SendInput inserted {sent} of 1 events for key {code}"
            )));
        }
        trace!(%code, ?transition, "key injected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_rejects_none_code() {
        let injector = SendInputInjector::new();

        let result = injector.inject(KeyCode::NONE, Transition::Down);

        assert!(matches!(result, Err(InjectionError::InvalidKeyCode(KeyCode::NONE))));
    }

    #[test]
    fn test_inject_rejects_codes_above_vk_range() {
        let injector = SendInputInjector::new();

        let result = injector.inject(KeyCode(0x100), Transition::Up);

        assert!(matches!(result, Err(InjectionError::InvalidKeyCode(_))));
    }

    #[test]
    fn test_arrow_keys_are_extended() {
        assert!(EXTENDED_VKS.contains(&KeyCode::DOWN.value()));
        assert!(!EXTENDED_VKS.contains(&0x41));
    }
}
