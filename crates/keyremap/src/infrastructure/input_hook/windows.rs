//! Windows low-level keyboard hook implementation.
//!
//! Installs a WH_KEYBOARD_LL hook on a dedicated Win32 message-loop thread
//! running at THREAD_PRIORITY_TIME_CRITICAL.  The hook procedure calls the
//! gateway synchronously and returns its verdict: `LRESULT(1)` blocks the
//! event, `CallNextHookEx` forwards it.
//!
//! The gateway lives in a thread-local on the hook thread, so the callback
//! needs no global statics and no locking beyond what the gateway does.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use keyremap_core::{KeyCode, KeyEventNormalizer, Modifiers, Transition};
use tracing::{error, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::{
    GetCurrentThread, GetCurrentThreadId, SetThreadPriority, THREAD_PRIORITY_TIME_CRITICAL,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VK_CONTROL, VK_LWIN, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS,
    LLKHF_ALTDOWN, LLKHF_INJECTED, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP,
    WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use super::{HookError, KeyboardHook};
use crate::application::intercept::{HookVerdict, InterceptionGateway};
use crate::infrastructure::input_injection::INJECTION_SIGNATURE;

/// Per-thread state reached from the hook procedure.
struct HookContext {
    gateway: InterceptionGateway,
    normalizer: KeyEventNormalizer,
}

thread_local! {
    static HOOK_CONTEXT: RefCell<Option<HookContext>> = const { RefCell::new(None) };
}

/// Windows low-level keyboard hook.
pub struct WindowsKeyboardHook {
    thread: Option<JoinHandle<()>>,
    thread_id: u32,
}

impl WindowsKeyboardHook {
    /// Creates a new (uninstalled) hook.
    pub fn new() -> Self {
        Self {
            thread: None,
            thread_id: 0,
        }
    }
}

impl Default for WindowsKeyboardHook {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardHook for WindowsKeyboardHook {
    fn install(&mut self, gateway: InterceptionGateway) -> Result<(), HookError> {
        if self.thread.is_some() {
            return Err(HookError::AlreadyInstalled);
        }

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<u32, HookError>>(1);
        let handle = thread::Builder::new()
            .name("keyremap-hook".to_string())
            .spawn(move || run_hook_message_loop(gateway, ready_tx))
            .map_err(|e| HookError::InstallFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread_id = thread_id;
                self.thread = Some(handle);
                info!(thread_id, "keyboard hook installed");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(HookError::InstallFailed(
                    "hook thread exited before reporting".to_string(),
                ))
            }
        }
    }

    fn uninstall(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };
        // SAFETY: posting to a thread id we own; failure only means the thread is gone.
        if let Err(e) =
            unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
        {
            warn!("failed to post WM_QUIT to hook thread: {e}");
        }
        if handle.join().is_err() {
            error!("hook thread panicked during shutdown");
        }
        info!("keyboard hook removed");
    }
}

impl Drop for WindowsKeyboardHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(
    gateway: InterceptionGateway,
    ready: mpsc::SyncSender<Result<u32, HookError>>,
) {
    let mut msg = MSG::default();

    // SAFETY: plain Win32 calls on the current thread. PeekMessageW forces
    // creation of the thread message queue so PostThreadMessageW cannot race.
    let thread_id = unsafe {
        if let Err(e) = SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) {
            warn!("could not raise hook thread priority: {e}");
        }
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
        GetCurrentThreadId()
    };

    HOOK_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(HookContext {
            gateway,
            normalizer: KeyEventNormalizer::new(),
        });
    });

    // SAFETY: SetWindowsHookExW requires the calling thread to run a message loop,
    // which it does below.
    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) }
    {
        Ok(hook) => hook,
        Err(e) => {
            HOOK_CONTEXT.with(|ctx| ctx.borrow_mut().take());
            let _ = ready.send(Err(HookError::InstallFailed(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(thread_id));

    // Win32 message loop: exits on WM_QUIT (0) or error (-1).
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!("UnhookWindowsHookEx failed: {e}");
        }
    }

    HOOK_CONTEXT.with(|ctx| ctx.borrow_mut().take());
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread. It must return
/// quickly (< ~300ms) or the OS silently removes the hook.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

    let transition = match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => Transition::Down,
        WM_KEYUP | WM_SYSKEYUP => Transition::Up,
        _ => return CallNextHookEx(None, n_code, w_param, l_param),
    };

    let injected = (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0)
        && kbs.dwExtraInfo == INJECTION_SIGNATURE;
    if injected {
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    let code = KeyCode(kbs.vkCode as u16);
    let modifiers = current_modifiers(kbs);

    // A panic must never unwind across the FFI boundary; forward instead.
    let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
        dispatch(code, transition, modifiers, injected)
    }))
    .unwrap_or(HookVerdict::Forward);

    match verdict {
        HookVerdict::Block => LRESULT(1),
        // SAFETY: Forward the event to the next hook in the chain.
        HookVerdict::Forward => CallNextHookEx(None, n_code, w_param, l_param),
    }
}

fn dispatch(
    code: KeyCode,
    transition: Transition,
    modifiers: Modifiers,
    injected: bool,
) -> HookVerdict {
    HOOK_CONTEXT.with(|ctx| {
        // Re-entrant calls (e.g. while SendInput runs) find the context borrowed.
        let Ok(mut guard) = ctx.try_borrow_mut() else {
            return HookVerdict::Forward;
        };
        let Some(context) = guard.as_mut() else {
            return HookVerdict::Forward;
        };
        let event = context
            .normalizer
            .normalize(code, transition, modifiers, injected);
        context.gateway.handle(&event)
    })
}

/// Samples modifier state at the time of the event.
fn current_modifiers(kbs: &KBDLLHOOKSTRUCT) -> Modifiers {
    // SAFETY: GetAsyncKeyState is always safe to call.
    let pressed = |vk: u16| unsafe { (GetAsyncKeyState(vk as i32) as u16 & 0x8000) != 0 };
    Modifiers {
        alt: (kbs.flags & LLKHF_ALTDOWN) != KBDLLHOOKSTRUCT_FLAGS(0),
        ctrl: pressed(VK_CONTROL.0),
        shift: pressed(VK_SHIFT.0),
        win: pressed(VK_LWIN.0) || pressed(VK_RWIN.0),
    }
}
