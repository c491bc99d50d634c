//! InterceptionGateway: decides the fate of every physical key event.
//!
//! This use case is the heart of the remapper.  The platform hook hands it
//! each normalized [`KeyEvent`]; it applies a fixed precedence of filters,
//! consults the shared [`RemapSession`](keyremap_core::RemapSession), and
//! tells the hook whether to forward or block the original event.
//!
//! # Precedence
//!
//! 1. Events this process injected itself are forwarded untouched.
//! 2. Reserved gestures (Alt+Tab, Alt+Esc) are forwarded untouched.
//! 3. The exit gesture (Ctrl+C down) requests shutdown and is blocked.
//! 4. A pending hotkey capture consumes the next key-down.
//! 5. A key-down of the toggle hotkey flips remapping on or off.
//! 6. Everything else goes through [`decide`].
//!
//! Only a key's first press runs through that list.  Its auto-repeats and
//! its release replay whatever the press did (forwarded, blocked, or remapped
//! to a destination), so a press that was forwarded under lock contention or
//! swallowed as the hotkey never leaves a stray release behind.
//!
//! # Never block, never fail
//!
//! The hook callback runs under a platform timeout; exceeding it silently
//! removes the hook.  The session is therefore reached with `try_lock`, and
//! every failure path (contended lock, injection error) forwards the
//! original event so keyboard input keeps flowing.

use std::collections::HashMap;
use std::sync::{Arc, TryLockError};

use keyremap_core::{decide, Action, KeyCode, KeyEvent, Transition};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::events::{CoreEvent, EventPublisher};
use super::SharedSession;

/// What the hook should do with the original event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookVerdict {
    /// Hand the event to the next hook and on to applications.
    Forward,
    /// Consume the event; applications never see it.
    Block,
}

/// Error type for synthetic input injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("key code {0} cannot be injected")]
    InvalidKeyCode(KeyCode),
    #[error("platform injection error: {0}")]
    Platform(String),
}

/// Injects one synthetic key event into the platform input stream.
///
/// Infrastructure implementations call `SendInput`; tests record calls.
#[cfg_attr(test, mockall::automock)]
pub trait KeyInjector: Send + Sync {
    fn inject(&self, code: KeyCode, transition: Transition) -> Result<(), InjectionError>;
}

/// Returns `true` for window-management gestures that must never be touched.
pub fn is_reserved_gesture(event: &KeyEvent) -> bool {
    event.modifiers.alt && (event.code == KeyCode::TAB || event.code == KeyCode::ESCAPE)
}

/// Returns `true` for the key-down that requests process shutdown.
pub fn is_exit_gesture(event: &KeyEvent) -> bool {
    event.is_down() && event.modifiers.ctrl && event.code == KeyCode::C
}

/// How a key-down was handled.  Its repeats and its release follow the
/// same route so every press stays paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressRoute {
    Forward,
    Block,
    Remap(KeyCode),
}

/// The single entry point the platform hook calls for every key event.
pub struct InterceptionGateway {
    session: SharedSession,
    injector: Arc<dyn KeyInjector>,
    events: EventPublisher,
    /// Route taken by each key currently held down.
    held: HashMap<KeyCode, PressRoute>,
}

impl InterceptionGateway {
    /// Creates a gateway over the shared session.
    pub fn new(
        session: SharedSession,
        injector: Arc<dyn KeyInjector>,
        events: EventPublisher,
    ) -> Self {
        Self {
            session,
            injector,
            events,
            held: HashMap::new(),
        }
    }

    /// Handles one key event and returns the verdict for the original.
    ///
    /// Repeats and releases of a key whose press was already handled replay
    /// that press's route, whatever the session says now.
    pub fn handle(&mut self, event: &KeyEvent) -> HookVerdict {
        if event.injected {
            return HookVerdict::Forward;
        }

        let recorded = if event.is_down() {
            self.held.get(&event.code).copied().filter(|_| event.is_repeat)
        } else {
            self.held.remove(&event.code)
        };
        let route = match recorded {
            Some(route) => route,
            None => self.route(event),
        };

        let taken = self.dispatch(event, route);
        if event.is_down() && recorded.is_none() {
            self.held.insert(event.code, taken);
        }
        match taken {
            PressRoute::Forward => HookVerdict::Forward,
            PressRoute::Block | PressRoute::Remap(_) => HookVerdict::Block,
        }
    }

    /// Decides the route for an event with no recorded press.
    fn route(&self, event: &KeyEvent) -> PressRoute {
        if is_reserved_gesture(event) {
            trace!(code = %event.code, "reserved gesture passed through");
            return PressRoute::Forward;
        }
        if is_exit_gesture(event) {
            info!("exit gesture pressed");
            self.events.publish(CoreEvent::ExitRequested);
            return PressRoute::Block;
        }

        let mut session = match self.session.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!(code = %event.code, "session busy, passing event through");
                return PressRoute::Forward;
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!("session lock poisoned; continuing with last known state");
                poisoned.into_inner()
            }
        };

        if session.is_awaiting_hotkey() {
            if !event.is_down() {
                return PressRoute::Forward;
            }
            let update = session.capture_hotkey(event.code);
            let report = session.status(update.notice.unwrap_or_default());
            drop(session);
            info!(hotkey = %event.code, "toggle hotkey captured");
            if let Some(code) = update.hotkey_changed {
                self.events.publish(CoreEvent::HotkeyChanged(code));
            }
            self.events.publish(CoreEvent::Status(report));
            return PressRoute::Block;
        }

        if event.is_down() && event.code == session.toggle_hotkey() {
            if event.is_repeat {
                return PressRoute::Block;
            }
            let update = session.toggle_from_hotkey();
            let report = session.status(update.notice.unwrap_or_default());
            drop(session);
            info!(enabled = report.enabled, "remapping toggled by hotkey");
            self.events.publish(CoreEvent::Status(report));
            return PressRoute::Block;
        }

        let action = decide(event, session.mapping(), session.is_enabled());
        drop(session);

        match action {
            Action::PassThrough => PressRoute::Forward,
            Action::Suppress => PressRoute::Block,
            Action::Synthesize { code, .. } => PressRoute::Remap(code),
        }
    }

    /// Carries out `route` for `event` and returns the route actually taken.
    fn dispatch(&self, event: &KeyEvent, route: PressRoute) -> PressRoute {
        let PressRoute::Remap(code) = route else {
            if route == PressRoute::Block {
                trace!(code = %event.code, "key blocked");
            }
            return route;
        };
        match self.injector.inject(code, event.transition) {
            Ok(()) => {
                trace!(source = %event.code, destination = %code, transition = ?event.transition, "key remapped");
                route
            }
            Err(e) => {
                warn!(source = %event.code, destination = %code, "injection failed, passing original through: {e}");
                PressRoute::Forward
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
