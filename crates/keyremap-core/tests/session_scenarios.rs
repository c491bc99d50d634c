//! Integration tests for the session state machine and remap engine.
//!
//! These tests drive `RemapSession` and `decide` together through the public
//! API, the same way the interception gateway and the UI commands do.

use keyremap_core::{
    decide, Action, CaptureMode, EngineState, KeyCode, KeyEvent, KeyMapping, Modifiers,
    RemapSession, Transition, MAX_MAPPINGS,
};

fn remap(session: &RemapSession, event: KeyEvent) -> Action {
    decide(&event, session.mapping(), session.is_enabled())
}

#[test]
fn test_picked_mapping_is_applied_to_key_events() {
    let mut session = RemapSession::default();
    session.pick_key(KeyCode(65));
    session.pick_key(KeyCode(66));

    assert_eq!(
        remap(&session, KeyEvent::down(KeyCode(65))),
        Action::Synthesize {
            code: KeyCode(66),
            transition: Transition::Down
        }
    );
    assert_eq!(
        remap(&session, KeyEvent::up(KeyCode(65))),
        Action::Synthesize {
            code: KeyCode(66),
            transition: Transition::Up
        }
    );
}

#[test]
fn test_disabling_stops_remapping_and_reenabling_restores_it() {
    let mut session = RemapSession::default();
    session.pick_key(KeyCode(65));
    session.pick_key(KeyCode(66));

    session.toggle_from_hotkey();
    let while_off = remap(&session, KeyEvent::down(KeyCode(65)));
    session.toggle_from_hotkey();
    let while_on = remap(&session, KeyEvent::down(KeyCode(65)));

    assert_eq!(while_off, Action::PassThrough);
    assert!(matches!(while_on, Action::Synthesize { .. }));
}

#[test]
fn test_filling_table_through_picks_then_rejecting_next() {
    let mut session = RemapSession::default();
    for i in 0..MAX_MAPPINGS as u16 {
        session.pick_key(KeyCode(0x41 + i));
        let update = session.pick_key(KeyCode(0x61 + i));
        assert!(update.mapping_changed);
    }

    session.pick_key(KeyCode(0x70));
    let update = session.pick_key(KeyCode(0x71));

    assert_eq!(update.notice.as_deref(), Some("Max 5 reached."));
    assert_eq!(session.mapping().len(), MAX_MAPPINGS);
    assert_eq!(session.mode(), CaptureMode::Normal);
}

#[test]
fn test_session_starts_from_loaded_mapping_and_engine_state() {
    let mut mapping = KeyMapping::new();
    mapping.assign(KeyCode(0x14), KeyCode(0x1B)).unwrap();
    let engine = EngineState {
        enabled: false,
        toggle_hotkey: KeyCode(0x91),
    };

    let session = RemapSession::new(mapping, engine);

    assert!(!session.is_enabled());
    assert_eq!(session.toggle_hotkey(), KeyCode(0x91));
    assert_eq!(
        remap(&session, KeyEvent::down(KeyCode(0x14)).with_modifiers(Modifiers::NONE)),
        Action::PassThrough
    );
}
