//! The remap decision.
//!
//! [`decide`] is the only code that consults the mapping table on the hook
//! path.  It is pure: no state is kept between calls.  Because down and up
//! events are translated by the same rule, holding a mapped key yields a
//! stream of destination downs (one per auto-repeat) followed by exactly one
//! destination up, with no key-state bookkeeping.

use crate::keys::{KeyCode, KeyEvent, Transition};
use crate::mapping::KeyMapping;

/// What the gateway should do with one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deliver the original event untouched.
    PassThrough,
    /// Swallow the original event and emit nothing.
    Suppress,
    /// Swallow the original event and inject `code` with `transition` instead.
    Synthesize { code: KeyCode, transition: Transition },
}

/// Decides how `event` is handled given the current table and enabled flag.
#[inline]
pub fn decide(event: &KeyEvent, mapping: &KeyMapping, enabled: bool) -> Action {
    if !enabled {
        return Action::PassThrough;
    }
    match mapping.get(event.code) {
        None => Action::PassThrough,
        Some(KeyCode::NONE) => Action::Suppress,
        Some(code) => Action::Synthesize {
            code,
            transition: event.transition,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MAX_MAPPINGS;

    fn mapping_a_to_b() -> KeyMapping {
        let mut m = KeyMapping::new();
        m.assign(KeyCode(0x41), KeyCode(0x42)).unwrap();
        m
    }

    #[test]
    fn test_disabled_always_passes_through() {
        // Arrange: every source in a full table, including a disabled key.
        let mut m = KeyMapping::new();
        for i in 0..MAX_MAPPINGS as u16 - 1 {
            m.assign(KeyCode(0x41 + i), KeyCode(0x61 + i)).unwrap();
        }
        m.assign(KeyCode(0x5A), KeyCode::NONE).unwrap();

        // Act / Assert
        for (source, _) in m.pairs() {
            for ev in [
                KeyEvent::down(source),
                KeyEvent::down(source).repeated(),
                KeyEvent::up(source),
            ] {
                assert_eq!(decide(&ev, &m, false), Action::PassThrough);
            }
        }
    }

    #[test]
    fn test_unmapped_key_passes_through() {
        let m = mapping_a_to_b();

        assert_eq!(decide(&KeyEvent::down(KeyCode(0x43)), &m, true), Action::PassThrough);
        assert_eq!(decide(&KeyEvent::up(KeyCode(0x43)), &m, true), Action::PassThrough);
    }

    #[test]
    fn test_mapped_down_synthesizes_destination_down() {
        let m = mapping_a_to_b();

        let action = decide(&KeyEvent::down(KeyCode(0x41)), &m, true);

        assert_eq!(
            action,
            Action::Synthesize {
                code: KeyCode(0x42),
                transition: Transition::Down
            }
        );
    }

    #[test]
    fn test_mapped_up_synthesizes_destination_up() {
        let m = mapping_a_to_b();

        let action = decide(&KeyEvent::up(KeyCode(0x41)), &m, true);

        assert_eq!(
            action,
            Action::Synthesize {
                code: KeyCode(0x42),
                transition: Transition::Up
            }
        );
    }

    #[test]
    fn test_holding_mapped_key_resynthesizes_every_repeat() {
        // Arrange
        let m = mapping_a_to_b();
        let held = [
            KeyEvent::down(KeyCode(0x41)),
            KeyEvent::down(KeyCode(0x41)).repeated(),
            KeyEvent::down(KeyCode(0x41)).repeated(),
            KeyEvent::up(KeyCode(0x41)),
        ];

        // Act
        let actions: Vec<Action> = held.iter().map(|ev| decide(ev, &m, true)).collect();

        // Assert
        let down = Action::Synthesize {
            code: KeyCode(0x42),
            transition: Transition::Down,
        };
        let up = Action::Synthesize {
            code: KeyCode(0x42),
            transition: Transition::Up,
        };
        assert_eq!(actions, vec![down, down, down, up]);
    }

    #[test]
    fn test_mapping_to_none_suppresses() {
        let mut m = KeyMapping::new();
        m.assign(KeyCode::CAPS_LOCK, KeyCode::NONE).unwrap();

        assert_eq!(decide(&KeyEvent::down(KeyCode::CAPS_LOCK), &m, true), Action::Suppress);
        assert_eq!(decide(&KeyEvent::up(KeyCode::CAPS_LOCK), &m, true), Action::Suppress);
    }
}
