//! On-screen keyboard grid offered to the user for picking keys.
//!
//! The UI renders [`KEY_ROWS`] as a grid of buttons; clicking a button issues
//! a `PickKey` command with the button's code.  The same table resolves key
//! labels typed at the command console and labels shown in logs.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).

use crate::keys::KeyCode;

/// One button of the on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyButton {
    pub label: &'static str,
    pub code: KeyCode,
}

const fn key(label: &'static str, code: u16) -> KeyButton {
    KeyButton {
        label,
        code: KeyCode(code),
    }
}

/// Rows of the on-screen keyboard, top to bottom.
pub const KEY_ROWS: &[&[KeyButton]] = &[
    &[
        key("Esc", 0x1B),
        key("F1", 0x70),
        key("F2", 0x71),
        key("F3", 0x72),
        key("F4", 0x73),
        key("F5", 0x74),
        key("F6", 0x75),
        key("F7", 0x76),
        key("F8", 0x77),
        key("F9", 0x78),
        key("F10", 0x79),
        key("F11", 0x7A),
        key("F12", 0x7B),
    ],
    &[
        key("`", 0xC0), // VK_OEM_3
        key("1", 0x31),
        key("2", 0x32),
        key("3", 0x33),
        key("4", 0x34),
        key("5", 0x35),
        key("6", 0x36),
        key("7", 0x37),
        key("8", 0x38),
        key("9", 0x39),
        key("0", 0x30),
        key("-", 0xBD), // VK_OEM_MINUS
        key("=", 0xBB), // VK_OEM_PLUS
        key("Bksp", 0x08),
    ],
    &[
        key("Tab", 0x09),
        key("Q", 0x51),
        key("W", 0x57),
        key("E", 0x45),
        key("R", 0x52),
        key("T", 0x54),
        key("Y", 0x59),
        key("U", 0x55),
        key("I", 0x49),
        key("O", 0x4F),
        key("P", 0x50),
        key("[", 0xDB),  // VK_OEM_4
        key("]", 0xDD),  // VK_OEM_6
        key("\\", 0xDC), // VK_OEM_5
    ],
    &[
        key("Caps", 0x14),
        key("A", 0x41),
        key("S", 0x53),
        key("D", 0x44),
        key("F", 0x46),
        key("G", 0x47),
        key("H", 0x48),
        key("J", 0x4A),
        key("K", 0x4B),
        key("L", 0x4C),
        key(";", 0xBA), // VK_OEM_1
        key("'", 0xDE), // VK_OEM_7
        key("Enter", 0x0D),
    ],
    &[
        key("LShift", 0xA0),
        key("Z", 0x5A),
        key("X", 0x58),
        key("C", 0x43),
        key("V", 0x56),
        key("B", 0x42),
        key("N", 0x4E),
        key("M", 0x4D),
        key(",", 0xBC), // VK_OEM_COMMA
        key(".", 0xBE), // VK_OEM_PERIOD
        key("/", 0xBF), // VK_OEM_2
        key("RShift", 0xA1),
    ],
    &[
        key("LCtrl", 0xA2),
        key("Win", 0x5B),
        key("LAlt", 0xA4),
        key("Space", 0x20),
        key("RAlt", 0xA5),
        key("Menu", 0x5D),
        key("RCtrl", 0xA3),
    ],
];

/// Iterates every button of the grid in row order.
pub fn buttons() -> impl Iterator<Item = &'static KeyButton> {
    KEY_ROWS.iter().flat_map(|row| row.iter())
}

/// Returns the grid label for `code`, if the grid has a button for it.
pub fn label_for(code: KeyCode) -> Option<&'static str> {
    buttons().find(|b| b.code == code).map(|b| b.label)
}

/// Resolves a grid label (case-insensitive) to its code.
pub fn code_for_label(label: &str) -> Option<KeyCode> {
    buttons()
        .find(|b| b.label.eq_ignore_ascii_case(label))
        .map(|b| b.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_has_six_rows() {
        assert_eq!(KEY_ROWS.len(), 6);
        assert_eq!(KEY_ROWS[0].len(), 13);
        assert_eq!(KEY_ROWS[5].len(), 7);
    }

    #[test]
    fn test_grid_codes_are_unique() {
        let mut codes: Vec<u16> = buttons().map(|b| b.code.0).collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total, "every button must have its own code");
    }

    #[test]
    fn test_label_for_known_and_unknown_codes() {
        assert_eq!(label_for(KeyCode(0x41)), Some("A"));
        assert_eq!(label_for(KeyCode::ESCAPE), Some("Esc"));
        assert_eq!(label_for(KeyCode::DOWN), None);
    }

    #[test]
    fn test_code_for_label_is_case_insensitive() {
        assert_eq!(code_for_label("a"), Some(KeyCode(0x41)));
        assert_eq!(code_for_label("SPACE"), Some(KeyCode::SPACE));
        assert_eq!(code_for_label("lctrl"), Some(KeyCode::LEFT_CONTROL));
        assert_eq!(code_for_label("nope"), None);
    }
}
