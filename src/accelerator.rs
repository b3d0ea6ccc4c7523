//! Accelerator string grammar (spec §4.6 / §6.4): `{Mod}+{Mod}+...+{Key}`.
//!
//! Generalizes the teacher's closed `parse_hotkey_config`/
//! `hotkey_config_to_display` match-arm pair (`hotkeys/part_000.rs`) from a
//! fixed set of four built-in bindings to the full grammar this spec
//! requires, and reuses `global_hotkey`'s own `Modifiers`/`Code` types
//! instead of inventing a parallel vocabulary.

use std::fmt;

use global_hotkey::hotkey::{Code, Modifiers};

use crate::error::{CoreError, Result};

/// A parsed accelerator: modifier set plus exactly one non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    pub modifiers: Modifiers,
    pub code: Code,
}

impl Accelerator {
    pub fn parse(raw: &str) -> Result<Self> {
        let tokens: Vec<&str> = raw.split('+').map(str::trim).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Err(CoreError::HotkeyParse(raw.to_string()));
        }

        let mut modifiers = Modifiers::empty();
        let mut seen_modifiers = std::collections::HashSet::new();
        let mut key_code: Option<Code> = None;

        for token in &tokens {
            if let Some(m) = parse_modifier(token) {
                if !seen_modifiers.insert(token.to_ascii_lowercase()) {
                    return Err(CoreError::HotkeyParse(raw.to_string()));
                }
                modifiers |= m;
            } else if let Some(code) = parse_key(token) {
                if key_code.is_some() {
                    // more than one non-modifier key: invalid
                    return Err(CoreError::HotkeyParse(raw.to_string()));
                }
                key_code = Some(code);
            } else {
                return Err(CoreError::HotkeyParse(raw.to_string()));
            }
        }

        let code = key_code.ok_or_else(|| CoreError::HotkeyParse(raw.to_string()))?;
        Ok(Accelerator { modifiers, code })
    }

    /// Render back to canonical `Mod+Mod+Key` form. Not a byte-identical
    /// inverse of `parse` (case/whitespace/alias are normalized), but
    /// `parse(render(parse(s)?))? == parse(s)?` for any valid `s`.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("Ctrl");
        }
        if self.modifiers.contains(Modifiers::ALT) {
            parts.push("Alt");
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        if self.modifiers.contains(Modifiers::SUPER) {
            parts.push("Super");
        }
        let mut out = parts.join("+");
        if !out.is_empty() {
            out.push('+');
        }
        out.push_str(&key_display(self.code));
        out
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn parse_modifier(token: &str) -> Option<Modifiers> {
    match token.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" | "option" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        "super" | "meta" | "win" | "windows" | "cmd" | "command" => Some(Modifiers::SUPER),
        // CommandOrControl resolves to Ctrl on Windows, which is this backend's target platform.
        "commandorcontrol" => Some(Modifiers::CONTROL),
        _ => None,
    }
}

fn parse_key(token: &str) -> Option<Code> {
    let upper = token.to_ascii_uppercase();
    if upper.len() == 1 {
        let ch = upper.chars().next().unwrap();
        if ch.is_ascii_alphabetic() {
            return Some(letter_code(ch));
        }
        if ch.is_ascii_digit() {
            return Some(digit_code(ch));
        }
        return punctuation_code(ch);
    }

    if let Some(rest) = upper.strip_prefix('F') {
        if let Ok(n) = rest.parse::<u8>() {
            if (1..=24).contains(&n) {
                return Some(function_key_code(n));
            }
        }
    }

    match upper.as_str() {
        "SPACE" => Some(Code::Space),
        "ENTER" | "RETURN" => Some(Code::Enter),
        "TAB" => Some(Code::Tab),
        "ESC" | "ESCAPE" => Some(Code::Escape),
        "UP" | "ARROWUP" => Some(Code::ArrowUp),
        "DOWN" | "ARROWDOWN" => Some(Code::ArrowDown),
        "LEFT" | "ARROWLEFT" => Some(Code::ArrowLeft),
        "RIGHT" | "ARROWRIGHT" => Some(Code::ArrowRight),
        "HOME" => Some(Code::Home),
        "END" => Some(Code::End),
        "PAGEUP" => Some(Code::PageUp),
        "PAGEDOWN" => Some(Code::PageDown),
        "INSERT" => Some(Code::Insert),
        "DELETE" | "DEL" => Some(Code::Delete),
        "BACKSPACE" => Some(Code::Backspace),
        _ => None,
    }
}

fn key_display(code: Code) -> String {
    match code {
        Code::Space => "Space".into(),
        Code::Enter => "Enter".into(),
        Code::Tab => "Tab".into(),
        Code::Escape => "Esc".into(),
        Code::ArrowUp => "Up".into(),
        Code::ArrowDown => "Down".into(),
        Code::ArrowLeft => "Left".into(),
        Code::ArrowRight => "Right".into(),
        Code::Home => "Home".into(),
        Code::End => "End".into(),
        Code::PageUp => "PageUp".into(),
        Code::PageDown => "PageDown".into(),
        Code::Insert => "Insert".into(),
        Code::Delete => "Delete".into(),
        Code::Backspace => "Backspace".into(),
        Code::Semicolon => ";".into(),
        Code::Comma => ",".into(),
        Code::Period => ".".into(),
        Code::Slash => "/".into(),
        Code::Quote => "'".into(),
        Code::BracketLeft => "[".into(),
        Code::BracketRight => "]".into(),
        Code::Backslash => "\\".into(),
        Code::Minus => "-".into(),
        Code::Equal => "=".into(),
        Code::Backquote => "`".into(),
        other => {
            let s = format!("{other:?}");
            s.strip_prefix("Key")
                .or_else(|| s.strip_prefix("Digit"))
                .map(str::to_string)
                .unwrap_or(s)
        }
    }
}

fn letter_code(ch: char) -> Code {
    match ch {
        'A' => Code::KeyA,
        'B' => Code::KeyB,
        'C' => Code::KeyC,
        'D' => Code::KeyD,
        'E' => Code::KeyE,
        'F' => Code::KeyF,
        'G' => Code::KeyG,
        'H' => Code::KeyH,
        'I' => Code::KeyI,
        'J' => Code::KeyJ,
        'K' => Code::KeyK,
        'L' => Code::KeyL,
        'M' => Code::KeyM,
        'N' => Code::KeyN,
        'O' => Code::KeyO,
        'P' => Code::KeyP,
        'Q' => Code::KeyQ,
        'R' => Code::KeyR,
        'S' => Code::KeyS,
        'T' => Code::KeyT,
        'U' => Code::KeyU,
        'V' => Code::KeyV,
        'W' => Code::KeyW,
        'X' => Code::KeyX,
        'Y' => Code::KeyY,
        'Z' => Code::KeyZ,
        _ => unreachable!("letter_code called with non-alphabetic char"),
    }
}

fn digit_code(ch: char) -> Code {
    match ch {
        '0' => Code::Digit0,
        '1' => Code::Digit1,
        '2' => Code::Digit2,
        '3' => Code::Digit3,
        '4' => Code::Digit4,
        '5' => Code::Digit5,
        '6' => Code::Digit6,
        '7' => Code::Digit7,
        '8' => Code::Digit8,
        '9' => Code::Digit9,
        _ => unreachable!("digit_code called with non-digit char"),
    }
}

fn punctuation_code(ch: char) -> Option<Code> {
    match ch {
        ';' => Some(Code::Semicolon),
        ',' => Some(Code::Comma),
        '.' => Some(Code::Period),
        '/' => Some(Code::Slash),
        '\'' => Some(Code::Quote),
        '[' => Some(Code::BracketLeft),
        ']' => Some(Code::BracketRight),
        '\\' => Some(Code::Backslash),
        '-' => Some(Code::Minus),
        '=' => Some(Code::Equal),
        '`' => Some(Code::Backquote),
        _ => None,
    }
}

fn function_key_code(n: u8) -> Code {
    match n {
        1 => Code::F1,
        2 => Code::F2,
        3 => Code::F3,
        4 => Code::F4,
        5 => Code::F5,
        6 => Code::F6,
        7 => Code::F7,
        8 => Code::F8,
        9 => Code::F9,
        10 => Code::F10,
        11 => Code::F11,
        12 => Code::F12,
        13 => Code::F13,
        14 => Code::F14,
        15 => Code::F15,
        16 => Code::F16,
        17 => Code::F17,
        18 => Code::F18,
        19 => Code::F19,
        20 => Code::F20,
        21 => Code::F21,
        22 => Code::F22,
        23 => Code::F23,
        _ => Code::F24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_accelerator() {
        let acc = Accelerator::parse("Alt+S").unwrap();
        assert_eq!(acc.modifiers, Modifiers::ALT);
        assert_eq!(acc.code, Code::KeyS);
    }

    #[test]
    fn parses_multiple_modifiers_case_insensitively() {
        let acc = Accelerator::parse("ctrl+SHIFT+t").unwrap();
        assert_eq!(acc.modifiers, Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(acc.code, Code::KeyT);
    }

    #[test]
    fn command_or_control_resolves_to_ctrl() {
        let acc = Accelerator::parse("CommandOrControl+K").unwrap();
        assert_eq!(acc.modifiers, Modifiers::CONTROL);
    }

    #[test]
    fn rejects_duplicate_modifiers() {
        assert!(Accelerator::parse("Ctrl+Ctrl+A").is_err());
    }

    #[test]
    fn rejects_missing_key() {
        assert!(Accelerator::parse("Ctrl+Shift").is_err());
    }

    #[test]
    fn rejects_two_non_modifier_keys() {
        assert!(Accelerator::parse("A+B").is_err());
    }

    #[test]
    fn rejects_empty_string() {
        assert!(Accelerator::parse("").is_err());
    }

    #[test]
    fn parses_function_keys_up_to_24() {
        assert_eq!(Accelerator::parse("F24").unwrap().code, Code::F24);
        assert!(Accelerator::parse("F25").is_err());
    }

    #[test]
    fn parses_named_and_punctuation_keys() {
        assert_eq!(Accelerator::parse("Alt+Space").unwrap().code, Code::Space);
        assert_eq!(Accelerator::parse("Alt+;").unwrap().code, Code::Semicolon);
    }

    #[test]
    fn parse_render_parse_is_idempotent() {
        for raw in ["Alt+S", "Ctrl+Shift+T", "Super+F5", "Alt+;", "Ctrl+Alt+Shift+Home"] {
            let first = Accelerator::parse(raw).unwrap();
            let rendered = first.render();
            let second = Accelerator::parse(&rendered).unwrap();
            assert_eq!(first, second, "round trip mismatch for {raw}");
        }
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let a = Accelerator::parse("Alt + S").unwrap();
        let b = Accelerator::parse("Alt+S").unwrap();
        assert_eq!(a, b);
    }
}
