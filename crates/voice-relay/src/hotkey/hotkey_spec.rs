//! Parsing of human-readable hotkey combinations such as `ctrl+shift+s`.

use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use tracing::warn;

const FUNCTION_KEYS: [Code; 12] = [
    Code::F1,
    Code::F2,
    Code::F3,
    Code::F4,
    Code::F5,
    Code::F6,
    Code::F7,
    Code::F8,
    Code::F9,
    Code::F10,
    Code::F11,
    Code::F12,
];

/// A parsed key combination: modifier flags plus one primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeySpec {
    /// Modifier flags that must be held.
    pub modifiers: Modifiers,
    /// The primary key.
    pub key: Code,
}

impl HotkeySpec {
    /// Parses `mod+mod+...+key`, case-insensitively.
    ///
    /// Every token but the last is a modifier (`ctrl`/`control`, `alt`,
    /// `shift`, `win`/`windows`/`meta`/`super`/`cmd`); unknown modifier tokens
    /// are ignored with a warning. The last token is the key: a named key, a
    /// single letter or digit, or `f1`..`f12`.
    ///
    /// # Errors
    ///
    /// `ParseError` if no key token resolves.
    #[track_caller]
    pub fn parse(spec: &str) -> AppResult<Self> {
        let tokens: Vec<String> = spec
            .split('+')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .collect();

        let Some((key_token, modifier_tokens)) = tokens.split_last() else {
            return Err(parse_error(spec, "no key given"));
        };

        let mut modifiers = Modifiers::empty();
        for token in modifier_tokens {
            match modifier_for(token) {
                Some(flag) => modifiers |= flag,
                None => warn!(spec, token = %token, "Ignoring unknown hotkey modifier"),
            }
        }

        let key = key_for(key_token)
            .ok_or_else(|| parse_error(spec, &format!("unrecognized key {:?}", key_token)))?;

        Ok(Self { modifiers, key })
    }

    /// The `global-hotkey` registration for this combination.
    pub fn hotkey(&self) -> HotKey {
        HotKey::new(Some(self.modifiers), self.key)
    }
}

#[track_caller]
fn parse_error(spec: &str, reason: &str) -> AppError {
    AppError::ParseError {
        spec: spec.to_string(),
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

fn modifier_for(token: &str) -> Option<Modifiers> {
    match token {
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        "win" | "windows" | "meta" | "super" | "cmd" => Some(Modifiers::META),
        _ => None,
    }
}

fn key_for(token: &str) -> Option<Code> {
    let named = match token {
        "space" => Some(Code::Space),
        "enter" | "return" => Some(Code::Enter),
        "escape" | "esc" => Some(Code::Escape),
        "tab" => Some(Code::Tab),
        "backspace" => Some(Code::Backspace),
        "delete" | "del" => Some(Code::Delete),
        "insert" | "ins" => Some(Code::Insert),
        "home" => Some(Code::Home),
        "end" => Some(Code::End),
        "pageup" | "pgup" => Some(Code::PageUp),
        "pagedown" | "pgdn" => Some(Code::PageDown),
        "up" | "arrowup" => Some(Code::ArrowUp),
        "down" | "arrowdown" => Some(Code::ArrowDown),
        "left" | "arrowleft" => Some(Code::ArrowLeft),
        "right" | "arrowright" => Some(Code::ArrowRight),
        _ => None,
    };

    named
        .or_else(|| function_key(token))
        .or_else(|| single_char_key(token))
}

fn function_key(token: &str) -> Option<Code> {
    let digits = token.strip_prefix('f')?;
    // Exact `f<N>` only: no leading zeros or signs.
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u8 = digits.parse().ok()?;
    FUNCTION_KEYS.get(usize::from(n).checked_sub(1)?).copied()
}

fn single_char_key(token: &str) -> Option<Code> {
    let mut chars = token.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    let code = match c {
        'a' => Code::KeyA,
        'b' => Code::KeyB,
        'c' => Code::KeyC,
        'd' => Code::KeyD,
        'e' => Code::KeyE,
        'f' => Code::KeyF,
        'g' => Code::KeyG,
        'h' => Code::KeyH,
        'i' => Code::KeyI,
        'j' => Code::KeyJ,
        'k' => Code::KeyK,
        'l' => Code::KeyL,
        'm' => Code::KeyM,
        'n' => Code::KeyN,
        'o' => Code::KeyO,
        'p' => Code::KeyP,
        'q' => Code::KeyQ,
        'r' => Code::KeyR,
        's' => Code::KeyS,
        't' => Code::KeyT,
        'u' => Code::KeyU,
        'v' => Code::KeyV,
        'w' => Code::KeyW,
        'x' => Code::KeyX,
        'y' => Code::KeyY,
        'z' => Code::KeyZ,
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
        _ => return None,
    };

    Some(code)
}
