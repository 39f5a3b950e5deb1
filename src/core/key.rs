//! # Keys
//!
//! Backend-neutral key events. The crossterm adapter translates raw terminal
//! events into `Key` values; configuration files name keys with the textual
//! form parsed by `Key::from_str` (`"Tab"`, `"Shift-Tab"`, `"Ctrl-c"`, `"q"`).

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

impl Key {
    /// Ctrl-C quits regardless of focus or editing state.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Key::Ctrl('c'))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Ctrl(c) => write!(f, "Ctrl-{c}"),
            Key::Enter => write!(f, "Enter"),
            Key::Esc => write!(f, "Esc"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Tab => write!(f, "Tab"),
            Key::BackTab => write!(f, "Shift-Tab"),
            Key::Up => write!(f, "↑"),
            Key::Down => write!(f, "↓"),
            Key::Left => write!(f, "←"),
            Key::Right => write!(f, "→"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError(pub String);

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized key name: {:?}", self.0)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }

        let lower = s.trim().to_ascii_lowercase();
        if let Some(rest) = lower
            .strip_prefix("ctrl-")
            .or_else(|| lower.strip_prefix("ctrl+"))
        {
            let mut rest_chars = rest.chars();
            return match (rest_chars.next(), rest_chars.next()) {
                (Some(c), None) => Ok(Key::Ctrl(c)),
                _ => Err(ParseKeyError(s.to_string())),
            };
        }

        match lower.as_str() {
            "enter" | "return" => Ok(Key::Enter),
            "esc" | "escape" => Ok(Key::Esc),
            "backspace" => Ok(Key::Backspace),
            "delete" | "del" => Ok(Key::Delete),
            "tab" => Ok(Key::Tab),
            "backtab" | "shift-tab" | "shift+tab" => Ok(Key::BackTab),
            "up" => Ok(Key::Up),
            "down" => Ok(Key::Down),
            "left" => Ok(Key::Left),
            "right" => Ok(Key::Right),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "space" => Ok(Key::Char(' ')),
            _ => Err(ParseKeyError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_char() {
        assert_eq!("q".parse::<Key>(), Ok(Key::Char('q')));
        assert_eq!("Q".parse::<Key>(), Ok(Key::Char('Q')));
    }

    #[test]
    fn test_parse_named_keys_case_insensitive() {
        assert_eq!("Tab".parse::<Key>(), Ok(Key::Tab));
        assert_eq!("shift-tab".parse::<Key>(), Ok(Key::BackTab));
        assert_eq!("BackTab".parse::<Key>(), Ok(Key::BackTab));
        assert_eq!("ESCAPE".parse::<Key>(), Ok(Key::Esc));
        assert_eq!("space".parse::<Key>(), Ok(Key::Char(' ')));
    }

    #[test]
    fn test_parse_ctrl_combos() {
        assert_eq!("Ctrl-c".parse::<Key>(), Ok(Key::Ctrl('c')));
        assert_eq!("ctrl+x".parse::<Key>(), Ok(Key::Ctrl('x')));
        assert!("ctrl-xy".parse::<Key>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "F13".parse::<Key>().unwrap_err();
        assert!(err.to_string().contains("F13"));
    }

    #[test]
    fn test_deserialize_from_toml_list() {
        #[derive(Deserialize)]
        struct Keys {
            keys: Vec<Key>,
        }
        let parsed: Keys = toml::from_str(r#"keys = ["Tab", "Down", "n"]"#).unwrap();
        assert_eq!(parsed.keys, vec![Key::Tab, Key::Down, Key::Char('n')]);
    }

    #[test]
    fn test_interrupt() {
        assert!(Key::Ctrl('c').is_interrupt());
        assert!(!Key::Char('c').is_interrupt());
    }
}
