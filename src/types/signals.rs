//! Host signals observed by the violation monitor

use serde::{Deserialize, Serialize};

use crate::types::ViolationKind;

/// Signal categories a handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    FullscreenChange,
    VisibilityChange,
    KeyDown,
    ContextMenu,
}

/// A single key press with its modifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStroke {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyStroke {
    pub fn plain(key: impl Into<String>) -> Self {
        Self { key: key.into(), ctrl: false, shift: false }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self { key: key.into(), ctrl: true, shift: false }
    }

    pub fn ctrl_shift(key: impl Into<String>) -> Self {
        Self { key: key.into(), ctrl: true, shift: true }
    }

    /// Parse a combination such as `ctrl+shift+i` or `F12`.
    /// Modifier names are case-insensitive; the last segment is the key.
    pub fn parse(combo: &str) -> Option<Self> {
        let mut parts: Vec<&str> = combo.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty())?;
        let mut stroke = Self::plain(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => stroke.ctrl = true,
                "shift" => stroke.shift = true,
                _ => return None,
            }
        }
        Some(stroke)
    }
}

impl std::fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        f.write_str(&self.key)
    }
}

/// An observable event from the host environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    FullscreenChange { fullscreen: bool },
    VisibilityChange { hidden: bool },
    KeyDown(KeyStroke),
    ContextMenu,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::FullscreenChange { .. } => SignalKind::FullscreenChange,
            Signal::VisibilityChange { .. } => SignalKind::VisibilityChange,
            Signal::KeyDown(_) => SignalKind::KeyDown,
            Signal::ContextMenu => SignalKind::ContextMenu,
        }
    }
}

/// What a handler decided about one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalVerdict {
    /// Not relevant to this handler
    Ignore,
    /// Block the default action, no violation
    Suppress,
    /// Block the default action and report a violation
    Violation(ViolationKind),
}

/// Combined verdicts of every handler a signal reached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Host should prevent the signal's default action
    pub suppressed: bool,
    /// Violations in handler subscription order
    pub violations: Vec<ViolationKind>,
}

impl DispatchOutcome {
    pub fn absorb(&mut self, verdict: SignalVerdict) {
        match verdict {
            SignalVerdict::Ignore => {}
            SignalVerdict::Suppress => self.suppressed = true,
            SignalVerdict::Violation(kind) => {
                self.suppressed |= kind.suppresses_default();
                self.violations.push(kind);
            }
        }
    }

    pub fn first_violation(&self) -> Option<ViolationKind> {
        self.violations.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_combinations() {
        assert_eq!(KeyStroke::parse("ctrl+shift+i"), Some(KeyStroke::ctrl_shift("i")));
        assert_eq!(KeyStroke::parse("Ctrl+V"), Some(KeyStroke::ctrl("V")));
        assert_eq!(KeyStroke::parse("F12"), Some(KeyStroke::plain("F12")));
        assert_eq!(KeyStroke::parse("alt+tab"), None);
        assert_eq!(KeyStroke::parse("ctrl+"), None);
    }

    #[test]
    fn test_violation_verdict_suppresses_key_signals_only() {
        let mut outcome = DispatchOutcome::default();
        outcome.absorb(SignalVerdict::Violation(ViolationKind::TabSwitch));
        assert!(!outcome.suppressed);
        outcome.absorb(SignalVerdict::Violation(ViolationKind::CopyPaste));
        assert!(outcome.suppressed);
        assert_eq!(outcome.first_violation(), Some(ViolationKind::TabSwitch));
    }
}
