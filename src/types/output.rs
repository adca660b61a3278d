//! Transition records for logs and terminal display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Phase, TransitionCode};

/// One phase change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub timestamp: DateTime<Utc>,
    pub from: Phase,
    pub to: Phase,
    pub code: TransitionCode,
    /// Free-form detail (termination reason, score, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Transition {
    pub fn new(from: Phase, to: Phase, code: TransitionCode) -> Self {
        Self { timestamp: Utc::now(), from, to, code, detail: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.to.color_code();
        let reset = Phase::color_reset();
        match &self.detail {
            Some(detail) => format!(
                "{}{} → {} | {} | {}{}",
                color, self.from, self.to, self.code.code(), detail, reset
            ),
            None => format!("{}{} → {} | {}{}", color, self.from, self.to, self.code.code(), reset),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let mut line = format!(
            "at={} | from={} | to={} | code={}",
            self.timestamp.to_rfc3339(),
            self.from,
            self.to,
            self.code.code()
        );
        if let Some(detail) = &self.detail {
            line.push_str(&format!(" | detail={}", detail));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parseable_string_has_no_ansi() {
        let t = Transition::new(Phase::Level2, Phase::Terminated, TransitionCode::T101_TERMINATED)
            .with_detail("Exited fullscreen mode.");
        let line = t.to_parseable_string();
        assert!(!line.contains('\x1b'));
        assert!(line.contains("from=level2 | to=terminated | code=T101_TERMINATED"));
        assert!(line.ends_with("detail=Exited fullscreen mode."));
    }
}
