//! Violation kinds, termination causes and transition codes

use serde::{Deserialize, Serialize};

use crate::types::Round;

/// Proctoring rule broken by an observed signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    FullscreenExit,
    TabSwitch,
    DevTools,
    CopyPaste,
}

impl ViolationKind {
    /// Reason string persisted and shown on the termination screen
    pub fn reason(&self) -> &'static str {
        match self {
            Self::FullscreenExit => "Exited fullscreen mode.",
            Self::TabSwitch => "Switched to another tab or window.",
            Self::DevTools => "Developer tools were opened.",
            Self::CopyPaste => "Copy/paste actions are disabled.",
        }
    }

    /// Key-driven violations also block the key's default action
    pub fn suppresses_default(&self) -> bool {
        matches!(self, Self::DevTools | Self::CopyPaste)
    }
}

/// Why an attempt was forcibly ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    Violation(ViolationKind),
    TimeUp { round: Round, title: String },
}

impl TerminationCause {
    pub fn reason(&self) -> String {
        match self {
            Self::Violation(kind) => kind.reason().to_string(),
            Self::TimeUp { title, .. } => format!("Time ran out for {}.", title),
        }
    }
}

/// Stable codes attached to every phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum TransitionCode {
    // =========================================================================
    // T00x: Normal progression
    // =========================================================================
    /// Credential accepted by the registry
    T001_LOGIN_ACCEPTED,
    /// Round started, proctoring armed
    T002_ROUND_STARTED,
    /// Round score recorded, moving to the next intro
    T003_ROUND_COMPLETED,
    /// Round 1 + 2 total reached the gate
    T004_GATE_PASSED,
    /// Round 1 + 2 total below the gate, attempt over
    T004_GATE_FAILED,
    /// All rounds done, attempt over
    T005_ASSESSMENT_FINISHED,
    /// Final results displayed
    T006_RESULTS_SHOWN,

    // =========================================================================
    // T1xx: Escapes
    // =========================================================================
    /// Proctoring violation or time-up
    T101_TERMINATED,
    /// Staff resume code cleared the termination record
    T102_RESUMED,
    /// Fullscreen refused while entering a round, back to the intro
    T103_FULLSCREEN_REFUSED,
}

impl TransitionCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::T001_LOGIN_ACCEPTED => "T001_LOGIN_ACCEPTED",
            Self::T002_ROUND_STARTED => "T002_ROUND_STARTED",
            Self::T003_ROUND_COMPLETED => "T003_ROUND_COMPLETED",
            Self::T004_GATE_PASSED => "T004_GATE_PASSED",
            Self::T004_GATE_FAILED => "T004_GATE_FAILED",
            Self::T005_ASSESSMENT_FINISHED => "T005_ASSESSMENT_FINISHED",
            Self::T006_RESULTS_SHOWN => "T006_RESULTS_SHOWN",
            Self::T101_TERMINATED => "T101_TERMINATED",
            Self::T102_RESUMED => "T102_RESUMED",
            Self::T103_FULLSCREEN_REFUSED => "T103_FULLSCREEN_REFUSED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::T001_LOGIN_ACCEPTED => "Credential accepted",
            Self::T002_ROUND_STARTED => "Round started",
            Self::T003_ROUND_COMPLETED => "Round completed",
            Self::T004_GATE_PASSED => "Qualified for the final round",
            Self::T004_GATE_FAILED => "Did not reach the final round",
            Self::T005_ASSESSMENT_FINISHED => "All rounds completed",
            Self::T006_RESULTS_SHOWN => "Results shown",
            Self::T101_TERMINATED => "Attempt terminated",
            Self::T102_RESUMED => "Termination lock cleared",
            Self::T103_FULLSCREEN_REFUSED => "Fullscreen refused",
        }
    }
}

impl std::fmt::Display for TransitionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
