//! Session phase definitions

use serde::{Deserialize, Serialize};

use crate::types::Round;

/// Where the participant is in the assessment flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Credential entry
    Login,
    Intro1,
    Level1,
    Intro2,
    Level2,
    Intro3,
    Level3,
    /// Round 3 finished, results not shown yet
    IntroFinal,
    /// Final results after all three rounds
    Thankyou,
    /// Score gate failed after round 2
    Lost,
    /// Ended by a violation or time-up; survives reload
    Terminated,
}

impl Phase {
    /// Round being played, if this is an active-round phase
    pub fn active_round(&self) -> Option<Round> {
        match self {
            Phase::Level1 => Some(Round::One),
            Phase::Level2 => Some(Round::Two),
            Phase::Level3 => Some(Round::Three),
            _ => None,
        }
    }

    /// Round this intro screen leads into
    pub fn upcoming_round(&self) -> Option<Round> {
        match self {
            Phase::Intro1 => Some(Round::One),
            Phase::Intro2 => Some(Round::Two),
            Phase::Intro3 => Some(Round::Three),
            _ => None,
        }
    }

    pub fn is_active_round(&self) -> bool {
        self.active_round().is_some()
    }

    /// Fullscreen is required exactly while a round is active
    pub fn requires_fullscreen(&self) -> bool {
        self.is_active_round()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Login => "login",
            Phase::Intro1 => "intro1",
            Phase::Level1 => "level1",
            Phase::Intro2 => "intro2",
            Phase::Level2 => "level2",
            Phase::Intro3 => "intro3",
            Phase::Level3 => "level3",
            Phase::IntroFinal => "introFinal",
            Phase::Thankyou => "thankyou",
            Phase::Lost => "lost",
            Phase::Terminated => "terminated",
        }
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Phase::Login => "\x1b[90m",                                  // Gray
            Phase::Intro1 | Phase::Intro2 | Phase::Intro3 => "\x1b[36m", // Cyan
            Phase::Level1 | Phase::Level2 | Phase::Level3 => "\x1b[33m", // Yellow
            Phase::IntroFinal | Phase::Thankyou => "\x1b[32m",           // Green
            Phase::Lost | Phase::Terminated => "\x1b[31m",               // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
