//! Rounds and per-round scores

use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// One of the three scored sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Round {
    One,
    Two,
    Three,
}

impl Round {
    pub const ALL: [Round; 3] = [Round::One, Round::Two, Round::Three];

    pub fn from_number(n: u8) -> Option<Round> {
        match n {
            1 => Some(Round::One),
            2 => Some(Round::Two),
            3 => Some(Round::Three),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Round::One => 1,
            Round::Two => 2,
            Round::Three => 3,
        }
    }

    /// Zero-based position, for per-round tables
    pub fn index(&self) -> usize {
        self.number() as usize - 1
    }

    /// Transition screen preceding this round
    pub fn intro_phase(&self) -> Phase {
        match self {
            Round::One => Phase::Intro1,
            Round::Two => Phase::Intro2,
            Round::Three => Phase::Intro3,
        }
    }

    /// Phase while this round is being played
    pub fn level_phase(&self) -> Phase {
        match self {
            Round::One => Phase::Level1,
            Round::Two => Phase::Level2,
            Round::Three => Phase::Level3,
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round {}", self.number())
    }
}

/// Accumulated round scores. Written only by the session controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub level1: u32,
    pub level2: u32,
    pub level3: u32,
}

impl Scores {
    pub fn get(&self, round: Round) -> u32 {
        match round {
            Round::One => self.level1,
            Round::Two => self.level2,
            Round::Three => self.level3,
        }
    }

    pub(crate) fn set(&mut self, round: Round, score: u32) {
        match round {
            Round::One => self.level1 = score,
            Round::Two => self.level2 = score,
            Round::Three => self.level3 = score,
        }
    }
}
