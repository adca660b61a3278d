//! Score aggregation and the round 2 → round 3 gate

use serde::Serialize;

use crate::config::RoundConfig;
use crate::types::{Round, Scores};

/// Round 1 + round 2 total meets the (inclusive) threshold
pub fn advance_eligible(scores: &Scores, threshold: u32) -> bool {
    gate_total(scores) >= threshold
}

/// The total the gate is evaluated on. Saturates: round scores are not
/// clamped to their maximum.
pub fn gate_total(scores: &Scores) -> u32 {
    scores.level1.saturating_add(scores.level2)
}

pub fn total_score(scores: &Scores) -> u32 {
    gate_total(scores).saturating_add(scores.level3)
}

fn saturating_sum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

/// One row of a result card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreLine {
    pub title: String,
    pub score: u32,
    pub max: u32,
}

/// Scores of every round played up to and including `through`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub lines: Vec<ScoreLine>,
    pub total: u32,
    pub possible: u32,
}

pub fn summary(scores: &Scores, rounds: &[RoundConfig; 3], through: Round) -> ScoreSummary {
    let lines: Vec<ScoreLine> = Round::ALL
        .iter()
        .filter(|round| **round <= through)
        .map(|round| {
            let config = &rounds[round.index()];
            ScoreLine {
                title: config.title.clone(),
                score: scores.get(*round),
                max: config.max_score,
            }
        })
        .collect();
    ScoreSummary {
        total: saturating_sum(lines.iter().map(|line| line.score)),
        possible: saturating_sum(lines.iter().map(|line| line.max)),
        lines,
    }
}
