//! Session configuration: round budgets, score gate and persistence namespace.
//!
//! Defaults come from the crate constants. A JSON file may override any field;
//! missing fields keep their defaults. Resume codes are not part of it:
//! they are fixed at build time (see [`crate::resume_codes`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Round;
use crate::{
    GATE_THRESHOLD, ROUND1_DURATION_SECS, ROUND1_MAX_SCORE, ROUND1_TITLE, ROUND2_DURATION_SECS,
    ROUND2_MAX_SCORE, ROUND2_TITLE, ROUND3_DURATION_SECS, ROUND3_MAX_SCORE, ROUND3_TITLE,
    TERMINATION_NAMESPACE,
};

/// Time budget, title and maximum score of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub duration_secs: u32,
    pub title: String,
    pub max_score: u32,
}

impl RoundConfig {
    pub fn new(duration_secs: u32, title: impl Into<String>, max_score: u32) -> Self {
        Self { duration_secs, title: title.into(), max_score }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rounds: [RoundConfig; 3],
    pub gate_threshold: u32,
    pub namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: [
                RoundConfig::new(ROUND1_DURATION_SECS, ROUND1_TITLE, ROUND1_MAX_SCORE),
                RoundConfig::new(ROUND2_DURATION_SECS, ROUND2_TITLE, ROUND2_MAX_SCORE),
                RoundConfig::new(ROUND3_DURATION_SECS, ROUND3_TITLE, ROUND3_MAX_SCORE),
            ],
            gate_threshold: GATE_THRESHOLD,
            namespace: TERMINATION_NAMESPACE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn round(&self, round: Round) -> &RoundConfig {
        &self.rounds[round.index()]
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SessionConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Malformed {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for round in Round::ALL {
            let rc = self.round(round);
            if rc.duration_secs == 0 {
                return Err(ConfigError::Invalid(format!("{} has a zero duration", round)));
            }
            if rc.title.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} has an empty title", round)));
            }
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace is empty".to_string()));
        }
        Ok(())
    }
}
