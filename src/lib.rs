//! proctorlock: session state controller for proctored multi-round assessments
//!
//! Login → intro → three timed rounds → results, with a violation monitor that
//! ends the attempt on the first observable proctoring signal and a
//! termination record that survives a reload.

pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod types;

// =============================================================================
// ROUNDS [C]
// =============================================================================

/// Round 1 time budget (seconds)
pub const ROUND1_DURATION_SECS: u32 = 20 * 60;

/// Round 2 time budget (seconds)
pub const ROUND2_DURATION_SECS: u32 = 20 * 60;

/// Round 3 time budget (seconds)
pub const ROUND3_DURATION_SECS: u32 = 35 * 60;

pub const ROUND1_TITLE: &str = "Round 1: Multiple Choice";
pub const ROUND2_TITLE: &str = "Round 2: Debugging";
pub const ROUND3_TITLE: &str = "Round 3: Final Challenge";

/// Maximum attainable score per round
pub const ROUND1_MAX_SCORE: u32 = 30;
pub const ROUND2_MAX_SCORE: u32 = 20;
pub const ROUND3_MAX_SCORE: u32 = 30;

// =============================================================================
// GATE [C]
// =============================================================================

/// Minimum round 1 + round 2 total to reach round 3 (inclusive)
pub const GATE_THRESHOLD: u32 = 35;

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Namespace key of the persisted termination record
pub const TERMINATION_NAMESPACE: &str = "terminationInfo_proctorlock";

/// Reason shown when a termination record carries no reason of its own
pub const DEFAULT_TERMINATION_REASON: &str = "A rule violation was detected.";

// =============================================================================
// RESUME CODES
// =============================================================================

const DEFAULT_RESUME_CODES: &[&str] = &["RESUME-ALPHA-100", "RESUME-BRAVO-202", "RESUME-CHARLIE-2025"];

/// Staff resume codes. Fixed at build time; `PROCTORLOCK_RESUME_CODES`
/// (comma-separated) replaces the default list when set during compilation.
pub fn resume_codes() -> Vec<String> {
    match option_env!("PROCTORLOCK_RESUME_CODES") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(String::from)
            .collect(),
        None => DEFAULT_RESUME_CODES.iter().map(|code| code.to_string()).collect(),
    }
}

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
