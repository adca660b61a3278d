//! Integration tests for the full session flow
//!
//! Controller wired to an in-process registry over a memory uid store, so
//! completions are observable the way the service would see them.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use proctorlock::config::{RoundConfig, SessionConfig};
use proctorlock::core::{
    Collaborators, Command, CompletionDispatcher, FullscreenControl, MemoryTerminationStore,
    SessionController, VirtualScreen,
};
use proctorlock::error::SessionError;
use proctorlock::service::{LocalRegistry, MemoryUidStore, Roster, UidStatus, UidStore};
use proctorlock::types::{Phase, Round, Signal, TransitionCode};

struct Session {
    controller: SessionController,
    uids: Arc<MemoryUidStore>,
    records: MemoryTerminationStore,
    screen: VirtualScreen,
}

fn session_with(config: SessionConfig, uids: Arc<MemoryUidStore>) -> Session {
    let registry = Arc::new(LocalRegistry::new(uids.clone()));
    let records = MemoryTerminationStore::new();
    let screen = VirtualScreen::new();
    let controller = SessionController::new(
        config,
        Collaborators {
            store: Box::new(records.clone()),
            registry: registry.clone(),
            dispatcher: CompletionDispatcher::inline(registry),
            screen: Box::new(screen.clone()),
        },
    );
    Session { controller, uids, records, screen }
}

fn roster_store() -> Arc<MemoryUidStore> {
    Arc::new(MemoryUidStore::new(Some(Roster::from_uids(["FX-001", "FX-002"]))))
}

fn session() -> Session {
    session_with(SessionConfig::default(), roster_store())
}

fn play_to_gate(c: &mut SessionController, level1: u32, level2: u32) -> Phase {
    c.login("FX-001").unwrap();
    c.start_round(Round::One).unwrap();
    c.complete_round(Round::One, level1).unwrap();
    c.start_round(Round::Two).unwrap();
    c.complete_round(Round::Two, level2).unwrap()
}

#[test]
fn test_full_assessment_path() {
    let mut s = session();
    let c = &mut s.controller;

    assert_eq!(c.login("  FX-001 ").unwrap(), Phase::Intro1);
    assert_eq!(c.credential(), Some("FX-001"));

    assert_eq!(c.start_round(Round::One).unwrap(), Phase::Level1);
    assert!(s.screen.is_fullscreen());
    assert!(c.is_monitor_armed());
    assert_eq!(c.remaining_clock().as_deref(), Some("20:00"));
    assert_eq!(c.round_title(), Some("Round 1: Multiple Choice"));

    assert_eq!(c.complete_round(Round::One, 25).unwrap(), Phase::Intro2);
    assert!(!s.screen.is_fullscreen());
    assert!(!c.is_monitor_armed());
    assert_eq!(c.remaining_clock(), None);

    c.start_round(Round::Two).unwrap();
    assert_eq!(c.complete_round(Round::Two, 15).unwrap(), Phase::Intro3);
    c.start_round(Round::Three).unwrap();
    assert_eq!(c.remaining_clock().as_deref(), Some("35:00"));
    assert_eq!(s.uids.status("FX-001").unwrap(), UidStatus::Available);

    assert_eq!(c.complete_round(Round::Three, 22).unwrap(), Phase::IntroFinal);
    assert_eq!(s.uids.status("FX-001").unwrap(), UidStatus::Used);
    assert!(c.is_finalized());

    assert_eq!(c.show_results().unwrap(), Phase::Thankyou);
    let summary = c.summary().unwrap();
    assert_eq!(summary.total, 62);
    assert_eq!(summary.possible, 80);
    assert_eq!(summary.lines.len(), 3);

    let codes: Vec<TransitionCode> = c.history().iter().map(|t| t.code).collect();
    assert_eq!(
        codes,
        vec![
            TransitionCode::T001_LOGIN_ACCEPTED,
            TransitionCode::T002_ROUND_STARTED,
            TransitionCode::T003_ROUND_COMPLETED,
            TransitionCode::T002_ROUND_STARTED,
            TransitionCode::T004_GATE_PASSED,
            TransitionCode::T002_ROUND_STARTED,
            TransitionCode::T005_ASSESSMENT_FINISHED,
            TransitionCode::T006_RESULTS_SHOWN,
        ]
    );
    assert_eq!(s.uids.completion_count().unwrap(), 1);
    assert_eq!(s.records.raw(), None);
}

#[test]
fn test_gate_is_inclusive() {
    let mut below = session();
    assert_eq!(play_to_gate(&mut below.controller, 20, 14), Phase::Lost);
    assert_eq!(below.uids.status("FX-001").unwrap(), UidStatus::Used);
    let summary = below.controller.summary().unwrap();
    assert_eq!((summary.total, summary.possible), (34, 50));

    let mut at = session();
    assert_eq!(play_to_gate(&mut at.controller, 20, 15), Phase::Intro3);
    assert_eq!(at.uids.status("FX-001").unwrap(), UidStatus::Available);
}

#[test]
fn test_oversized_score_passes_gate() {
    let mut s = session();
    let score = match Command::parse("score 4294967295").unwrap() {
        Some(Command::Score(score)) => score,
        other => panic!("unexpected command: {:?}", other),
    };
    assert_eq!(play_to_gate(&mut s.controller, 1, score), Phase::Intro3);
    assert_eq!(s.uids.status("FX-001").unwrap(), UidStatus::Available);
}

#[test]
fn test_configured_gate_and_durations() {
    let mut config = SessionConfig::default();
    config.gate_threshold = 10;
    config.rounds[0] = RoundConfig::new(3, "Warmup", 10);
    let mut s = session_with(config, roster_store());
    let c = &mut s.controller;

    c.login("FX-002").unwrap();
    c.start_round(Round::One).unwrap();
    assert_eq!(c.round_title(), Some("Warmup"));
    assert_eq!(c.remaining_secs(), Some(3));
    c.complete_round(Round::One, 5).unwrap();
    c.start_round(Round::Two).unwrap();
    assert_eq!(c.complete_round(Round::Two, 5).unwrap(), Phase::Intro3);
}

#[test]
fn test_login_rejections_keep_login() {
    let mut s = session();
    let c = &mut s.controller;

    assert!(matches!(c.login("   "), Err(SessionError::EmptyCredential)));
    assert!(matches!(c.login("FX-404"), Err(SessionError::InvalidCredential)));
    assert_eq!(c.phase(), Phase::Login);
    assert!(c.history().is_empty());
}

#[test]
fn test_finished_credential_cannot_log_in_again() {
    let uids = roster_store();
    let mut first = session_with(SessionConfig::default(), uids.clone());
    play_to_gate(&mut first.controller, 0, 0);
    assert_eq!(first.controller.phase(), Phase::Lost);

    let mut second = session_with(SessionConfig::default(), uids);
    assert!(matches!(second.controller.login("FX-001"), Err(SessionError::AlreadyUsed)));
    assert!(second.controller.login("FX-002").is_ok());
}

#[test]
fn test_time_up_terminates_and_records() {
    let mut config = SessionConfig::default();
    config.rounds[1].duration_secs = 2;
    let mut s = session_with(config, roster_store());
    let c = &mut s.controller;

    c.login("FX-001").unwrap();
    c.start_round(Round::One).unwrap();
    c.complete_round(Round::One, 10).unwrap();
    c.start_round(Round::Two).unwrap();

    assert_eq!(c.tick(), Phase::Level2);
    assert_eq!(c.remaining_clock().as_deref(), Some("00:01"));
    assert_eq!(c.tick(), Phase::Terminated);
    assert_eq!(c.termination_reason(), Some("Time ran out for Round 2: Debugging."));
    assert_eq!(s.uids.status("FX-001").unwrap(), UidStatus::Used);
    assert!(s.records.raw().unwrap().contains("Round 2: Debugging"));

    // Further ticks have nothing to drive
    assert_eq!(c.tick(), Phase::Terminated);
    assert_eq!(c.history().len(), 5);
}

#[test]
fn test_resume_returns_to_clean_login() {
    let mut s = session();
    let c = &mut s.controller;
    c.login("FX-001").unwrap();
    c.start_round(Round::One).unwrap();
    c.handle_signal(&Signal::VisibilityChange { hidden: true });
    assert_eq!(c.phase(), Phase::Terminated);
    assert!(s.records.raw().is_some());

    assert!(matches!(c.resume(""), Err(SessionError::EmptyResumeCode)));
    assert!(matches!(c.resume("NOT-A-CODE"), Err(SessionError::InvalidResumeCode)));
    assert_eq!(c.phase(), Phase::Terminated);
    assert!(s.records.raw().is_some());

    let code = proctorlock::resume_codes().remove(0);
    assert_eq!(c.resume(&code).unwrap(), Phase::Login);
    assert_eq!(s.records.raw(), None);
    assert_eq!(c.credential(), None);
    assert_eq!(c.termination_reason(), None);
    assert_eq!(c.scores().level1, 0);
    assert!(!c.is_finalized());
    assert_eq!(c.history().len(), 1);
    assert_eq!(c.history()[0].code, TransitionCode::T102_RESUMED);
}

#[test]
fn test_refused_fullscreen_blocks_round() {
    let mut s = session();
    s.controller.login("FX-001").unwrap();
    s.screen.deny_requests(true);

    let err = s.controller.start_round(Round::One).unwrap_err();
    assert!(matches!(err, SessionError::FullscreenUnavailable(_)));
    assert_eq!(s.controller.phase(), Phase::Intro1);
    assert!(!s.controller.is_monitor_armed());
    assert!(s.controller.notice().is_some());

    s.screen.deny_requests(false);
    assert_eq!(s.controller.start_round(Round::One).unwrap(), Phase::Level1);
    assert_eq!(s.controller.notice(), None);
}
