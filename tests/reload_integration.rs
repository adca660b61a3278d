//! Integration tests for reload behaviour with the file-backed termination record

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use proctorlock::config::SessionConfig;
use proctorlock::core::{
    Collaborators, CompletionDispatcher, FileTerminationStore, SessionController, VirtualScreen,
};
use proctorlock::error::SessionError;
use proctorlock::service::{LocalRegistry, MemoryUidStore};
use proctorlock::types::{KeyStroke, Phase, Round, Signal};
use proctorlock::{DEFAULT_TERMINATION_REASON, TERMINATION_NAMESPACE};

fn open(dir: &Path, uids: &Arc<MemoryUidStore>) -> SessionController {
    let registry = Arc::new(LocalRegistry::new(uids.clone()));
    SessionController::new(
        SessionConfig::default(),
        Collaborators {
            store: Box::new(FileTerminationStore::new(dir, TERMINATION_NAMESPACE)),
            registry: registry.clone(),
            dispatcher: CompletionDispatcher::inline(registry),
            screen: Box::new(VirtualScreen::new()),
        },
    )
}

fn record_path(dir: &Path) -> std::path::PathBuf {
    dir.join(format!("{}.json", TERMINATION_NAMESPACE))
}

#[test]
fn test_reload_while_terminated_keeps_reason() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));

    let mut session = open(dir.path(), &uids);
    session.login("FX-001").unwrap();
    session.start_round(Round::One).unwrap();
    session.handle_signal(&Signal::KeyDown(KeyStroke::ctrl_shift("i")));
    assert_eq!(session.phase(), Phase::Terminated);
    drop(session);

    let reloaded = open(dir.path(), &uids);
    assert_eq!(reloaded.phase(), Phase::Terminated);
    assert_eq!(reloaded.termination_reason(), Some("Developer tools were opened."));
    assert!(reloaded.is_finalized());
    assert!(reloaded.history().is_empty());
}

#[test]
fn test_reload_mid_round_restarts_at_login() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));

    let mut session = open(dir.path(), &uids);
    session.login("FX-001").unwrap();
    session.start_round(Round::One).unwrap();
    session.complete_round(Round::One, 20).unwrap();
    session.start_round(Round::Two).unwrap();
    assert_eq!(session.phase(), Phase::Level2);
    drop(session);

    let reloaded = open(dir.path(), &uids);
    assert_eq!(reloaded.phase(), Phase::Login);
    assert_eq!(reloaded.scores().level1, 0);
    assert!(!record_path(dir.path()).exists());
}

#[test]
fn test_resume_clears_record_for_later_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));
    std::fs::write(record_path(dir.path()), r#"{"reason": "Exited fullscreen mode."}"#).unwrap();

    let mut session = open(dir.path(), &uids);
    assert_eq!(session.phase(), Phase::Terminated);
    assert!(matches!(session.resume("WRONG"), Err(SessionError::InvalidResumeCode)));
    assert!(record_path(dir.path()).exists());

    let code = proctorlock::resume_codes().remove(0);
    session.resume(&code).unwrap();
    assert!(!record_path(dir.path()).exists());
    drop(session);

    assert_eq!(open(dir.path(), &uids).phase(), Phase::Login);
}

#[test]
fn test_corrupt_record_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));
    std::fs::write(record_path(dir.path()), "{not json").unwrap();

    assert_eq!(open(dir.path(), &uids).phase(), Phase::Login);
}

#[test]
fn test_record_without_reason_uses_default() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));
    std::fs::write(record_path(dir.path()), "{}").unwrap();

    let session = open(dir.path(), &uids);
    assert_eq!(session.phase(), Phase::Terminated);
    assert_eq!(session.termination_reason(), Some(DEFAULT_TERMINATION_REASON));
}

#[test]
fn test_record_file_is_plain_reason_json() {
    let dir = tempfile::tempdir().unwrap();
    let uids = Arc::new(MemoryUidStore::new(None));

    let mut session = open(dir.path(), &uids);
    session.login("FX-001").unwrap();
    session.start_round(Round::One).unwrap();
    session.handle_signal(&Signal::VisibilityChange { hidden: true });

    let raw = std::fs::read_to_string(record_path(dir.path())).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json, serde_json::json!({"reason": "Switched to another tab or window."}));
}
