//! Session state controller: the single owner of phase, scores and credential
//!
//! Phase flow:
//! - login → intro1 → level1 → intro2 → level2 → intro3 → level3 → introFinal → thankyou
//! - level2 → lost: round 1 + round 2 below the gate
//! - level* → terminated: violation or time-up
//! - terminated → login: staff resume code
//!
//! After every transition the side effects are re-derived from the phase:
//! the timer and the monitor exist only in `level*`, and the screen is
//! fullscreen exactly then.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::core::monitor::{EventBus, ViolationMonitor};
use crate::core::persistence::TerminationStore;
use crate::core::registry::{CompletionDispatcher, CompletionRegistry};
use crate::core::scoring::{self, ScoreSummary};
use crate::core::screen::FullscreenControl;
use crate::core::timer::RoundTimer;
use crate::error::{RegistryError, ScreenError, SessionError};
use crate::types::{
    DispatchOutcome, Phase, Round, Scores, Signal, TerminationCause, Transition, TransitionCode,
};

/// External capabilities the controller drives
pub struct Collaborators {
    pub store: Box<dyn TerminationStore>,
    pub registry: Arc<dyn CompletionRegistry>,
    pub dispatcher: CompletionDispatcher,
    pub screen: Box<dyn FullscreenControl>,
}

pub struct SessionController {
    config: SessionConfig,
    resume_codes: Vec<String>,
    phase: Phase,
    scores: Scores,
    credential: Option<String>,
    termination_reason: Option<String>,
    /// Record-completion already dispatched for this attempt
    finalized: bool,
    /// Message for the participant after a recoverable failure
    notice: Option<String>,
    timer: Option<RoundTimer<TerminationCause>>,
    monitor: ViolationMonitor,
    bus: EventBus,
    store: Box<dyn TerminationStore>,
    registry: Arc<dyn CompletionRegistry>,
    dispatcher: CompletionDispatcher,
    screen: Box<dyn FullscreenControl>,
    history: Vec<Transition>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("scores", &self.scores)
            .field("credential", &self.credential)
            .field("termination_reason", &self.termination_reason)
            .field("finalized", &self.finalized)
            .field("timer", &self.timer)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl SessionController {
    /// Build a controller. A persisted termination record puts it straight
    /// into `terminated`; otherwise it starts at `login`.
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let Collaborators { store, registry, dispatcher, screen } = collaborators;
        let record = store.load();
        let (phase, termination_reason) = match record {
            Some(record) => (Phase::Terminated, Some(record.reason)),
            None => (Phase::Login, None),
        };
        info!(phase = %phase, "Session loaded");

        let mut controller = Self {
            config,
            resume_codes: crate::resume_codes(),
            phase,
            scores: Scores::default(),
            credential: None,
            finalized: termination_reason.is_some(),
            termination_reason,
            notice: None,
            timer: None,
            monitor: ViolationMonitor::new(),
            bus: EventBus::new(),
            store,
            registry,
            dispatcher,
            screen,
            history: Vec::new(),
        };
        controller.settle_screen();
        controller
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Validate the credential with the registry and enter `intro1`
    pub fn login(&mut self, credential: &str) -> Result<Phase, SessionError> {
        self.expect_phase(Phase::Login, "log in")?;

        let uid = credential.trim();
        if uid.is_empty() {
            return Err(SessionError::EmptyCredential);
        }

        self.registry.validate(uid).map_err(|e| {
            info!(uid = %uid, error = %e, "Login rejected");
            match e {
                RegistryError::NotFound => SessionError::InvalidCredential,
                RegistryError::AlreadyUsed => SessionError::AlreadyUsed,
                RegistryError::MissingUid => SessionError::EmptyCredential,
                RegistryError::Server(message) => SessionError::RegistryUnavailable(message),
            }
        })?;

        self.credential = Some(uid.to_string());
        self.transition(Phase::Intro1, TransitionCode::T001_LOGIN_ACCEPTED, Some(uid.to_string()));
        Ok(self.phase)
    }

    /// Enter `level{n}`: fullscreen first, then a fresh timer and the monitor.
    /// A refused fullscreen request sends the participant back to the intro.
    pub fn start_round(&mut self, round: Round) -> Result<Phase, SessionError> {
        self.expect_phase(round.intro_phase(), "start a round")?;

        let round_config = self.config.round(round).clone();
        self.transition(
            round.level_phase(),
            TransitionCode::T002_ROUND_STARTED,
            Some(round_config.title.clone()),
        );

        if let Err(ScreenError(message)) = self.reconcile_screen() {
            warn!(round = round.number(), error = %message, "Fullscreen refused; back to intro");
            self.transition(
                round.intro_phase(),
                TransitionCode::T103_FULLSCREEN_REFUSED,
                Some(message.clone()),
            );
            let err = SessionError::FullscreenUnavailable(message);
            self.notice = Some(err.to_string());
            return Err(err);
        }

        let title = round_config.title;
        self.timer = Some(RoundTimer::start(round_config.duration_secs, move || {
            TerminationCause::TimeUp { round, title }
        }));
        self.monitor.arm(&mut self.bus);
        self.notice = None;
        Ok(self.phase)
    }

    /// Round callback: record the score once and move on, through the gate
    /// after round 2. A callback arriving in any other phase has no effect.
    pub fn complete_round(&mut self, round: Round, score: u32) -> Result<Phase, SessionError> {
        self.expect_phase(round.level_phase(), "complete a round")?;

        self.scores.set(round, score);
        let detail = format!("score {}", score);

        match round {
            Round::One => {
                self.transition(Phase::Intro2, TransitionCode::T003_ROUND_COMPLETED, Some(detail));
            }
            Round::Two => {
                let total = scoring::gate_total(&self.scores);
                let gate = self.config.gate_threshold;
                let detail = Some(format!("total {} / gate {}", total, gate));
                if scoring::advance_eligible(&self.scores, gate) {
                    self.transition(Phase::Intro3, TransitionCode::T004_GATE_PASSED, detail);
                } else {
                    self.finalize();
                    self.transition(Phase::Lost, TransitionCode::T004_GATE_FAILED, detail);
                }
            }
            Round::Three => {
                self.finalize();
                self.transition(
                    Phase::IntroFinal,
                    TransitionCode::T005_ASSESSMENT_FINISHED,
                    Some(detail),
                );
            }
        }
        self.settle_screen();
        Ok(self.phase)
    }

    /// `introFinal` → `thankyou`
    pub fn show_results(&mut self) -> Result<Phase, SessionError> {
        self.expect_phase(Phase::IntroFinal, "show results")?;
        self.transition(Phase::Thankyou, TransitionCode::T006_RESULTS_SHOWN, None);
        Ok(self.phase)
    }

    /// End the attempt. Only an active round can be terminated: outside one
    /// (login, intros, or an attempt already over) the call does nothing,
    /// which also makes it idempotent.
    pub fn terminate(&mut self, reason: &str) -> Phase {
        if !self.phase.is_active_round() {
            debug!(reason = %reason, phase = %self.phase, "No round in progress; ignoring termination");
            return self.phase;
        }

        if let Err(e) = self.store.save(reason) {
            error!(error = %e, "Failed to persist termination record");
        }
        self.finalize();
        self.termination_reason = Some(reason.to_string());
        self.transition(Phase::Terminated, TransitionCode::T101_TERMINATED, Some(reason.to_string()));
        self.settle_screen();
        self.phase
    }

    /// Staff override: a listed code clears the termination record and
    /// returns to `login` with every piece of transient state reset.
    pub fn resume(&mut self, code: &str) -> Result<Phase, SessionError> {
        self.expect_phase(Phase::Terminated, "resume")?;

        if code.trim().is_empty() {
            return Err(SessionError::EmptyResumeCode);
        }
        if !self.resume_codes.iter().any(|listed| listed == code) {
            info!("Resume code rejected");
            return Err(SessionError::InvalidResumeCode);
        }

        self.store.clear()?;
        self.scores = Scores::default();
        self.credential = None;
        self.termination_reason = None;
        self.finalized = false;
        self.notice = None;
        self.timer = None;
        self.history.clear();
        self.transition(Phase::Login, TransitionCode::T102_RESUMED, None);
        Ok(self.phase)
    }

    /// One second of round time. Expiry terminates with the round's reason.
    pub fn tick(&mut self) -> Phase {
        let expired = self.timer.as_mut().and_then(|timer| timer.tick());
        if let Some(cause) = expired {
            let reason = cause.reason();
            warn!(reason = %reason, "Round time expired");
            self.terminate(&reason);
        }
        self.phase
    }

    /// Feed a host signal through the subscription bus. The first violation
    /// terminates the attempt; the returned outcome tells the host whether to
    /// block the signal's default action.
    pub fn handle_signal(&mut self, signal: &Signal) -> DispatchOutcome {
        let outcome = self.bus.dispatch(signal);
        if let Some(kind) = outcome.first_violation() {
            warn!(violation = ?kind, phase = %self.phase, "Proctoring violation");
            self.terminate(&TerminationCause::Violation(kind).reason());
        }
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn termination_reason(&self) -> Option<&str> {
        self.termination_reason.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_monitor_armed(&self) -> bool {
        self.monitor.is_armed()
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Remaining round time as `MM:SS` while a round is active
    pub fn remaining_clock(&self) -> Option<String> {
        self.timer.as_ref().map(|timer| timer.display())
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.timer.as_ref().map(|timer| timer.remaining_secs())
    }

    /// Title of the round being played
    pub fn round_title(&self) -> Option<&str> {
        self.phase.active_round().map(|round| self.config.round(round).title.as_str())
    }

    /// Result card for the two results phases
    pub fn summary(&self) -> Option<ScoreSummary> {
        let through = match self.phase {
            Phase::IntroFinal | Phase::Thankyou => Round::Three,
            Phase::Lost => Round::Two,
            _ => return None,
        };
        Some(scoring::summary(&self.scores, &self.config.rounds, through))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            return Ok(());
        }
        debug!(action, expected = %expected, actual = %self.phase, "Operation ignored in this phase");
        Err(SessionError::PhaseMismatch { action, actual: self.phase })
    }

    fn transition(&mut self, to: Phase, code: TransitionCode, detail: Option<String>) {
        let from = self.phase;
        self.phase = to;

        // Leaving an active round: stale timer and listeners must not fire
        if !to.is_active_round() {
            self.timer = None;
            self.monitor.disarm(&mut self.bus);
        }

        info!(from = %from, to = %to, code = code.code(), detail = detail.as_deref().unwrap_or(""), "Phase transition");
        let mut record = Transition::new(from, to, code);
        if let Some(detail) = detail {
            record = record.with_detail(detail);
        }
        self.history.push(record);
    }

    /// Dispatch record-completion once per attempt
    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        match &self.credential {
            Some(uid) => self.dispatcher.dispatch(uid),
            None => debug!("No credential in session; nothing to record"),
        }
    }

    /// Bring the screen in line with the phase. Only a failed request is
    /// returned; a failed exit is logged.
    fn reconcile_screen(&mut self) -> Result<(), ScreenError> {
        let desired = self.phase.requires_fullscreen();
        let actual = self.screen.is_fullscreen();
        if desired && !actual {
            self.screen.request_fullscreen()?;
        } else if !desired && actual {
            if let Err(e) = self.screen.exit_fullscreen() {
                warn!(error = %e, "Could not exit fullscreen");
            }
        }
        Ok(())
    }

    fn settle_screen(&mut self) {
        if let Err(e) = self.reconcile_screen() {
            warn!(error = %e, "Could not enter fullscreen");
        }
    }
}
