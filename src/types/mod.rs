//! Core types for proctorlock

mod phase;
mod round;
mod signals;
mod reason;
mod output;

pub use phase::Phase;
pub use round::{Round, Scores};
pub use signals::{DispatchOutcome, KeyStroke, Signal, SignalKind, SignalVerdict};
pub use reason::{TerminationCause, TransitionCode, ViolationKind};
pub use output::Transition;
