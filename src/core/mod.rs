//! Core modules for proctorlock

pub mod command;
pub mod controller;
pub mod monitor;
pub mod persistence;
pub mod registry;
pub mod scoring;
pub mod screen;
pub mod timer;

pub use command::Command;
pub use controller::{Collaborators, SessionController};
pub use monitor::{EventBus, SignalBus, SignalHandler, SubscriptionId, ViolationMonitor};
pub use persistence::{FileTerminationStore, MemoryTerminationStore, TerminationRecord, TerminationStore};
pub use registry::{CompletionDispatcher, CompletionRegistry, HttpRegistryClient};
pub use scoring::{advance_eligible, summary, total_score, ScoreLine, ScoreSummary};
pub use screen::{FullscreenControl, VirtualScreen};
pub use timer::{format_clock, RoundTimer};
