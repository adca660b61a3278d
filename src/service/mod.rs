//! Completion registry service: HTTP API over interchangeable uid stores

pub mod api;
pub mod local;
pub mod store;

pub use api::{create_router, run_server, ApiResponse, HealthResponse, UidRequest};
pub use local::LocalRegistry;
pub use store::{CompletionEntry, FileUidStore, MarkOutcome, MemoryUidStore, Roster, UidStatus, UidStore};
