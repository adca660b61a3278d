//! Completion registry client and the fire-and-forget completion dispatcher
//!
//! The controller sees only [`CompletionRegistry`]; whether calls go over HTTP
//! or straight into an in-process store is a deployment choice.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::RegistryError;
use crate::service::{ApiResponse, UidRequest};

/// Connect timeout for registry requests
pub const REGISTRY_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whole-request timeout for registry requests
pub const REGISTRY_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The two registry operations the controller relies on
pub trait CompletionRegistry: Send + Sync {
    /// Credential exists and has not been used
    fn validate(&self, uid: &str) -> Result<(), RegistryError>;

    /// Mark the credential used. Idempotent: repeat calls succeed.
    fn record_completion(&self, uid: &str) -> Result<(), RegistryError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════════════════════════

/// Blocking client for `POST /api/login` and `POST /api/complete`
#[derive(Clone)]
pub struct HttpRegistryClient {
    agent: ureq::Agent,
    base_url: String,
}

impl std::fmt::Debug for HttpRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegistryClient").field("base_url", &self.base_url).finish()
    }
}

impl HttpRegistryClient {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(REGISTRY_CONNECT_TIMEOUT)
            .timeout(REGISTRY_REQUEST_TIMEOUT)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_uid(&self, path: &str, uid: &str) -> Result<(), RegistryError> {
        let url = format!("{}{}", self.base_url, path);
        let body = UidRequest { uid: Some(uid.to_string()) };
        match self.agent.post(&url).send_json(&body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, resp)) => {
                let message = resp
                    .into_json::<ApiResponse>()
                    .map(|body| body.message)
                    .unwrap_or_default();
                Err(error_for_status(code, &message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RegistryError::Server(format!("transport error: {}", transport)))
            }
        }
    }
}

/// Status codes vary slightly between registry backends; 404 and 409 are the
/// only ones with a specific meaning.
fn error_for_status(code: u16, message: &str) -> RegistryError {
    match code {
        400 => RegistryError::MissingUid,
        404 => RegistryError::NotFound,
        409 => RegistryError::AlreadyUsed,
        _ if message.is_empty() => RegistryError::Server(format!("http status {}", code)),
        _ => RegistryError::Server(format!("http status {}: {}", code, message)),
    }
}

impl CompletionRegistry for HttpRegistryClient {
    fn validate(&self, uid: &str) -> Result<(), RegistryError> {
        self.post_uid("/api/login", uid)
    }

    fn record_completion(&self, uid: &str) -> Result<(), RegistryError> {
        self.post_uid("/api/complete", uid)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════════════════════════════════════════

enum DispatchMode {
    Inline(Arc<dyn CompletionRegistry>),
    Background {
        tx: Option<mpsc::Sender<String>>,
        worker: Option<JoinHandle<()>>,
    },
}

/// Carries record-completion calls away from the controller.
///
/// Failures are logged and dropped: no retry, nothing surfaced to the
/// participant, who is already looking at a terminal screen.
pub struct CompletionDispatcher {
    mode: DispatchMode,
}

impl std::fmt::Debug for CompletionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            DispatchMode::Inline(_) => "inline",
            DispatchMode::Background { .. } => "background",
        };
        f.debug_struct("CompletionDispatcher").field("mode", &mode).finish()
    }
}

impl CompletionDispatcher {
    /// Call the registry synchronously on dispatch
    pub fn inline(registry: Arc<dyn CompletionRegistry>) -> Self {
        Self { mode: DispatchMode::Inline(registry) }
    }

    /// Call the registry from a worker thread
    pub fn background(registry: Arc<dyn CompletionRegistry>) -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        let worker = std::thread::spawn(move || {
            for uid in rx {
                record(registry.as_ref(), &uid);
            }
        });
        Self {
            mode: DispatchMode::Background { tx: Some(tx), worker: Some(worker) },
        }
    }

    pub fn dispatch(&self, uid: &str) {
        match &self.mode {
            DispatchMode::Inline(registry) => record(registry.as_ref(), uid),
            DispatchMode::Background { tx: Some(tx), .. } => {
                if tx.send(uid.to_string()).is_err() {
                    warn!(uid = %uid, "Completion worker gone; completion not recorded");
                }
            }
            DispatchMode::Background { tx: None, .. } => {
                warn!(uid = %uid, "Completion dispatcher shut down; completion not recorded");
            }
        }
    }

    /// Stop accepting work and wait for queued calls to finish
    pub fn shutdown(&mut self) {
        if let DispatchMode::Background { tx, worker } = &mut self.mode {
            tx.take();
            if let Some(handle) = worker.take() {
                if handle.join().is_err() {
                    warn!("Completion worker panicked");
                }
            }
        }
    }
}

impl Drop for CompletionDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn record(registry: &dyn CompletionRegistry, uid: &str) {
    match registry.record_completion(uid) {
        Ok(()) => info!(uid = %uid, "Completion recorded"),
        Err(e) => warn!(uid = %uid, error = %e, "Failed to record completion"),
    }
}
