//! Fullscreen capability reconciled by the controller after every transition

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ScreenError;

pub trait FullscreenControl {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), ScreenError>;
    fn exit_fullscreen(&mut self) -> Result<(), ScreenError>;
}

/// Screen state held in shared flags, so the host can flip them from
/// outside (user pressed Escape, permission denied, ...).
#[derive(Debug, Clone, Default)]
pub struct VirtualScreen {
    fullscreen: Arc<AtomicBool>,
    deny_requests: Arc<AtomicBool>,
}

impl VirtualScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host left fullscreen on its own
    pub fn leave(&self) {
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    /// Make subsequent fullscreen requests fail
    pub fn deny_requests(&self, deny: bool) {
        self.deny_requests.store(deny, Ordering::SeqCst);
    }
}

impl FullscreenControl for VirtualScreen {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    fn request_fullscreen(&mut self) -> Result<(), ScreenError> {
        if self.deny_requests.load(Ordering::SeqCst) {
            return Err(ScreenError("fullscreen request was denied".to_string()));
        }
        self.fullscreen.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), ScreenError> {
        self.fullscreen.store(false, Ordering::SeqCst);
        Ok(())
    }
}
