//! Violation monitor and the signal subscription bus it arms against
//!
//! Handler table while armed:
//! - fullscreen lost          → violation (FullscreenExit)
//! - visibility hidden        → violation (TabSwitch)
//! - F12, Ctrl+Shift+I/J/C    → suppress + violation (DevTools)
//! - context menu             → suppress only
//! - Ctrl+C/V/X               → suppress + violation (CopyPaste)
//!
//! Handlers only classify; the controller decides what a violation does.

use tracing::debug;

use crate::types::{DispatchOutcome, KeyStroke, Signal, SignalKind, SignalVerdict, ViolationKind};

/// Subscription handle returned by [`SignalBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type SignalHandler = Box<dyn FnMut(&Signal) -> SignalVerdict>;

/// Capability to listen for host signals
pub trait SignalBus {
    fn subscribe(&mut self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId;

    /// Returns false if the subscription was not active
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// In-process bus: host events are pushed in through [`EventBus::dispatch`]
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(SubscriptionId, SignalKind, SignalHandler)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal to every matching handler in subscription order
    pub fn dispatch(&mut self, signal: &Signal) -> DispatchOutcome {
        let kind = signal.kind();
        let mut outcome = DispatchOutcome::default();
        for (_, subscribed, handler) in self.handlers.iter_mut() {
            if *subscribed == kind {
                outcome.absorb(handler(signal));
            }
        }
        outcome
    }

    pub fn subscription_count(&self) -> usize {
        self.handlers.len()
    }
}

impl SignalBus for EventBus {
    fn subscribe(&mut self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers.push((id, kind, handler));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _, _)| *sub != id);
        self.handlers.len() != before
    }
}

/// Holds the proctoring subscription set while a round is active
#[derive(Debug, Default)]
pub struct ViolationMonitor {
    subscriptions: Vec<SubscriptionId>,
}

impl ViolationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Subscribe the handler set. No-op if already armed.
    pub fn arm(&mut self, bus: &mut dyn SignalBus) {
        if self.is_armed() {
            return;
        }
        self.subscriptions = vec![
            bus.subscribe(SignalKind::FullscreenChange, Box::new(on_fullscreen_change)),
            bus.subscribe(SignalKind::VisibilityChange, Box::new(on_visibility_change)),
            bus.subscribe(SignalKind::KeyDown, Box::new(on_devtools_key)),
            bus.subscribe(SignalKind::ContextMenu, Box::new(on_context_menu)),
            bus.subscribe(SignalKind::KeyDown, Box::new(on_copy_paste_key)),
        ];
        debug!(subscriptions = self.subscriptions.len(), "Violation monitor armed");
    }

    /// Tear down every subscription. No-op if not armed.
    pub fn disarm(&mut self, bus: &mut dyn SignalBus) {
        if !self.is_armed() {
            return;
        }
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
        debug!("Violation monitor disarmed");
    }
}

fn on_fullscreen_change(signal: &Signal) -> SignalVerdict {
    match signal {
        Signal::FullscreenChange { fullscreen: false } => {
            SignalVerdict::Violation(ViolationKind::FullscreenExit)
        }
        _ => SignalVerdict::Ignore,
    }
}

fn on_visibility_change(signal: &Signal) -> SignalVerdict {
    match signal {
        Signal::VisibilityChange { hidden: true } => {
            SignalVerdict::Violation(ViolationKind::TabSwitch)
        }
        _ => SignalVerdict::Ignore,
    }
}

fn on_devtools_key(signal: &Signal) -> SignalVerdict {
    match signal {
        Signal::KeyDown(stroke) if is_devtools_combo(stroke) => {
            SignalVerdict::Violation(ViolationKind::DevTools)
        }
        _ => SignalVerdict::Ignore,
    }
}

fn on_context_menu(signal: &Signal) -> SignalVerdict {
    match signal {
        Signal::ContextMenu => SignalVerdict::Suppress,
        _ => SignalVerdict::Ignore,
    }
}

fn on_copy_paste_key(signal: &Signal) -> SignalVerdict {
    match signal {
        Signal::KeyDown(stroke) if is_copy_paste_combo(stroke) => {
            SignalVerdict::Violation(ViolationKind::CopyPaste)
        }
        _ => SignalVerdict::Ignore,
    }
}

fn is_devtools_combo(stroke: &KeyStroke) -> bool {
    if stroke.key.eq_ignore_ascii_case("F12") {
        return true;
    }
    stroke.ctrl
        && stroke.shift
        && matches!(stroke.key.to_ascii_uppercase().as_str(), "I" | "J" | "C")
}

fn is_copy_paste_combo(stroke: &KeyStroke) -> bool {
    stroke.ctrl && matches!(stroke.key.to_ascii_lowercase().as_str(), "c" | "v" | "x")
}
