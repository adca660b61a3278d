//! Round timer: one-second countdown with a single expiry callback
//!
//! Ticks are delivered by the host event loop, so the countdown is
//! deterministic and never blocks. A new timer is built for every round.

/// Expiry callback. Its return value is handed back from [`RoundTimer::tick`].
pub type ExpireHandler<T> = Box<dyn FnOnce() -> T>;

/// Countdown for the active round
pub struct RoundTimer<T> {
    remaining: u32,
    on_expire: Option<ExpireHandler<T>>,
}

impl<T> std::fmt::Debug for RoundTimer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundTimer")
            .field("remaining", &self.remaining)
            .field("expired", &self.is_expired())
            .finish()
    }
}

impl<T> RoundTimer<T> {
    /// Start counting down from `duration_secs`
    pub fn start(duration_secs: u32, on_expire: impl FnOnce() -> T + 'static) -> Self {
        Self {
            remaining: duration_secs,
            on_expire: Some(Box::new(on_expire)),
        }
    }

    /// Advance one second. Returns the callback's result on the tick that
    /// reaches zero and `None` on every other tick, before or after.
    pub fn tick(&mut self) -> Option<T> {
        if self.on_expire.is_none() {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return self.on_expire.take().map(|handler| handler());
        }
        None
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.on_expire.is_none()
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Zero-padded `MM:SS`; minutes are not wrapped into hours
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_duration_one_fires_after_one_tick() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut timer = RoundTimer::start(1, move || seen.set(seen.get() + 1));

        assert_eq!(timer.tick(), Some(()));
        assert_eq!(calls.get(), 1);
        assert!(timer.is_expired());
    }

    #[test]
    fn test_fires_exactly_once() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut timer = RoundTimer::start(3, move || {
            seen.set(seen.get() + 1);
            "expired"
        });

        assert_eq!(timer.tick(), None);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.tick(), Some("expired"));
        for _ in 0..5 {
            assert_eq!(timer.tick(), None);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_zero_duration_expires_on_first_tick() {
        let mut timer = RoundTimer::start(0, || 7);
        assert!(!timer.is_expired());
        assert_eq!(timer.tick(), Some(7));
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(20 * 60), "20:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125 * 60), "125:00");
    }

    #[test]
    fn test_display_tracks_countdown() {
        let mut timer = RoundTimer::start(61, || ());
        assert_eq!(timer.display(), "01:01");
        timer.tick();
        assert_eq!(timer.display(), "01:00");
    }
}
