/// Timing primitives: the engine clock and the single pending
/// image-effect auto-advance.
///
/// Timers here are data, not threads. The engine owns at most one
/// `AutoAdvance`; scheduling a new one replaces the old, and any
/// explicit navigation clears it. A cleared timer can never fire, which
/// makes cancellation total without any locking.
use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A hand-driven clock for deterministic tests and headless hosts.
/// Cloning shares the underlying instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// The one-shot delayed jump scheduled by an image node with a timed
/// effect — the only place the engine self-advances without input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAdvance {
    pub target: String,
    pub fires_at: u64,
}

impl AutoAdvance {
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.fires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1000);
        assert_eq!(clock.now_ms(), 1000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 1250);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(0);
        let handle = clock.clone();
        handle.advance(500);
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn auto_advance_due_at_deadline() {
        let pending = AutoAdvance {
            target: "n5".to_string(),
            fires_at: 2000,
        };
        assert!(!pending.is_due(1999));
        assert!(pending.is_due(2000));
        assert!(pending.is_due(5000));
    }
}
