//! Cooldown between automated bets.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Tracks the last bet and answers whether another one is allowed.
///
/// A bet is permitted when none has been recorded yet or when strictly more
/// than `cooldown` has elapsed since the last one.
///
/// Thread-safe: shared via `Arc<CooldownGate>` so the cooldown outlives a
/// single monitoring session.
#[derive(Debug)]
pub struct CooldownGate {
    cooldown: Duration,
    last_action: Mutex<Option<Instant>>,
}

impl CooldownGate {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_action: Mutex::new(None),
        }
    }

    pub fn permitted(&self, now: Instant) -> bool {
        match *self.last_action.lock() {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }

    /// Time left until the next bet is permitted (zero when permitted).
    pub fn remaining(&self, now: Instant) -> Duration {
        match *self.last_action.lock() {
            None => Duration::ZERO,
            Some(last) => self
                .cooldown
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    pub fn record(&self, now: Instant) {
        *self.last_action.lock() = Some(now);
    }

    pub fn last_action(&self) -> Option<Instant> {
        *self.last_action.lock()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);

    #[test]
    fn test_permitted_without_history() {
        let gate = CooldownGate::new(COOLDOWN);
        let now = Instant::now();
        assert!(gate.permitted(now));
        assert_eq!(gate.remaining(now), Duration::ZERO);
    }

    #[test]
    fn test_cooldown_window() {
        let gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();
        gate.record(t0);

        assert!(!gate.permitted(t0 + Duration::from_secs(299)));
        assert!(gate.permitted(t0 + Duration::from_secs(301)));
    }

    #[test]
    fn test_exact_boundary_not_permitted() {
        // Elapsed must strictly exceed the cooldown.
        let gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();
        gate.record(t0);
        assert!(!gate.permitted(t0 + COOLDOWN));
    }

    #[test]
    fn test_remaining() {
        let gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();
        gate.record(t0);

        assert_eq!(gate.remaining(t0 + Duration::from_secs(10)), Duration::from_secs(290));
        assert_eq!(gate.remaining(t0 + Duration::from_secs(400)), Duration::ZERO);
    }

    #[test]
    fn test_record_moves_window() {
        let gate = CooldownGate::new(COOLDOWN);
        let t0 = Instant::now();
        gate.record(t0);
        let t1 = t0 + Duration::from_secs(301);
        gate.record(t1);

        assert_eq!(gate.last_action(), Some(t1));
        assert!(!gate.permitted(t1 + Duration::from_secs(5)));
    }
}
