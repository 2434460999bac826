//! Shared run state.
//!
//! `SharedState` is the only state shared between the background worker and
//! the observer command handlers. Every mutation goes through a single write
//! lock and the resulting snapshot is published to the [`EventBus`] before
//! the lock is released, so observers receive snapshots in mutation order
//! and never see a partially applied change.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::event::{EventBus, HubEvent};

/// Snapshot of the run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// A monitoring session is active.
    pub running: bool,
    /// Automatic betting is armed. Only ever true while `running`.
    pub auto_action_enabled: bool,
    /// Triggers seen in the current (or last) session.
    pub trigger_count: u64,
}

impl RunState {
    fn enforce_invariants(&mut self) {
        if !self.running {
            self.auto_action_enabled = false;
        }
    }
}

/// Synchronized handle to the process-wide [`RunState`].
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<RunState>>,
    bus: EventBus,
}

impl SharedState {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RunState::default())),
            bus,
        }
    }

    /// Consistent snapshot of the current state.
    pub fn get(&self) -> RunState {
        *self.inner.read()
    }

    /// Snapshot plus a bus subscription taken under the same read lock.
    ///
    /// State broadcasts happen under the write lock, so the receiver gets
    /// every snapshot newer than the returned one and none older.
    pub fn snapshot_and_subscribe(&self) -> (RunState, broadcast::Receiver<HubEvent>) {
        let guard = self.inner.read();
        (*guard, self.bus.subscribe())
    }

    /// Apply a mutation and broadcast the result.
    pub fn update<F>(&self, mutate: F) -> RunState
    where
        F: FnOnce(&mut RunState),
    {
        self.try_update(|state| {
            mutate(state);
            true
        })
        .unwrap_or_else(|| self.get())
    }

    /// Apply a mutation that may decline to change anything.
    ///
    /// The closure returns whether it changed the state; only then is the
    /// new snapshot broadcast and returned.
    pub fn try_update<F>(&self, mutate: F) -> Option<RunState>
    where
        F: FnOnce(&mut RunState) -> bool,
    {
        let mut guard = self.inner.write();
        if !mutate(&mut *guard) {
            return None;
        }
        guard.enforce_invariants();
        let snapshot = *guard;
        self.bus.publish(HubEvent::UpdateState(snapshot));
        debug!(?snapshot, "Run state updated");
        Some(snapshot)
    }

    /// Enter a new run: `running=true`, counter reset, auto-action disarmed.
    pub fn begin_run(&self) -> RunState {
        self.update(|s| {
            s.running = true;
            s.auto_action_enabled = false;
            s.trigger_count = 0;
        })
    }

    /// Leave the run. The trigger count is kept as a historical record.
    pub fn end_run(&self) -> RunState {
        self.update(|s| {
            s.running = false;
            s.auto_action_enabled = false;
        })
    }

    /// Count one trigger. Returns the new count.
    pub fn record_trigger(&self) -> u64 {
        self.update(|s| s.trigger_count += 1).trigger_count
    }

    /// Flip auto-action. No-op (and no broadcast) unless running.
    ///
    /// Returns the new flag value when it changed.
    pub fn toggle_auto_action(&self) -> Option<bool> {
        self.try_update(|s| {
            if !s.running {
                return false;
            }
            s.auto_action_enabled = !s.auto_action_enabled;
            true
        })
        .map(|s| s.auto_action_enabled)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<HubEvent>) -> Vec<RunState> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let HubEvent::UpdateState(s) = event {
                out.push(s);
            }
        }
        out
    }

    #[test]
    fn test_toggle_guard_while_idle() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let state = SharedState::new(bus);

        assert_eq!(state.toggle_auto_action(), None);
        assert!(!state.get().auto_action_enabled);
        assert!(drain(&mut rx).is_empty(), "idle toggle must not broadcast");
    }

    #[test]
    fn test_toggle_while_running() {
        let state = SharedState::new(EventBus::new(16));
        state.begin_run();

        assert_eq!(state.toggle_auto_action(), Some(true));
        assert_eq!(state.toggle_auto_action(), Some(false));
    }

    #[test]
    fn test_end_run_disarms_and_keeps_count() {
        let state = SharedState::new(EventBus::new(16));
        state.begin_run();
        state.toggle_auto_action();
        state.record_trigger();
        state.record_trigger();

        let after = state.end_run();
        assert!(!after.running);
        assert!(!after.auto_action_enabled);
        assert_eq!(after.trigger_count, 2);
    }

    #[test]
    fn test_begin_run_resets_count() {
        let state = SharedState::new(EventBus::new(16));
        state.begin_run();
        state.record_trigger();
        state.end_run();

        assert_eq!(state.begin_run().trigger_count, 0);
    }

    #[test]
    fn test_invariant_enforced_on_raw_update() {
        let state = SharedState::new(EventBus::new(16));
        let snapshot = state.update(|s| s.auto_action_enabled = true);
        assert!(!snapshot.auto_action_enabled);
    }

    #[test]
    fn test_every_mutation_is_broadcast_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let state = SharedState::new(bus);

        state.begin_run();
        state.record_trigger();
        state.end_run();

        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].trigger_count, 1);
        assert!(!seen[2].running);
    }

    #[test]
    fn test_snapshot_and_subscribe_sees_only_newer_states() {
        let state = SharedState::new(EventBus::new(16));
        state.begin_run();
        state.record_trigger();

        let (snapshot, mut rx) = state.snapshot_and_subscribe();
        assert_eq!(snapshot.trigger_count, 1);
        assert!(drain(&mut rx).is_empty());

        state.record_trigger();
        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].trigger_count, 2);
    }

    #[test]
    fn test_concurrent_increments() {
        let state = SharedState::new(EventBus::new(1024));
        state.begin_run();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        state.record_trigger();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(state.get().trigger_count, 400);
    }
}
