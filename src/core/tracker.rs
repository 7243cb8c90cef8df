//! Thread-safe container of every known [`Crystal`] (spec §3, §4.3).
//!
//! Grounded on the teacher's `solvers::SolverEvent` (a typed enum sent over a
//! `crossbeam_channel::Sender` to report solver telemetry) generalized from
//! solver progress events to `newStructureAdded`/`structureUpdated`
//! notifications, preserving insertion order per spec §5. Per DESIGN NOTES §9,
//! notifications are sent only after the tracker's write lock has been
//! released, and the crate-wide lock ordering is `tracker ≺ structure`: any
//! code path that needs both locks acquires the tracker's before a crystal's.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;

use crate::core::crystal::{Crystal, State};

#[derive(Clone)]
pub enum TrackerEvent {
    NewStructureAdded(Arc<Crystal>),
    StructureUpdated(Arc<Crystal>),
}

pub struct Tracker {
    structures: RwLock<Vec<Arc<Crystal>>>,
    subscribers: RwLock<Vec<Sender<TrackerEvent>>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            structures: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<TrackerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.write().push(tx);
        rx
    }

    /// Acquire the write lock, push the structure, release the lock, then
    /// notify (spec §4.3: "Insert acquires the write lock, pushes the
    /// structure, and signals `newStructureAdded`").
    pub fn insert(&self, crystal: Arc<Crystal>) {
        {
            let mut guard = self.structures.write();
            guard.push(crystal.clone());
        }
        self.notify(TrackerEvent::NewStructureAdded(crystal));
    }

    /// `structureUpdated` is delivered at most once per status transition, but
    /// callers may legitimately coalesce several field updates into a single
    /// call (spec §5).
    pub fn notify_updated(&self, crystal: Arc<Crystal>) {
        self.notify(TrackerEvent::StructureUpdated(crystal));
    }

    fn notify(&self, event: TrackerEvent) {
        let subscribers = self.subscribers.read();
        for sender in subscribers.iter() {
            let _ = sender.send(event.clone());
        }
    }

    pub fn size(&self) -> usize {
        self.structures.read().len()
    }

    /// A read-locked snapshot of every tracked structure (cheap `Arc` clones).
    pub fn snapshot(&self) -> Vec<Arc<Crystal>> {
        self.structures.read().clone()
    }

    pub fn count_in_states(&self, states: &[State]) -> usize {
        self.structures
            .read()
            .iter()
            .filter(|c| states.contains(&c.status()))
            .count()
    }

    /// Destroys every owned structure (spec §4.3: "the tracker owns its
    /// structures and destroys them on reset").
    pub fn reset(&self) {
        *self.structures.write() = Vec::new();
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Cell;
    use nalgebra::Matrix3;

    fn cubic_crystal(gen: u32, id: u32) -> Arc<Crystal> {
        let cell = Cell::new(Matrix3::new(4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0));
        Arc::new(Crystal::new(gen, id, cell))
    }

    #[test]
    fn insert_notifies_in_order() {
        let tracker = Tracker::new();
        let rx = tracker.subscribe();
        for i in 0..3 {
            tracker.insert(cubic_crystal(1, i));
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            match rx.recv().unwrap() {
                TrackerEvent::NewStructureAdded(c) => seen.push(c.local_id),
                _ => panic!("unexpected event"),
            }
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(tracker.size(), 3);
    }

    #[test]
    fn reset_clears_all_structures() {
        let tracker = Tracker::new();
        tracker.insert(cubic_crystal(1, 0));
        tracker.reset();
        assert_eq!(tracker.size(), 0);
    }

    #[test]
    fn count_in_states_filters_correctly() {
        let tracker = Tracker::new();
        let a = cubic_crystal(1, 0);
        let b = cubic_crystal(1, 1);
        a.write().set_status(State::Submitted);
        b.write().set_status(State::InProcess);
        tracker.insert(a);
        tracker.insert(b);
        assert_eq!(tracker.count_in_states(&[State::Submitted, State::InProcess]), 2);
        assert_eq!(tracker.count_in_states(&[State::Submitted]), 1);
    }
}
