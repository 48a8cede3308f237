//! Bounded archive of past broadcast snapshots.
//!
//! Lagging clients are served a delta rebased on whatever snapshot they last
//! acknowledged, as long as that snapshot is still retained here. Once it is
//! evicted the broadcaster falls back to a full snapshot.

use shared::{Grid, SnapshotId};
use std::collections::BTreeMap;

/// Snapshots keyed by id; iteration order is oldest first.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    capacity: usize,
    snapshots: BTreeMap<SnapshotId, Grid>,
}

impl SnapshotHistory {
    /// Creates an empty archive holding at most `capacity` snapshots (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            snapshots: BTreeMap::new(),
        }
    }

    /// Archives a copy of `grid` under `id`, evicting the oldest entries once
    /// more than `capacity` snapshots are held.
    pub fn record(&mut self, id: SnapshotId, grid: &Grid) {
        self.snapshots.insert(id, grid.clone());
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_first();
        }
    }

    /// Archived grid for `id`, or `None` if it was evicted or never recorded.
    pub fn get(&self, id: SnapshotId) -> Option<&Grid> {
        self.snapshots.get(&id)
    }

    /// Whether a delta can still be rebased on `id`.
    pub fn contains(&self, id: SnapshotId) -> bool {
        self.snapshots.contains_key(&id)
    }

    /// Oldest snapshot still retained.
    pub fn oldest_id(&self) -> Option<SnapshotId> {
        self.snapshots.keys().next().copied()
    }

    /// Most recently recorded snapshot.
    pub fn latest_id(&self) -> Option<SnapshotId> {
        self.snapshots.keys().next_back().copied()
    }

    /// Retention window in snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of snapshots currently retained.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_get() {
        let mut history = SnapshotHistory::new(5);
        let mut grid = Grid::new(4);
        grid.set(0, 1, 2);
        history.record(0, &grid);

        assert_eq!(history.get(0), Some(&grid));
        assert_eq!(history.get(1), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_recorded_copy_is_isolated() {
        let mut history = SnapshotHistory::new(5);
        let mut live = Grid::new(4);
        history.record(0, &live);
        live.set(3, 3, 1);

        assert_eq!(history.get(0).and_then(|g| g.get(3, 3)), Some(0));
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut history = SnapshotHistory::new(50);
        let grid = Grid::new(20);
        for id in 0..120 {
            history.record(id, &grid);
            assert!(history.len() <= 50);
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.oldest_id(), Some(70));
        assert_eq!(history.latest_id(), Some(119));
        for id in 0..70 {
            assert!(history.get(id).is_none(), "snapshot {} should be evicted", id);
        }
        for id in 70..120 {
            assert!(history.contains(id));
        }
    }

    #[test]
    fn test_zero_capacity_still_holds_latest() {
        let mut history = SnapshotHistory::new(0);
        let grid = Grid::new(2);
        history.record(0, &grid);
        history.record(1, &grid);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.latest_id(), Some(1));
        assert!(!history.contains(0));
    }

    #[test]
    fn test_empty_history() {
        let history = SnapshotHistory::new(3);
        assert!(history.is_empty());
        assert_eq!(history.oldest_id(), None);
        assert_eq!(history.latest_id(), None);
    }
}
