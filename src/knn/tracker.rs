// src/knn/tracker.rs

use crate::error::{Error, Result};
use crate::types::{CandidateCluster, Neighbor, NeighborSlot};

/// Bounded top-k selection for a single reference point.
///
/// Slots fill in order until all `k` are occupied. After that, a new
/// observation replaces the first slot holding the current maximum distance,
/// but only when it is strictly smaller than that maximum.
#[derive(Debug, Clone)]
pub struct NeighborTracker {
    reference: usize,
    slots: Vec<NeighborSlot>,
    occupied: usize,
}

impl NeighborTracker {
    pub fn new(reference: usize, k: usize) -> Self {
        Self {
            reference,
            slots: vec![NeighborSlot::default(); k],
            occupied: 0,
        }
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    pub fn slots(&self) -> &[NeighborSlot] {
        &self.slots
    }

    /// Offer one candidate. Returns whether it was kept.
    pub fn observe(&mut self, index: usize, distance: f64) -> Result<bool> {
        if index == self.reference {
            return Err(Error::invalid_state(format!(
                "reference point {} observed as its own neighbor", self.reference
            )));
        }

        let candidate = Neighbor { index, distance };

        if !self.is_full() {
            self.slots[self.occupied].neighbor = Some(candidate);
            self.occupied += 1;
            return Ok(true);
        }

        match self.worst_slot() {
            Some((slot, worst)) if distance < worst => {
                self.slots[slot].neighbor = Some(candidate);
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    /// First slot holding the maximum distance, in slot order.
    fn worst_slot(&self) -> Option<(usize, f64)> {
        let mut worst: Option<(usize, f64)> = None;
        for (slot, held) in self.slots.iter().enumerate() {
            if let Some(distance) = held.distance() {
                match worst {
                    Some((_, max)) if distance <= max => {},
                    _ => worst = Some((slot, distance)),
                }
            }
        }
        worst
    }

    /// Consume the tracker into a candidate cluster. Valid only once all `k`
    /// slots are occupied.
    pub fn finalize(self) -> Result<CandidateCluster> {
        if !self.is_full() {
            return Err(Error::invalid_state(format!(
                "tracker for reference {} finalized with {} of {} slots occupied",
                self.reference, self.occupied, self.slots.len()
            )));
        }

        let neighbors: Vec<Neighbor> = self.slots.iter().filter_map(|slot| slot.neighbor).collect();
        let k = neighbors.len();
        if k == 0 {
            return Err(Error::invalid_state("tracker has no slots"));
        }
        let sum: f64 = neighbors.iter().map(|n| n.distance).sum();

        Ok(CandidateCluster {
            reference: self.reference,
            neighbors,
            average: sum / k as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_free_slots_unconditionally() {
        let mut tracker = NeighborTracker::new(0, 3);
        assert!(tracker.observe(1, 9.0).unwrap());
        assert!(tracker.observe(2, 7.0).unwrap());
        assert!(!tracker.is_full());
        assert!(tracker.observe(3, 8.0).unwrap());
        assert!(tracker.is_full());
        assert_eq!(tracker.occupied(), 3);
    }

    #[test]
    fn replaces_worst_only_on_strict_improvement() {
        let mut tracker = NeighborTracker::new(0, 2);
        tracker.observe(1, 5.0).unwrap();
        tracker.observe(2, 3.0).unwrap();

        // Equal to the worst: discarded.
        assert!(!tracker.observe(3, 5.0).unwrap());
        assert!(!tracker.observe(4, 6.0).unwrap());
        assert!(tracker.observe(5, 4.0).unwrap());

        let cluster = tracker.finalize().unwrap();
        let indices: Vec<usize> = cluster.neighbors.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![5, 2]);
        assert_eq!(cluster.average, 3.5);
    }

    #[test]
    fn ties_on_the_maximum_replace_the_first_slot() {
        let mut tracker = NeighborTracker::new(0, 3);
        tracker.observe(1, 2.0).unwrap();
        tracker.observe(2, 4.0).unwrap();
        tracker.observe(3, 4.0).unwrap();
        tracker.observe(4, 1.0).unwrap();

        let held: Vec<Option<usize>> = tracker.slots().iter().map(|s| s.neighbor.map(|n| n.index)).collect();
        assert_eq!(held, vec![Some(1), Some(4), Some(3)]);
    }

    #[test]
    fn zero_distances_count_as_occupied() {
        let mut tracker = NeighborTracker::new(0, 2);
        tracker.observe(1, 0.0).unwrap();
        tracker.observe(2, 0.0).unwrap();
        assert!(tracker.is_full());
        assert!(!tracker.observe(3, 0.0).unwrap());

        let cluster = tracker.finalize().unwrap();
        assert_eq!(cluster.average, 0.0);
        assert_eq!(cluster.k(), 2);
    }

    #[test]
    fn finalize_before_full_is_an_error() {
        let mut tracker = NeighborTracker::new(0, 3);
        tracker.observe(1, 1.0).unwrap();
        assert!(matches!(tracker.finalize(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn observing_the_reference_is_rejected() {
        let mut tracker = NeighborTracker::new(4, 2);
        assert!(matches!(tracker.observe(4, 0.0), Err(Error::InvalidState(_))));
        assert_eq!(tracker.occupied(), 0);
    }
}
