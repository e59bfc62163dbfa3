//! Best-solution tracking.

use crate::common::Candidate;

/// Holds the best candidate ever observed; its fitness never increases.
///
/// Updates happen only through [`trial`] and [`refresh`], which replace
/// the held candidate on strict fitness improvement — exact ties keep the
/// incumbent, so the lowest slot index wins a tied scan. Both must only
/// be called while no concurrent writer is mutating the population, i.e.
/// after a phase barrier.
///
/// [`trial`]: BestTracker::trial
/// [`refresh`]: BestTracker::refresh
#[derive(Clone, Debug)]
pub struct BestTracker {
    best: Candidate,
}

impl BestTracker {
    /// A tracker holding an unevaluated placeholder; the first refresh
    /// against any evaluated population replaces it.
    pub fn new(dim: usize) -> Self {
        Self {
            best: Candidate::zeros(dim),
        }
    }

    /// Replace the held candidate if `candidate` is strictly better.
    /// Returns whether a replacement occurred.
    pub fn trial(&mut self, candidate: &Candidate) -> bool {
        if candidate.fitness < self.best.fitness {
            self.best = candidate.clone();
            return true;
        }
        false
    }

    /// Scan the whole population once in slot order. Returns whether any
    /// replacement occurred.
    pub fn refresh(&mut self, population: &[Candidate]) -> bool {
        let mut updated = false;
        for candidate in population {
            if self.trial(candidate) {
                updated = true;
            }
        }
        updated
    }

    pub fn best(&self) -> &Candidate {
        &self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn candidate(position: [f64; 2], fitness: f64) -> Candidate {
        let mut c = Candidate::unevaluated(array![position[0], position[1]]);
        c.fitness = fitness;
        c
    }

    #[test]
    fn test_trial_replaces_only_on_strict_improvement() {
        let mut tracker = BestTracker::new(2);
        assert!(tracker.trial(&candidate([1.0, 1.0], 2.0)));
        assert!(!tracker.trial(&candidate([3.0, 3.0], 2.0)));
        assert_eq!(tracker.best().position, array![1.0, 1.0]);
        assert!(tracker.trial(&candidate([0.5, 0.5], 1.0)));
        assert_eq!(tracker.best().fitness, 1.0);
    }

    #[test]
    fn test_refresh_lowest_slot_wins_ties() {
        let mut tracker = BestTracker::new(2);
        let population = vec![
            candidate([1.0, 0.0], 5.0),
            candidate([2.0, 0.0], 5.0),
            candidate([3.0, 0.0], 5.0),
        ];
        assert!(tracker.refresh(&population));
        assert_eq!(tracker.best().position, array![1.0, 0.0]);
        // A second refresh over the same population changes nothing
        assert!(!tracker.refresh(&population));
    }
}
