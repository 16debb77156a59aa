//! Structure of Arrays (`SoA`) storage for one subsystem's hits in an event.
//!
//! Output tables store tube ids, times and charges as parallel columns, so
//! hits are accumulated the same way instead of as a vector of structs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parallel per-hit columns for a single subsystem.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubsystemHits {
    /// Subsystem-specific tube ids.
    pub tube_id: Vec<i32>,
    /// Hit times.
    pub time: Vec<f64>,
    /// Hit charges.
    pub charge: Vec<f64>,
}

impl SubsystemHits {
    /// Returns the number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tube_id.len()
    }

    /// Returns true if no hit has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tube_id.is_empty()
    }

    /// Clears all columns, keeping their allocations.
    pub fn clear(&mut self) {
        self.tube_id.clear();
        self.time.clear();
        self.charge.clear();
    }

    /// Pushes a single hit.
    pub fn push(&mut self, tube_id: i32, time: f64, charge: f64) {
        self.tube_id.push(tube_id);
        self.time.push(time);
        self.charge.push(charge);
    }

    /// Sum of all charges.
    #[must_use]
    pub fn charge_sum(&self) -> f64 {
        self.charge.iter().sum()
    }

    /// Largest single charge, or 0 when empty.
    #[must_use]
    pub fn charge_max(&self) -> f64 {
        self.charge.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_subsystem_hits_operations() {
        let mut hits = SubsystemHits::default();
        assert!(hits.is_empty());

        hits.push(10, 5.0, 1.5);
        hits.push(11, 6.0, 3.0);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits.charge_sum(), 4.5);
        assert_relative_eq!(hits.charge_max(), 3.0);

        assert_eq!(hits.tube_id, vec![10, 11]);
        assert_eq!(hits.time, vec![5.0, 6.0]);

        hits.clear();
        assert!(hits.is_empty());
        assert_relative_eq!(hits.charge_max(), 0.0);
    }
}
