//! Trigger and per-subsystem event records.

use crate::hit::DigiHit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One readout window of a subsystem within an event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trigger {
    /// Number of stored tracks (carried through, not used downstream).
    pub n_tracks: i32,
    /// Summed charge as reported by the simulation for this trigger.
    ///
    /// This is not required to equal the sum over `digi_hits`.
    pub sum_q: f64,
    /// Digitized hits in readout order.
    pub digi_hits: Vec<DigiHit>,
}

impl Trigger {
    /// Creates a trigger from its reported charge and hits.
    #[must_use]
    pub fn new(sum_q: f64, digi_hits: Vec<DigiHit>) -> Self {
        Self {
            n_tracks: 0,
            sum_q,
            digi_hits,
        }
    }

    /// Creates a trigger whose reported charge is the sum of its hits.
    #[must_use]
    pub fn from_hits(digi_hits: Vec<DigiHit>) -> Self {
        let sum_q = digi_hits.iter().map(|hit| hit.q).sum();
        Self::new(sum_q, digi_hits)
    }

    /// Sets the track count.
    #[must_use]
    pub fn with_n_tracks(mut self, n_tracks: i32) -> Self {
        self.n_tracks = n_tracks;
        self
    }

    /// Number of digitized hits.
    #[inline]
    #[must_use]
    pub fn n_digi_hits(&self) -> usize {
        self.digi_hits.len()
    }
}

/// One subsystem's view of an event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubsystemEvent {
    pub triggers: Vec<Trigger>,
}

impl SubsystemEvent {
    /// Creates an event view from its triggers.
    #[must_use]
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    /// Number of triggers.
    #[must_use]
    pub fn n_triggers(&self) -> usize {
        self.triggers.len()
    }

    /// Digitized hits summed over all triggers.
    #[must_use]
    pub fn n_digi_hits(&self) -> usize {
        self.triggers.iter().map(Trigger::n_digi_hits).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trigger_from_hits_sums_charge() {
        let trigger = Trigger::from_hits(vec![
            DigiHit::new(1, 0.0, 1.25),
            DigiHit::new(2, 1.0, 2.0),
        ]);
        assert_eq!(trigger.n_digi_hits(), 2);
        assert_relative_eq!(trigger.sum_q, 3.25);
    }

    #[test]
    fn test_event_counts_span_triggers() {
        let event = SubsystemEvent::new(vec![
            Trigger::from_hits(vec![DigiHit::new(1, 0.0, 1.0)]),
            Trigger::new(0.0, Vec::new()),
            Trigger::from_hits(vec![DigiHit::new(2, 0.0, 1.0), DigiHit::new(3, 0.0, 1.0)]),
        ]);
        assert_eq!(event.n_triggers(), 3);
        assert_eq!(event.n_digi_hits(), 3);
    }
}
