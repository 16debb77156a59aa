//! Per-event accumulation of hit sequences and summary statistics.
//!
//! An [`EventAccumulator`] is reset at the start of every event, folded with
//! each trigger of both subsystems, and then frozen into [`EventRows`]: one
//! row for the summary table and one row per subsystem hit table.

use crate::event::Trigger;
use crate::hit::Subsystem;
use crate::soa::SubsystemHits;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar summary of one event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventSummary {
    /// Sum of every digitized hit charge, both subsystems.
    pub total_digi_q: f64,
    /// Largest single hit charge in the inner detector (0 if no hits).
    pub max_digi_q_inner: f64,
    /// Largest single hit charge in the outer detector (0 if no hits).
    pub max_digi_q_outer: f64,
    /// Number of digitized hits, both subsystems.
    pub total_digi_hit: u64,
    /// Sum of the trigger-reported charges, both subsystems.
    pub total_q: f64,
}

/// One row of a subsystem hit table.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubsystemHitRow {
    /// Event index.
    pub event: usize,
    /// Hits of that event, in trigger then readout order.
    pub hits: SubsystemHits,
}

/// Finalized rows of one event for all three output tables.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRows {
    pub summary: EventSummary,
    pub inner: SubsystemHitRow,
    pub outer: SubsystemHitRow,
}

impl EventRows {
    /// Hit row of one subsystem.
    #[must_use]
    pub fn hit_row(&self, subsystem: Subsystem) -> &SubsystemHitRow {
        match subsystem {
            Subsystem::Inner => &self.inner,
            Subsystem::Outer => &self.outer,
        }
    }
}

/// Running totals for the event currently being extracted.
#[derive(Debug, Clone, Default)]
pub struct EventAccumulator {
    event: usize,
    hits: [SubsystemHits; 2],
    max_digi_q: [f64; 2],
    total_digi_q: f64,
    total_digi_hit: u64,
    total_q: f64,
}

impl EventAccumulator {
    /// Creates an accumulator positioned at event 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all sequences and zeroes every scalar for a new event.
    pub fn reset(&mut self, event: usize) {
        self.event = event;
        for hits in &mut self.hits {
            hits.clear();
        }
        self.max_digi_q = [0.0; 2];
        self.total_digi_q = 0.0;
        self.total_digi_hit = 0;
        self.total_q = 0.0;
    }

    /// Folds one trigger of a subsystem into the running totals.
    ///
    /// The trigger's reported charge feeds `total_q` and its hits feed the
    /// hit sequences, `total_digi_q` and the subsystem maximum. The two
    /// charge totals are kept apart on purpose: a reported sum may include
    /// hits absent from the digitized collection.
    pub fn fold_trigger(&mut self, subsystem: Subsystem, trigger: &Trigger) {
        let slot = subsystem.index();
        self.total_digi_hit += trigger.n_digi_hits() as u64;
        self.total_q += trigger.sum_q;

        for hit in &trigger.digi_hits {
            let charge = hit.q;
            self.hits[slot].push(subsystem.tube_id_of(hit), hit.t, charge);
            self.total_digi_q += charge;
            if charge > self.max_digi_q[slot] {
                self.max_digi_q[slot] = charge;
            }
        }
    }

    /// Hits recorded so far for a subsystem.
    #[must_use]
    pub fn hits(&self, subsystem: Subsystem) -> &SubsystemHits {
        &self.hits[subsystem.index()]
    }

    /// Current summary values.
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            total_digi_q: self.total_digi_q,
            max_digi_q_inner: self.max_digi_q[Subsystem::Inner.index()],
            max_digi_q_outer: self.max_digi_q[Subsystem::Outer.index()],
            total_digi_hit: self.total_digi_hit,
            total_q: self.total_q,
        }
    }

    /// Freezes the accumulated values into output rows.
    #[must_use]
    pub fn finish(&self) -> EventRows {
        EventRows {
            summary: self.summary(),
            inner: SubsystemHitRow {
                event: self.event,
                hits: self.hits(Subsystem::Inner).clone(),
            },
            outer: SubsystemHitRow {
                event: self.event,
                hits: self.hits(Subsystem::Outer).clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::DigiHit;
    use approx::assert_relative_eq;

    #[test]
    fn test_fold_keeps_charge_paths_apart() {
        let mut acc = EventAccumulator::new();
        acc.reset(0);
        // Reported sum includes a hit that was not digitized.
        acc.fold_trigger(
            Subsystem::Inner,
            &Trigger::new(10.0, vec![DigiHit::new(1, 0.0, 2.0), DigiHit::new(2, 1.0, 4.0)]),
        );

        let summary = acc.summary();
        assert_relative_eq!(summary.total_digi_q, 6.0);
        assert_relative_eq!(summary.total_q, 10.0);
        assert_relative_eq!(summary.max_digi_q_inner, 4.0);
        assert_relative_eq!(summary.max_digi_q_outer, 0.0);
        assert_eq!(summary.total_digi_hit, 2);
    }

    #[test]
    fn test_outer_uses_mpmt_relative_id() {
        let mut acc = EventAccumulator::new();
        acc.reset(0);
        let hit = DigiHit::new(500, 3.0, 1.0).with_mpmt_pmt_id(12);
        acc.fold_trigger(Subsystem::Inner, &Trigger::from_hits(vec![hit]));
        acc.fold_trigger(Subsystem::Outer, &Trigger::from_hits(vec![hit]));

        assert_eq!(acc.hits(Subsystem::Inner).tube_id, vec![500]);
        assert_eq!(acc.hits(Subsystem::Outer).tube_id, vec![12]);
    }

    #[test]
    fn test_empty_trigger_only_adds_reported_charge() {
        let mut acc = EventAccumulator::new();
        acc.reset(4);
        acc.fold_trigger(Subsystem::Outer, &Trigger::new(0.75, Vec::new()));

        let rows = acc.finish();
        assert_eq!(rows.outer.event, 4);
        assert!(rows.outer.hits.is_empty());
        assert_eq!(rows.summary.total_digi_hit, 0);
        assert_relative_eq!(rows.summary.total_q, 0.75);
        assert_relative_eq!(rows.summary.total_digi_q, 0.0);
    }

    #[test]
    fn test_reset_clears_previous_event() {
        let mut acc = EventAccumulator::new();
        acc.reset(0);
        acc.fold_trigger(
            Subsystem::Inner,
            &Trigger::from_hits(vec![DigiHit::new(1, 0.0, 9.0)]),
        );
        acc.fold_trigger(
            Subsystem::Outer,
            &Trigger::from_hits(vec![DigiHit::new(2, 0.0, 8.0)]),
        );

        acc.reset(1);
        let rows = acc.finish();
        assert_eq!(rows.inner.event, 1);
        assert!(rows.inner.hits.is_empty());
        assert!(rows.outer.hits.is_empty());
        assert_eq!(rows.summary, EventSummary::default());
    }

    #[test]
    fn test_negative_charge_does_not_lower_max() {
        let mut acc = EventAccumulator::new();
        acc.reset(0);
        acc.fold_trigger(
            Subsystem::Inner,
            &Trigger::from_hits(vec![DigiHit::new(1, 0.0, -0.5)]),
        );
        let summary = acc.summary();
        assert_relative_eq!(summary.max_digi_q_inner, 0.0);
        assert_relative_eq!(summary.total_digi_q, -0.5);
    }
}
