//! Sequential extract-aggregate-write driver.

use crate::aggregation::{EventAccumulator, EventRows};
use crate::extraction::extract_event;
use crate::hit::Subsystem;
use crate::source::EventSource;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Destination for the per-event output rows.
pub trait TableSink {
    /// Error type of the concrete store.
    type Error;

    /// Appends the rows of one event to all three tables.
    ///
    /// # Errors
    /// Returns an error if the rows cannot be written.
    fn append(&mut self, rows: &EventRows) -> std::result::Result<(), Self::Error>;

    /// Persists all tables.
    ///
    /// # Errors
    /// Returns an error if the store cannot be flushed.
    fn finish(&mut self) -> std::result::Result<(), Self::Error>;
}

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStatistics {
    pub n_events: usize,
    pub inner_hits: usize,
    pub outer_hits: usize,
}

impl RunStatistics {
    /// Hits written for a subsystem.
    #[must_use]
    pub fn hits(&self, subsystem: Subsystem) -> usize {
        match subsystem {
            Subsystem::Inner => self.inner_hits,
            Subsystem::Outer => self.outer_hits,
        }
    }

    /// Counts one event's rows.
    pub fn record(&mut self, rows: &EventRows) {
        self.n_events += 1;
        self.inner_hits += rows.inner.hits.len();
        self.outer_hits += rows.outer.hits.len();
    }
}

/// Runs every event of `source` through extraction and into `sink`.
///
/// Events are processed strictly in index order, one at a time, and the
/// sink is finished once all of them have been appended. A source with no
/// events still finishes the sink, leaving three empty tables.
///
/// # Errors
/// Stops at the first source or sink error; nothing is retried.
pub fn run_pipeline<S, K>(source: &mut S, sink: &mut K) -> std::result::Result<RunStatistics, S::Error>
where
    S: EventSource,
    K: TableSink<Error = S::Error>,
{
    let n_events = source.n_events();
    let geometry = *source.geometry();
    log::info!("Number of events: {n_events}");
    log::info!(
        "PMT capacity: ID {}, OD {}",
        geometry.num_pmt(Subsystem::Inner),
        geometry.num_pmt(Subsystem::Outer)
    );

    let mut acc = EventAccumulator::new();
    let mut stats = RunStatistics::default();

    for index in 0..n_events {
        extract_event(source, index, &mut acc)?;
        let rows = acc.finish();
        log::debug!(
            "event {index}: {} ID hit(s), {} OD hit(s), totalDigiQ {:.2e}",
            rows.inner.hits.len(),
            rows.outer.hits.len(),
            rows.summary.total_digi_q
        );
        sink.append(&rows)?;
        stats.record(&rows);
    }

    sink.finish()?;
    log::info!(
        "Wrote {} event(s): {} ID hit(s), {} OD hit(s)",
        stats.n_events,
        stats.inner_hits,
        stats.outer_hits
    );
    Ok(stats)
}

/// Table sink that keeps all rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    rows: Vec<EventRows>,
    finished: bool,
}

impl MemoryTables {
    /// Creates an empty set of tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows appended so far, in event order.
    #[must_use]
    pub fn rows(&self) -> &[EventRows] {
        &self.rows
    }

    /// Returns true once [`TableSink::finish`] has been called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl TableSink for MemoryTables {
    type Error = Error;

    fn append(&mut self, rows: &EventRows) -> Result<()> {
        if self.finished {
            return Err(Error::SinkFinished);
        }
        self.rows.push(rows.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
