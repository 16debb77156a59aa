//! Event source adapter.
//!
//! The pipeline reads events only through [`EventSource`], so it never
//! depends on the storage technology behind the event and geometry tables.
//! Each event is exposed as two independently loaded subsystem views that
//! share the same event index.

use crate::event::SubsystemEvent;
use crate::geometry::GeometryInfo;
use crate::hit::Subsystem;
use crate::{Error, Result};

/// A readable store of simulated events plus its geometry record.
pub trait EventSource {
    /// Error type of the concrete store.
    type Error: From<Error>;

    /// Number of events in the event table.
    fn n_events(&self) -> usize;

    /// Geometry record loaded when the source was opened.
    fn geometry(&self) -> &GeometryInfo;

    /// Loads one subsystem's view of event `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the record cannot be
    /// read.
    fn load_event(
        &mut self,
        subsystem: Subsystem,
        index: usize,
    ) -> std::result::Result<SubsystemEvent, Self::Error>;
}

/// Event source holding its events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    geometry: GeometryInfo,
    inner: Vec<SubsystemEvent>,
    outer: Vec<SubsystemEvent>,
}

impl MemoryEventSource {
    /// Creates an empty source with the given geometry.
    #[must_use]
    pub fn new(geometry: GeometryInfo) -> Self {
        Self {
            geometry,
            inner: Vec::new(),
            outer: Vec::new(),
        }
    }

    /// Appends an event given its ID and OD views.
    pub fn push_event(&mut self, inner: SubsystemEvent, outer: SubsystemEvent) {
        self.inner.push(inner);
        self.outer.push(outer);
    }

    /// Builder form of [`push_event`](Self::push_event).
    #[must_use]
    pub fn with_event(mut self, inner: SubsystemEvent, outer: SubsystemEvent) -> Self {
        self.push_event(inner, outer);
        self
    }

    /// Borrows a stored event view.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEventIndex`] if `index` is out of range.
    pub fn event(&self, subsystem: Subsystem, index: usize) -> Result<&SubsystemEvent> {
        let events = match subsystem {
            Subsystem::Inner => &self.inner,
            Subsystem::Outer => &self.outer,
        };
        events.get(index).ok_or(Error::InvalidEventIndex {
            index,
            n_events: events.len(),
        })
    }
}

impl EventSource for MemoryEventSource {
    type Error = Error;

    fn n_events(&self) -> usize {
        self.inner.len()
    }

    fn geometry(&self) -> &GeometryInfo {
        &self.geometry
    }

    fn load_event(&mut self, subsystem: Subsystem, index: usize) -> Result<SubsystemEvent> {
        self.event(subsystem, index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Trigger;
    use crate::hit::DigiHit;

    #[test]
    fn test_memory_source_views_share_index() {
        let inner = SubsystemEvent::new(vec![Trigger::from_hits(vec![DigiHit::new(1, 0.0, 1.0)])]);
        let outer = SubsystemEvent::default();
        let mut source = MemoryEventSource::new(GeometryInfo::new(10, 5)).with_event(inner.clone(), outer);

        assert_eq!(source.n_events(), 1);
        assert_eq!(source.load_event(Subsystem::Inner, 0).unwrap(), inner);
        assert_eq!(source.load_event(Subsystem::Outer, 0).unwrap().n_triggers(), 0);
    }

    #[test]
    fn test_memory_source_out_of_range() {
        let mut source = MemoryEventSource::new(GeometryInfo::default());
        let err = source.load_event(Subsystem::Inner, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidEventIndex {
                index: 3,
                n_events: 0
            }
        ));
    }
}
