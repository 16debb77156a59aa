//! wcdigi-core: Event model and per-event aggregation for digitized PMT hits.
//!
//! This crate provides the subsystem-agnostic pieces of the extraction
//! pipeline: the event/trigger/hit model, the [`EventSource`] and
//! [`TableSink`] adapter traits, the per-event accumulator, and the
//! sequential driver that ties them together.
//!

pub mod aggregation;
pub mod error;
pub mod event;
pub mod extraction;
pub mod geometry;
pub mod hit;
pub mod pipeline;
pub mod soa;
pub mod source;

pub use aggregation::{EventAccumulator, EventRows, EventSummary, SubsystemHitRow};
pub use error::{Error, Result};
pub use event::{SubsystemEvent, Trigger};
pub use extraction::extract_event;
pub use geometry::GeometryInfo;
pub use hit::{DigiHit, Subsystem};
pub use pipeline::{run_pipeline, MemoryTables, RunStatistics, TableSink};
pub use soa::SubsystemHits;
pub use source::{EventSource, MemoryEventSource};
