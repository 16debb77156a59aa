//! wcdigi-io: HDF5 event stores and output tables for wcdigi.
//!
//! This crate binds the [`wcdigi_core::EventSource`] and
//! [`wcdigi_core::TableSink`] adapters to HDF5 files via hdf5-metno, and
//! provides the JSON store configuration, an output reader and a merger
//! for output files.
//!

pub mod config;
mod error;
mod h5;
pub mod input;
pub mod merge;
pub mod output;

pub use config::{InputLayout, OutputOptions, StoreConfig};
pub use error::{Error, Result};
pub use input::{inspect_event_store, write_event_store, Hdf5EventSource, StoreInfo};
pub use merge::merge_outputs;
pub use output::{
    read_output, read_provenance, Hdf5TableWriter, HitTable, OutputTables, Provenance,
    SummaryTable,
};

use std::path::Path;
use wcdigi_core::RunStatistics;

/// Extracts every event of the input store into a fresh output store.
///
/// # Errors
/// Returns an error if the input cannot be opened, the geometry table is
/// empty, or any read or write fails.
pub fn process_file<P, Q>(input: P, output: Q, config: &StoreConfig) -> Result<RunStatistics>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut source = Hdf5EventSource::open(input.as_ref(), &config.input)?;
    let mut sink = Hdf5TableWriter::create(
        output.as_ref(),
        source.geometry_info(),
        &[input.as_ref().display().to_string()],
        &config.output,
    )?;
    wcdigi_core::run_pipeline(&mut source, &mut sink)
}
