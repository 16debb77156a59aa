//! Concatenation of output files.
//!
//! Rows are appended in input order. `EvtNum` keeps the value each input
//! assigned, while hit offsets are rebased onto the merged hit columns.

use crate::config::OutputOptions;
use crate::output::{read_output, read_provenance, Hdf5TableWriter};
use crate::{Error, Result};
use std::path::Path;
use wcdigi_core::{RunStatistics, TableSink};

/// Merges output files into a new output file.
///
/// All inputs must share the format version and the recorded PMT
/// capacities. The merged `source_file` attribute lists the sources of
/// every input in order; an input without one contributes its own path.
///
/// # Errors
/// Returns an error if no inputs are given, the output is one of the
/// inputs, an input cannot be read, the inputs disagree on format version
/// or geometry, or the output cannot be written.
pub fn merge_outputs<P, Q>(inputs: &[P], output: Q, options: &OutputOptions) -> Result<RunStatistics>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output = output.as_ref();
    let Some(first) = inputs.first() else {
        return Err(Error::InvalidFormat("no files to merge".to_string()));
    };
    ensure_not_an_input(inputs, output)?;
    let source_files = collect_source_files(inputs)?;

    let first_tables = read_output(first)?;
    let geometry = first_tables.geometry();
    let mut pending = Some(first_tables);

    let mut writer = Hdf5TableWriter::create(output, geometry, &source_files, options)?;
    let mut stats = RunStatistics::default();

    for input in inputs {
        let tables = match pending.take() {
            Some(tables) => tables,
            None => read_output(input)?,
        };
        if tables.geometry() != geometry {
            return Err(Error::InvalidFormat(format!(
                "{} records PMT capacities {:?}, expected {:?}",
                input.as_ref().display(),
                tables.geometry(),
                geometry
            )));
        }
        log::info!(
            "Merging {} event(s) from {}",
            tables.n_events(),
            input.as_ref().display()
        );
        for rows in tables.rows() {
            writer.append(&rows)?;
            stats.record(&rows);
        }
    }

    writer.finish()?;
    Ok(stats)
}

fn ensure_not_an_input<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<()> {
    if !output.exists() {
        return Ok(());
    }
    let output_path = output.canonicalize()?;
    for input in inputs {
        if input.as_ref().canonicalize()? == output_path {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("merge output {} is also an input", output.display()),
            )));
        }
    }
    Ok(())
}

fn collect_source_files<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<String>> {
    let mut format_version = None;
    let mut source_files = Vec::new();

    for (i, input) in inputs.iter().enumerate() {
        let provenance = read_provenance(input)?;
        if i == 0 {
            format_version = provenance.format_version;
        } else if provenance.format_version != format_version {
            return Err(Error::InvalidFormat(format!(
                "{} has format version {:?}, expected {:?}",
                input.as_ref().display(),
                provenance.format_version,
                format_version
            )));
        }

        if provenance.source_files.is_empty() {
            source_files.push(input.as_ref().display().to_string());
        } else {
            source_files.extend(provenance.source_files);
        }
    }
    Ok(source_files)
}
