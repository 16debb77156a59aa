//! HDF5 output tables.
//!
//! Layout:
//!
//! ```text
//! /                   attrs: wcdigi_format_version, source_file (list)
//! /totalTree/         totalDigiQ, maxDigiQ_20, maxDigiQ_3, totalDigiHit, totalQ
//! /Tree_20/           attr n_pmt; EvtNum, event_index, tubeID, digiHitT, digiHitQ
//! /Tree_3/            same as Tree_20
//! ```
//!
//! Hit tables hold one logical row per event. The hit columns are flattened
//! and `event_index[i]` is the first hit row of event `i`, so an event's
//! hits run up to the next event's offset (or the column end).

use crate::config::OutputOptions;
use crate::h5::{
    append_slice, create_extendable_dataset, offset_to_i64, offsets_to_usize, open_group,
    read_attr_opt, read_attr_opt_string, read_attr_str_list, read_dataset_vec, set_attr_i32,
    set_attr_str_file, set_attr_str_list_file, set_dataset_units,
};
use crate::{Error, Result};
use hdf5::{Dataset, File, Group};
use std::ops::Range;
use std::path::Path;
use wcdigi_core::{
    EventRows, EventSummary, GeometryInfo, Subsystem, SubsystemHitRow, SubsystemHits, TableSink,
};

/// Format version written to every output file.
pub const FORMAT_VERSION: &str = "0.1";

pub(crate) const SUMMARY_TABLE: &str = "totalTree";

const FORMAT_VERSION_ATTR: &str = "wcdigi_format_version";
const SOURCE_FILE_ATTR: &str = "source_file";

/// Name of the hit table of a subsystem.
#[must_use]
pub fn hit_table_name(subsystem: Subsystem) -> String {
    format!("Tree_{}", subsystem.suffix())
}

/// Writer for the three output tables.
///
/// The file is truncated on creation. Rows become visible to readers once
/// [`TableSink::finish`] has flushed the file.
pub struct Hdf5TableWriter {
    file: File,
    summary: SummaryDatasets,
    hits: [HitDatasets; 2],
    n_events: usize,
}

impl Hdf5TableWriter {
    /// Creates an output file with empty tables.
    ///
    /// `source_files` names the stores the rows come from; it is written as
    /// the `source_file` attribute unless empty.
    ///
    /// # Errors
    /// Returns an error if the file or any dataset cannot be created.
    pub fn create<P: AsRef<Path>>(
        path: P,
        geometry: GeometryInfo,
        source_files: &[String],
        options: &OutputOptions,
    ) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        set_attr_str_file(&file, FORMAT_VERSION_ATTR, FORMAT_VERSION)?;
        if !source_files.is_empty() {
            set_attr_str_list_file(&file, SOURCE_FILE_ATTR, source_files)?;
        }

        let summary = SummaryDatasets::create(&file.create_group(SUMMARY_TABLE)?, options)?;
        let inner = HitDatasets::create(&file, Subsystem::Inner, geometry, options)?;
        let outer = HitDatasets::create(&file, Subsystem::Outer, geometry, options)?;
        log::debug!("Created output tables in {}", path.as_ref().display());

        Ok(Self {
            file,
            summary,
            hits: [inner, outer],
            n_events: 0,
        })
    }

    /// Number of event rows appended so far.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.n_events
    }
}

impl TableSink for Hdf5TableWriter {
    type Error = Error;

    fn append(&mut self, rows: &EventRows) -> Result<()> {
        self.summary.append(self.n_events, &rows.summary)?;
        for subsystem in Subsystem::ALL {
            self.hits[subsystem.index()].append(self.n_events, rows.hit_row(subsystem))?;
        }
        self.n_events += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

struct SummaryDatasets {
    total_digi_q: Dataset,
    max_digi_q_20: Dataset,
    max_digi_q_3: Dataset,
    total_digi_hit: Dataset,
    total_q: Dataset,
}

impl SummaryDatasets {
    fn create(group: &Group, options: &OutputOptions) -> Result<Self> {
        let real = |name: &str| -> Result<Dataset> {
            let dataset = create_extendable_dataset::<f64>(
                group,
                name,
                options.chunk_rows,
                options.compression,
                options.shuffle,
            )?;
            set_dataset_units(&dataset, "pe")?;
            Ok(dataset)
        };

        Ok(Self {
            total_digi_q: real("totalDigiQ")?,
            max_digi_q_20: real("maxDigiQ_20")?,
            max_digi_q_3: real("maxDigiQ_3")?,
            total_digi_hit: create_extendable_dataset::<u64>(
                group,
                "totalDigiHit",
                options.chunk_rows,
                options.compression,
                options.shuffle,
            )?,
            total_q: real("totalQ")?,
        })
    }

    fn append(&self, row: usize, summary: &EventSummary) -> Result<()> {
        append_slice(&self.total_digi_q, row, &[summary.total_digi_q])?;
        append_slice(&self.max_digi_q_20, row, &[summary.max_digi_q_inner])?;
        append_slice(&self.max_digi_q_3, row, &[summary.max_digi_q_outer])?;
        append_slice(&self.total_digi_hit, row, &[summary.total_digi_hit])?;
        append_slice(&self.total_q, row, &[summary.total_q])?;
        Ok(())
    }
}

struct HitDatasets {
    evt_num: Dataset,
    event_index: Dataset,
    tube_id: Dataset,
    digi_hit_t: Dataset,
    digi_hit_q: Dataset,
    n_hits: usize,
}

impl HitDatasets {
    fn create(
        file: &File,
        subsystem: Subsystem,
        geometry: GeometryInfo,
        options: &OutputOptions,
    ) -> Result<Self> {
        let group = file.create_group(&hit_table_name(subsystem))?;
        set_attr_i32(&group, "n_pmt", geometry.num_pmt(subsystem))?;

        let chunk = options.chunk_rows;
        let level = options.compression;
        let shuffle = options.shuffle;

        let digi_hit_t = create_extendable_dataset::<f64>(&group, "digiHitT", chunk, level, shuffle)?;
        set_dataset_units(&digi_hit_t, "ns")?;
        let digi_hit_q = create_extendable_dataset::<f64>(&group, "digiHitQ", chunk, level, shuffle)?;
        set_dataset_units(&digi_hit_q, "pe")?;

        Ok(Self {
            evt_num: create_extendable_dataset::<i64>(&group, "EvtNum", chunk, level, shuffle)?,
            event_index: create_extendable_dataset::<i64>(
                &group,
                "event_index",
                chunk,
                level,
                shuffle,
            )?,
            tube_id: create_extendable_dataset::<i32>(&group, "tubeID", chunk, level, shuffle)?,
            digi_hit_t,
            digi_hit_q,
            n_hits: 0,
        })
    }

    fn append(&mut self, row: usize, hit_row: &SubsystemHitRow) -> Result<()> {
        append_slice(&self.evt_num, row, &[offset_to_i64("EvtNum", hit_row.event)?])?;
        append_slice(
            &self.event_index,
            row,
            &[offset_to_i64("event_index", self.n_hits)?],
        )?;

        let hits = &hit_row.hits;
        append_slice(&self.tube_id, self.n_hits, &hits.tube_id)?;
        append_slice(&self.digi_hit_t, self.n_hits, &hits.time)?;
        append_slice(&self.digi_hit_q, self.n_hits, &hits.charge)?;
        self.n_hits += hits.len();
        Ok(())
    }
}

/// Columns of the summary table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryTable {
    pub total_digi_q: Vec<f64>,
    pub max_digi_q_20: Vec<f64>,
    pub max_digi_q_3: Vec<f64>,
    pub total_digi_hit: Vec<u64>,
    pub total_q: Vec<f64>,
}

impl SummaryTable {
    /// Number of event rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total_digi_q.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_digi_q.is_empty()
    }

    /// Summary of event row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn row(&self, i: usize) -> EventSummary {
        EventSummary {
            total_digi_q: self.total_digi_q[i],
            max_digi_q_inner: self.max_digi_q_20[i],
            max_digi_q_outer: self.max_digi_q_3[i],
            total_digi_hit: self.total_digi_hit[i],
            total_q: self.total_q[i],
        }
    }
}

/// Columns of one subsystem hit table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitTable {
    /// PMT capacity of the subsystem.
    pub n_pmt: i32,
    /// Event number of each row.
    pub evt_num: Vec<usize>,
    /// First hit of each row.
    pub event_index: Vec<usize>,
    pub tube_id: Vec<i32>,
    pub digi_hit_t: Vec<f64>,
    pub digi_hit_q: Vec<f64>,
}

impl HitTable {
    /// Number of event rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evt_num.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evt_num.is_empty()
    }

    /// Total number of hits over all rows.
    #[must_use]
    pub fn n_hits(&self) -> usize {
        self.tube_id.len()
    }

    /// Hit range of row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn hit_range(&self, i: usize) -> Range<usize> {
        let start = self.event_index[i];
        let end = self
            .event_index
            .get(i + 1)
            .copied()
            .unwrap_or_else(|| self.n_hits());
        start..end
    }

    /// Row `i` as a hit sequence.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn row(&self, i: usize) -> SubsystemHitRow {
        let range = self.hit_range(i);
        SubsystemHitRow {
            event: self.evt_num[i],
            hits: SubsystemHits {
                tube_id: self.tube_id[range.clone()].to_vec(),
                time: self.digi_hit_t[range.clone()].to_vec(),
                charge: self.digi_hit_q[range].to_vec(),
            },
        }
    }

    fn validate(&self, table: &str) -> Result<()> {
        let n_hits = self.n_hits();
        if self.event_index.len() != self.evt_num.len() {
            return Err(Error::InvalidFormat(format!(
                "{table}: event_index has {} rows, EvtNum has {}",
                self.event_index.len(),
                self.evt_num.len()
            )));
        }
        if self.digi_hit_t.len() != n_hits || self.digi_hit_q.len() != n_hits {
            return Err(Error::InvalidFormat(format!(
                "{table}: hit columns differ in length"
            )));
        }
        let mut previous = 0;
        for &start in &self.event_index {
            if start < previous || start > n_hits {
                return Err(Error::InvalidFormat(format!(
                    "{table}: event_index is not monotonic within 0..={n_hits}"
                )));
            }
            previous = start;
        }
        Ok(())
    }
}

/// File-level attributes of an output file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
    pub format_version: Option<String>,
    /// Input stores the rows were extracted from, in row order.
    pub source_files: Vec<String>,
}

/// Contents of an output file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputTables {
    pub provenance: Provenance,
    pub summary: SummaryTable,
    pub tree_20: HitTable,
    pub tree_3: HitTable,
}

impl OutputTables {
    /// Geometry recorded in the hit tables.
    #[must_use]
    pub fn geometry(&self) -> GeometryInfo {
        GeometryInfo::new(self.tree_20.n_pmt, self.tree_3.n_pmt)
    }

    /// Number of events.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.summary.len()
    }

    /// Rebuilds the per-event rows.
    #[must_use]
    pub fn rows(&self) -> Vec<EventRows> {
        (0..self.n_events())
            .map(|i| EventRows {
                summary: self.summary.row(i),
                inner: self.tree_20.row(i),
                outer: self.tree_3.row(i),
            })
            .collect()
    }
}

/// Reads an output file back into memory.
///
/// # Errors
/// Returns an error if the file cannot be opened, a table or column is
/// missing, or the tables disagree on the number of events.
pub fn read_output<P: AsRef<Path>>(path: P) -> Result<OutputTables> {
    let file = File::open(path.as_ref())?;

    let summary_group = open_group(&file, SUMMARY_TABLE)?;
    let summary = SummaryTable {
        total_digi_q: read_dataset_vec(&summary_group, "totalDigiQ")?,
        max_digi_q_20: read_dataset_vec(&summary_group, "maxDigiQ_20")?,
        max_digi_q_3: read_dataset_vec(&summary_group, "maxDigiQ_3")?,
        total_digi_hit: read_dataset_vec(&summary_group, "totalDigiHit")?,
        total_q: read_dataset_vec(&summary_group, "totalQ")?,
    };
    let n_events = summary.len();
    for len in [
        summary.max_digi_q_20.len(),
        summary.max_digi_q_3.len(),
        summary.total_digi_hit.len(),
        summary.total_q.len(),
    ] {
        if len != n_events {
            return Err(Error::InvalidFormat(format!(
                "{SUMMARY_TABLE}: columns differ in length ({len} vs {n_events})"
            )));
        }
    }

    let tree_20 = read_hit_table(&file, Subsystem::Inner, n_events)?;
    let tree_3 = read_hit_table(&file, Subsystem::Outer, n_events)?;

    Ok(OutputTables {
        provenance: read_file_provenance(&file)?,
        summary,
        tree_20,
        tree_3,
    })
}

/// Reads only the file-level attributes of an output file.
///
/// # Errors
/// Returns an error if the file cannot be opened or an attribute cannot be
/// decoded.
pub fn read_provenance<P: AsRef<Path>>(path: P) -> Result<Provenance> {
    let file = File::open(path.as_ref())?;
    read_file_provenance(&file)
}

fn read_file_provenance(file: &File) -> Result<Provenance> {
    Ok(Provenance {
        format_version: read_attr_opt_string(file, FORMAT_VERSION_ATTR)?,
        source_files: read_attr_str_list(file, SOURCE_FILE_ATTR)?,
    })
}

fn read_hit_table(file: &File, subsystem: Subsystem, n_events: usize) -> Result<HitTable> {
    let name = hit_table_name(subsystem);
    let group = open_group(file, &name)?;

    let table = HitTable {
        n_pmt: read_attr_opt::<i32>(&group, "n_pmt")?.unwrap_or_default(),
        evt_num: offsets_to_usize("EvtNum", &read_dataset_vec::<i64>(&group, "EvtNum")?)?,
        event_index: offsets_to_usize(
            "event_index",
            &read_dataset_vec::<i64>(&group, "event_index")?,
        )?,
        tube_id: read_dataset_vec(&group, "tubeID")?,
        digi_hit_t: read_dataset_vec(&group, "digiHitT")?,
        digi_hit_q: read_dataset_vec(&group, "digiHitQ")?,
    };
    table.validate(&name)?;
    if table.len() != n_events {
        return Err(Error::InvalidFormat(format!(
            "{name} has {} rows but {SUMMARY_TABLE} has {n_events}",
            table.len()
        )));
    }
    Ok(table)
}
