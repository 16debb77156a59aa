//! HDF5 event stores (simulation input).
//!
//! An event store mirrors the simulation's ROOT trees as HDF5 groups. Each
//! branch of the event table is a group of columns; variable-length
//! collections are flattened and addressed through row offsets, the same
//! way `NXevent_data` addresses events through `event_index`:
//!
//! ```text
//! /<event_tree>/<branch>/
//!     event_index     i64 [events]    first trigger row of each event
//!     n_tracks        i32 [triggers]
//!     sum_q           f64 [triggers]  trigger-reported summed charge
//!     n_digi_hits     i32 [triggers]
//!     digi_hit_index  i64 [triggers]  first hit row of each trigger
//!     tube_id         i32 [hits]
//!     mpmt_pmt_id     i32 [hits]
//!     t               f64 [hits]
//!     q               f64 [hits]
//! /<geometry_tree>/<geometry_branch>/
//!     wc_num_pmt      i32 [records, 2]
//! ```
//!
//! Trigger-level columns are loaded and validated when the store is opened;
//! hit columns are read per trigger on demand.

use crate::config::InputLayout;
use crate::h5::{
    create_filled_dataset, offset_to_i64, offsets_to_usize, open_group, read_dataset_vec,
    set_dataset_units,
};
use crate::{Error, Result};
use hdf5::{Dataset, File, Group};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use wcdigi_core::{
    DigiHit, EventSource, GeometryInfo, MemoryEventSource, Subsystem, SubsystemEvent, Trigger,
};

const GEOMETRY_DATASET: &str = "wc_num_pmt";

/// Per-subsystem row counts of an event store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub n_triggers: usize,
    pub n_digi_hits: usize,
}

/// Summary of an event store, gathered without running the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub n_events: usize,
    pub n_geometry_records: usize,
    pub num_pmt_inner: i32,
    pub num_pmt_outer: i32,
    pub inner: BranchInfo,
    pub outer: BranchInfo,
}

/// Event source backed by an HDF5 event store.
pub struct Hdf5EventSource {
    _file: File,
    geometry: GeometryInfo,
    n_geometry_records: usize,
    inner: BranchReader,
    outer: BranchReader,
}

impl Hdf5EventSource {
    /// Opens an event store and reads its geometry record.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, a table or branch is
    /// missing, the geometry table is empty, or the row offsets are
    /// inconsistent.
    pub fn open<P: AsRef<Path>>(path: P, layout: &InputLayout) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not open file \"{}\"", path.display()),
            )));
        }
        let file = File::open(path)?;
        log::info!("Input file: {}", path.display());

        let event_tree = open_group(&file, &layout.event_tree)?;
        let inner = BranchReader::open(&event_tree, &layout.inner_branch)?;
        let outer = BranchReader::open(&event_tree, &layout.outer_branch)?;
        if inner.n_events() != outer.n_events() {
            return Err(Error::InvalidFormat(format!(
                "branch '{}' holds {} events but '{}' holds {}",
                inner.name,
                inner.n_events(),
                outer.name,
                outer.n_events()
            )));
        }

        let geometry_tree = open_group(&file, &layout.geometry_tree)?;
        let geometry_branch = open_group(&geometry_tree, &layout.geometry_branch)?;
        let (geometry, n_geometry_records) = read_geometry(&geometry_branch)?;
        log::info!("Geometry table has {n_geometry_records} entries.");

        Ok(Self {
            _file: file,
            geometry,
            n_geometry_records,
            inner,
            outer,
        })
    }

    /// Geometry record 0.
    #[must_use]
    pub fn geometry_info(&self) -> GeometryInfo {
        self.geometry
    }

    /// Number of records in the geometry table.
    #[must_use]
    pub fn n_geometry_records(&self) -> usize {
        self.n_geometry_records
    }

    /// Row counts of a subsystem branch.
    #[must_use]
    pub fn branch_info(&self, subsystem: Subsystem) -> BranchInfo {
        let branch = self.branch(subsystem);
        BranchInfo {
            n_triggers: branch.n_triggers(),
            n_digi_hits: branch.n_hits,
        }
    }

    fn branch(&self, subsystem: Subsystem) -> &BranchReader {
        match subsystem {
            Subsystem::Inner => &self.inner,
            Subsystem::Outer => &self.outer,
        }
    }
}

impl EventSource for Hdf5EventSource {
    type Error = Error;

    fn n_events(&self) -> usize {
        self.inner.n_events()
    }

    fn geometry(&self) -> &GeometryInfo {
        &self.geometry
    }

    fn load_event(&mut self, subsystem: Subsystem, index: usize) -> Result<SubsystemEvent> {
        self.branch(subsystem).load(index)
    }
}

/// Reads the summary of an event store.
///
/// # Errors
/// Fails under the same conditions as [`Hdf5EventSource::open`].
pub fn inspect_event_store<P: AsRef<Path>>(path: P, layout: &InputLayout) -> Result<StoreInfo> {
    let source = Hdf5EventSource::open(path, layout)?;
    let geometry = source.geometry_info();
    Ok(StoreInfo {
        n_events: source.n_events(),
        n_geometry_records: source.n_geometry_records(),
        num_pmt_inner: geometry.num_pmt(Subsystem::Inner),
        num_pmt_outer: geometry.num_pmt(Subsystem::Outer),
        inner: source.branch_info(Subsystem::Inner),
        outer: source.branch_info(Subsystem::Outer),
    })
}

/// Writes in-memory events to a new event store.
///
/// # Errors
/// Returns an error if HDF5 I/O fails or offsets overflow `i64`.
pub fn write_event_store<P: AsRef<Path>>(
    path: P,
    layout: &InputLayout,
    source: &MemoryEventSource,
) -> Result<()> {
    write_store(path.as_ref(), layout, source, &[*source.geometry()])
}

fn write_store(
    path: &Path,
    layout: &InputLayout,
    source: &MemoryEventSource,
    geometry: &[GeometryInfo],
) -> Result<()> {
    let file = File::create(path)?;

    let event_tree = file.create_group(&layout.event_tree)?;
    for (subsystem, name) in [
        (Subsystem::Inner, &layout.inner_branch),
        (Subsystem::Outer, &layout.outer_branch),
    ] {
        let branch = event_tree.create_group(name)?;
        write_branch(&branch, source, subsystem)?;
    }

    let geometry_tree = file.create_group(&layout.geometry_tree)?;
    let geometry_branch = geometry_tree.create_group(&layout.geometry_branch)?;
    let mut counts = Array2::<i32>::zeros((geometry.len(), 2));
    for (row, record) in geometry.iter().enumerate() {
        counts[[row, 0]] = record.num_pmt(Subsystem::Inner);
        counts[[row, 1]] = record.num_pmt(Subsystem::Outer);
    }
    let dataset = geometry_branch
        .new_dataset::<i32>()
        .shape((geometry.len(), 2))
        .create(GEOMETRY_DATASET)?;
    if !geometry.is_empty() {
        dataset.write(counts.view())?;
    }
    Ok(())
}

fn write_branch(group: &Group, source: &MemoryEventSource, subsystem: Subsystem) -> Result<()> {
    let mut event_index = Vec::new();
    let mut n_tracks = Vec::new();
    let mut sum_q = Vec::new();
    let mut n_digi_hits = Vec::new();
    let mut digi_hit_index = Vec::new();
    let mut tube_id = Vec::new();
    let mut mpmt_pmt_id = Vec::new();
    let mut t = Vec::new();
    let mut q = Vec::new();

    for index in 0..source.n_events() {
        let event = source.event(subsystem, index)?;
        event_index.push(offset_to_i64("event_index", n_tracks.len())?);
        for trigger in &event.triggers {
            n_tracks.push(trigger.n_tracks);
            sum_q.push(trigger.sum_q);
            n_digi_hits.push(i32::try_from(trigger.n_digi_hits()).map_err(|_| {
                Error::InvalidFormat("n_digi_hits exceeds i32 range".to_string())
            })?);
            digi_hit_index.push(offset_to_i64("digi_hit_index", tube_id.len())?);
            for hit in &trigger.digi_hits {
                tube_id.push(hit.tube_id);
                mpmt_pmt_id.push(hit.mpmt_pmt_id);
                t.push(hit.t);
                q.push(hit.q);
            }
        }
    }

    create_filled_dataset(group, "event_index", &event_index)?;
    create_filled_dataset(group, "n_tracks", &n_tracks)?;
    let sum_q_ds = create_filled_dataset(group, "sum_q", &sum_q)?;
    set_dataset_units(&sum_q_ds, "pe")?;
    create_filled_dataset(group, "n_digi_hits", &n_digi_hits)?;
    create_filled_dataset(group, "digi_hit_index", &digi_hit_index)?;
    create_filled_dataset(group, "tube_id", &tube_id)?;
    create_filled_dataset(group, "mpmt_pmt_id", &mpmt_pmt_id)?;
    let t_ds = create_filled_dataset(group, "t", &t)?;
    set_dataset_units(&t_ds, "ns")?;
    let q_ds = create_filled_dataset(group, "q", &q)?;
    set_dataset_units(&q_ds, "pe")?;
    Ok(())
}

fn read_geometry(group: &Group) -> Result<(GeometryInfo, usize)> {
    let dataset = group.dataset(GEOMETRY_DATASET).map_err(|e| {
        Error::InvalidFormat(format!("missing dataset '{GEOMETRY_DATASET}': {e}"))
    })?;
    let shape = dataset.shape();
    if shape.len() != 2 || shape[1] < 2 {
        return Err(Error::InvalidFormat(format!(
            "{GEOMETRY_DATASET} must be 2-D with one column per subsystem, got shape {shape:?}"
        )));
    }
    let n_records = shape[0];
    if n_records == 0 {
        return Err(wcdigi_core::Error::MissingGeometry.into());
    }

    let first = dataset.read_slice_2d::<i32, _>(s![0..1, 0..2])?;
    let geometry = GeometryInfo::new(first[[0, 0]], first[[0, 1]]);
    Ok((geometry, n_records))
}

/// Column reader for one branch of the event table.
struct BranchReader {
    name: String,
    event_index: Vec<usize>,
    n_tracks: Vec<i32>,
    sum_q: Vec<f64>,
    n_digi_hits: Vec<usize>,
    digi_hit_index: Vec<usize>,
    tube_id: Dataset,
    mpmt_pmt_id: Dataset,
    t: Dataset,
    q: Dataset,
    n_hits: usize,
}

impl BranchReader {
    fn open(event_tree: &Group, name: &str) -> Result<Self> {
        let group = open_group(event_tree, name)?;

        let event_index = offsets_to_usize("event_index", &read_dataset_vec::<i64>(&group, "event_index")?)?;
        let n_tracks = read_dataset_vec::<i32>(&group, "n_tracks")?;
        let sum_q = read_dataset_vec::<f64>(&group, "sum_q")?;
        let n_digi_hits = read_dataset_vec::<i32>(&group, "n_digi_hits")?
            .into_iter()
            .map(|n| {
                usize::try_from(n).map_err(|_| {
                    Error::InvalidFormat(format!("branch '{name}' has negative n_digi_hits {n}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let digi_hit_index =
            offsets_to_usize("digi_hit_index", &read_dataset_vec::<i64>(&group, "digi_hit_index")?)?;

        let tube_id = hit_dataset(&group, "tube_id")?;
        let mpmt_pmt_id = hit_dataset(&group, "mpmt_pmt_id")?;
        let t = hit_dataset(&group, "t")?;
        let q = hit_dataset(&group, "q")?;

        let reader = Self {
            name: name.to_string(),
            event_index,
            n_tracks,
            sum_q,
            n_digi_hits,
            digi_hit_index,
            n_hits: tube_id.size(),
            tube_id,
            mpmt_pmt_id,
            t,
            q,
        };
        reader.validate()?;
        log::debug!(
            "branch '{}': {} events, {} triggers, {} digi hits",
            reader.name,
            reader.n_events(),
            reader.n_triggers(),
            reader.n_hits
        );
        Ok(reader)
    }

    fn validate(&self) -> Result<()> {
        let n_triggers = self.n_triggers();
        for (column, len) in [
            ("sum_q", self.sum_q.len()),
            ("n_digi_hits", self.n_digi_hits.len()),
            ("digi_hit_index", self.digi_hit_index.len()),
        ] {
            if len != n_triggers {
                return Err(self.format_error(format!(
                    "{column} has {len} rows, expected {n_triggers}"
                )));
            }
        }
        for (column, dataset) in [("mpmt_pmt_id", &self.mpmt_pmt_id), ("t", &self.t), ("q", &self.q)] {
            if dataset.size() != self.n_hits {
                return Err(self.format_error(format!(
                    "{column} has {} rows, expected {}",
                    dataset.size(),
                    self.n_hits
                )));
            }
        }

        let mut previous = 0;
        for (event, &start) in self.event_index.iter().enumerate() {
            if start < previous || start > n_triggers {
                return Err(self.format_error(format!(
                    "event_index[{event}] = {start} is not monotonic within 0..={n_triggers}"
                )));
            }
            previous = start;
        }

        for (trigger, (&start, &count)) in self
            .digi_hit_index
            .iter()
            .zip(self.n_digi_hits.iter())
            .enumerate()
        {
            if start.checked_add(count).map_or(true, |end| end > self.n_hits) {
                return Err(self.format_error(format!(
                    "trigger {trigger} addresses hits {start}+{count} beyond {} rows",
                    self.n_hits
                )));
            }
        }
        Ok(())
    }

    fn format_error(&self, message: String) -> Error {
        Error::InvalidFormat(format!("branch '{}': {message}", self.name))
    }

    fn n_events(&self) -> usize {
        self.event_index.len()
    }

    fn n_triggers(&self) -> usize {
        self.n_tracks.len()
    }

    fn trigger_range(&self, index: usize) -> Range<usize> {
        let start = self.event_index[index];
        let end = self
            .event_index
            .get(index + 1)
            .copied()
            .unwrap_or_else(|| self.n_triggers());
        start..end
    }

    fn load(&self, index: usize) -> Result<SubsystemEvent> {
        if index >= self.n_events() {
            return Err(wcdigi_core::Error::InvalidEventIndex {
                index,
                n_events: self.n_events(),
            }
            .into());
        }

        let triggers = self
            .trigger_range(index)
            .map(|k| self.load_trigger(k))
            .collect::<Result<Vec<_>>>()?;
        Ok(SubsystemEvent::new(triggers))
    }

    fn load_trigger(&self, k: usize) -> Result<Trigger> {
        let start = self.digi_hit_index[k];
        let end = start + self.n_digi_hits[k];

        let digi_hits = if start == end {
            Vec::new()
        } else {
            let tube_id = self.tube_id.read_slice_1d::<i32, _>(s![start..end])?;
            let mpmt_pmt_id = self.mpmt_pmt_id.read_slice_1d::<i32, _>(s![start..end])?;
            let t = self.t.read_slice_1d::<f64, _>(s![start..end])?;
            let q = self.q.read_slice_1d::<f64, _>(s![start..end])?;
            (0..end - start)
                .map(|i| DigiHit {
                    tube_id: tube_id[i],
                    mpmt_pmt_id: mpmt_pmt_id[i],
                    t: t[i],
                    q: q[i],
                })
                .collect()
        };

        Ok(Trigger {
            n_tracks: self.n_tracks[k],
            sum_q: self.sum_q[k],
            digi_hits,
        })
    }
}

fn hit_dataset(group: &Group, name: &str) -> Result<Dataset> {
    group.dataset(name).map_err(|e| {
        Error::InvalidFormat(format!("missing dataset '{name}' in {}: {e}", group.name()))
    })
}
