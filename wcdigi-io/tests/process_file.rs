//! End-to-end extraction from HDF5 event stores.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]

use approx::assert_relative_eq;
use tempfile::tempdir;
use wcdigi_core::{
    run_pipeline, DigiHit, EventSource, GeometryInfo, MemoryEventSource, MemoryTables, Subsystem,
    SubsystemEvent, Trigger,
};
use wcdigi_io::{
    inspect_event_store, process_file, read_output, write_event_store, Error, InputLayout,
    StoreConfig,
};

fn generate_source(n_events: usize) -> MemoryEventSource {
    let mut source = MemoryEventSource::new(GeometryInfo::new(11_146, 2_014));
    for e in 0..n_events {
        let subsystem_event = |offset: f64| {
            let triggers = (0..e % 3)
                .map(|k| {
                    let hits = (0..(e + k) % 4)
                        .map(|h| {
                            let id = (e * 100 + k * 10 + h) as i32;
                            DigiHit::new(id, h as f64 * 2.0, 0.5 + h as f64)
                                .with_mpmt_pmt_id(id % 19)
                        })
                        .collect::<Vec<_>>();
                    let sum: f64 = hits.iter().map(|hit| hit.q).sum();
                    Trigger::new(sum + offset, hits).with_n_tracks(k as i32)
                })
                .collect();
            SubsystemEvent::new(triggers)
        };
        source.push_event(subsystem_event(1.0), subsystem_event(0.5));
    }
    source
}

#[test]
fn test_file_output_matches_in_memory_run() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let memory = generate_source(12);
    write_event_store(&input, &InputLayout::default(), &memory).unwrap();

    let stats = process_file(&input, &output, &StoreConfig::default()).unwrap();

    let mut expected_source = memory.clone();
    let mut expected = MemoryTables::new();
    let expected_stats = run_pipeline(&mut expected_source, &mut expected).unwrap();
    assert_eq!(stats, expected_stats);

    let tables = read_output(&output).unwrap();
    assert_eq!(tables.rows(), expected.rows());
    assert_eq!(tables.geometry(), GeometryInfo::new(11_146, 2_014));
    assert_eq!(tables.provenance.source_files, vec![input.display().to_string()]);
}

#[test]
fn test_reference_event() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let memory = MemoryEventSource::new(GeometryInfo::new(11_146, 2_014)).with_event(
        SubsystemEvent::new(vec![Trigger::new(
            4.75,
            vec![DigiHit::new(10, 5.0, 1.5), DigiHit::new(11, 6.0, 3.0)],
        )]),
        SubsystemEvent::new(vec![Trigger::new(0.0, Vec::new())]),
    );
    write_event_store(&input, &InputLayout::default(), &memory).unwrap();
    process_file(&input, &output, &StoreConfig::default()).unwrap();

    let tables = read_output(&output).unwrap();
    assert_eq!(tables.n_events(), 1);
    assert_relative_eq!(tables.summary.total_digi_q[0], 4.5);
    assert_relative_eq!(tables.summary.max_digi_q_20[0], 3.0);
    assert_relative_eq!(tables.summary.max_digi_q_3[0], 0.0);
    assert_eq!(tables.summary.total_digi_hit[0], 2);
    assert_relative_eq!(tables.summary.total_q[0], 4.75);

    let inner = tables.tree_20.row(0);
    assert_eq!(inner.event, 0);
    assert_eq!(inner.hits.tube_id, vec![10, 11]);
    assert_eq!(inner.hits.time, vec![5.0, 6.0]);
    assert_eq!(inner.hits.charge, vec![1.5, 3.0]);
    assert!(tables.tree_3.row(0).hits.is_empty());
}

#[test]
fn test_zero_events() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let memory = MemoryEventSource::new(GeometryInfo::new(5, 6));
    write_event_store(&input, &InputLayout::default(), &memory).unwrap();

    let stats = process_file(&input, &output, &StoreConfig::default()).unwrap();
    assert_eq!(stats.n_events, 0);

    let tables = read_output(&output).unwrap();
    assert_eq!(tables.n_events(), 0);
    assert!(tables.tree_20.is_empty());
    assert!(tables.tree_3.is_empty());
}

#[test]
fn test_rerun_gives_same_tables() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    write_event_store(&input, &InputLayout::default(), &generate_source(7)).unwrap();

    process_file(&input, &output, &StoreConfig::default()).unwrap();
    let first = read_output(&output).unwrap();
    process_file(&input, &output, &StoreConfig::default()).unwrap();
    let second = read_output(&output).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_outer_table_uses_relative_ids() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let memory = generate_source(9);
    write_event_store(&input, &InputLayout::default(), &memory).unwrap();
    process_file(&input, &output, &StoreConfig::default()).unwrap();

    let tables = read_output(&output).unwrap();
    for e in 0..memory.n_events() {
        let expected: Vec<i32> = memory
            .event(Subsystem::Outer, e)
            .unwrap()
            .triggers
            .iter()
            .flat_map(|t| t.digi_hits.iter().map(|h| h.mpmt_pmt_id))
            .collect();
        assert_eq!(tables.tree_3.row(e).hits.tube_id, expected);
    }
}

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("Hits.h5");
    let err = process_file(dir.path().join("nope.h5"), &output, &StoreConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!output.exists());
}

#[test]
fn test_empty_geometry_table() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let layout = InputLayout::default();
    write_event_store(&input, &layout, &generate_source(2)).unwrap();
    {
        let file = hdf5::File::open_rw(&input).unwrap();
        let group = file.group("wcsimGeoT/wcsimrootgeom").unwrap();
        group.unlink("wc_num_pmt").unwrap();
        group
            .new_dataset::<i32>()
            .shape((0, 2))
            .create("wc_num_pmt")
            .unwrap();
    }

    let err = process_file(&input, &output, &StoreConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::CoreError(wcdigi_core::Error::MissingGeometry)
    ));
    assert!(!output.exists());
}

#[test]
fn test_renamed_branch_via_config() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wcsim.h5");
    let output = dir.path().join("Hits.h5");
    let config =
        StoreConfig::from_json(r#"{ "input": { "outer_branch": "wcsimrootevent_OD" } }"#)
            .unwrap();
    write_event_store(&input, &config.input, &generate_source(4)).unwrap();

    let info = inspect_event_store(&input, &config.input).unwrap();
    assert_eq!(info.n_events, 4);

    let stats = process_file(&input, &output, &config).unwrap();
    assert_eq!(stats.n_events, 4);
    assert!(process_file(&input, &output, &StoreConfig::default()).is_err());
}
