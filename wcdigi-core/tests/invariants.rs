#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]
use approx::assert_relative_eq;
use wcdigi_core::{
    run_pipeline, DigiHit, GeometryInfo, MemoryEventSource, MemoryTables, Subsystem,
    SubsystemEvent, Trigger,
};

// Deterministic event set: event `e` has `e % 3` triggers per subsystem and
// trigger `k` holds `(e + k) % 4` hits.
fn generate_source(n_events: usize) -> MemoryEventSource {
    let mut source = MemoryEventSource::new(GeometryInfo::new(1000, 200));
    for e in 0..n_events {
        let make_view = |subsystem: Subsystem| {
            let triggers = (0..e % 3)
                .map(|k| {
                    let hits = (0..(e + k) % 4)
                        .map(|h| {
                            let id = (e * 100 + k * 10 + h) as i32;
                            let q = 0.5 + ((e + h) % 5) as f64 * 0.75;
                            let t = 900.0 + h as f64;
                            DigiHit::new(id, t, q).with_mpmt_pmt_id(id % 19)
                        })
                        .collect::<Vec<_>>();
                    // Reported sums deliberately disagree with the hit sums.
                    let offset = if subsystem == Subsystem::Inner { 1.0 } else { 0.5 };
                    let sum_q = hits.iter().map(|hit| hit.q).sum::<f64>() + offset;
                    Trigger::new(sum_q, hits).with_n_tracks(k as i32)
                })
                .collect();
            SubsystemEvent::new(triggers)
        };
        source.push_event(make_view(Subsystem::Inner), make_view(Subsystem::Outer));
    }
    source
}

#[test]
fn test_hit_columns_match_trigger_counts() {
    let source = generate_source(12);
    let mut run_source = source.clone();
    let mut tables = MemoryTables::new();
    run_pipeline(&mut run_source, &mut tables).unwrap();

    assert_eq!(tables.rows().len(), 12);
    for (e, rows) in tables.rows().iter().enumerate() {
        for subsystem in Subsystem::ALL {
            let row = rows.hit_row(subsystem);
            assert_eq!(row.event, e);
            assert_eq!(row.hits.tube_id.len(), row.hits.time.len());
            assert_eq!(row.hits.time.len(), row.hits.charge.len());
            let expected = source.event(subsystem, e).unwrap().n_digi_hits();
            assert_eq!(row.hits.len(), expected);
        }
    }
}

#[test]
fn test_summary_agrees_with_hit_rows() {
    let mut source = generate_source(15);
    let mut tables = MemoryTables::new();
    let stats = run_pipeline(&mut source, &mut tables).unwrap();

    let mut inner_hits = 0;
    let mut outer_hits = 0;
    for rows in tables.rows() {
        let summary = rows.summary;
        assert_eq!(
            summary.total_digi_hit as usize,
            rows.inner.hits.len() + rows.outer.hits.len()
        );
        assert_relative_eq!(
            summary.total_digi_q,
            rows.inner.hits.charge_sum() + rows.outer.hits.charge_sum(),
            epsilon = 1e-9
        );
        assert_relative_eq!(summary.max_digi_q_inner, rows.inner.hits.charge_max());
        assert_relative_eq!(summary.max_digi_q_outer, rows.outer.hits.charge_max());
        inner_hits += rows.inner.hits.len();
        outer_hits += rows.outer.hits.len();
    }
    assert_eq!(stats.inner_hits, inner_hits);
    assert_eq!(stats.outer_hits, outer_hits);
}

#[test]
fn test_reported_charge_is_independent() {
    let mut source = generate_source(6);
    let mut tables = MemoryTables::new();
    run_pipeline(&mut source, &mut tables).unwrap();

    for (e, rows) in tables.rows().iter().enumerate() {
        let n_triggers = (e % 3) as f64;
        // Each inner trigger reports 1.0 more and each outer trigger 0.5 more.
        assert_relative_eq!(
            rows.summary.total_q,
            rows.summary.total_digi_q + 1.5 * n_triggers,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_outer_rows_use_relative_ids() {
    let mut source = generate_source(5);
    let mut tables = MemoryTables::new();
    run_pipeline(&mut source, &mut tables).unwrap();

    for rows in tables.rows() {
        assert!(rows.outer.hits.tube_id.iter().all(|&id| id < 19));
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let source = generate_source(9);

    let mut first = MemoryTables::new();
    run_pipeline(&mut source.clone(), &mut first).unwrap();
    let mut second = MemoryTables::new();
    run_pipeline(&mut source.clone(), &mut second).unwrap();

    assert_eq!(first.rows(), second.rows());
}
