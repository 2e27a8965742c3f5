//! End-to-end searches over synthetic datasets.
//!
//! Event lists are drawn from a deterministic pseudo-Poisson process (a
//! fixed-seed LCG feeding exponential arrival gaps), so every run of
//! these tests sees byte-identical data: no flakiness, no RNG crates.

use std::path::PathBuf;

use cinnabar_config::{AlgorithmParams, SearchConfig};
use cinnabar_data::MemoryDataset;
use cinnabar_engine::Search;
use cinnabar_types::{EventRecord, EventTable, Gti, Met, QuadId};

const SEED: u64 = 0x5EED_CAFE;

/// Uniform draw in `(0, 1]`.
fn next_uniform(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (((*state >> 11) + 1) as f64) / (1u64 << 53) as f64
}

/// Arrival times of a constant-rate Poisson process over `[start, end)`.
fn arrivals(state: &mut u64, rate: f64, start: Met, end: Met) -> Vec<Met> {
    let mut times = Vec::new();
    let mut t = start;
    loop {
        t += -next_uniform(state).ln() / rate;
        if t >= end {
            return times;
        }
        times.push(t);
    }
}

/// An event table over `span`: background at 100 counts/s, plus an
/// anomaly at 300 extra counts/s over `anomaly` when given. Quadrants
/// round-robin so each sees a quarter of the rate.
fn synthetic_table(state: &mut u64, span: Gti, anomaly: Option<Gti>) -> EventTable {
    let mut times = arrivals(state, 100.0, span.start, span.end);
    if let Some(burst) = anomaly {
        times.extend(arrivals(state, 300.0, burst.start, burst.end));
    }
    times.sort_by(f64::total_cmp);
    times
        .iter()
        .enumerate()
        .map(|(i, &time)| EventRecord {
            time,
            energy: 50.0,
            quad_id: QuadId((i % 4) as u8),
        })
        .collect()
}

fn config(majority: Option<usize>) -> SearchConfig {
    SearchConfig {
        binning: 0.1,
        skip: 10,
        energy_lims: (20.0, 300.0),
        log_level: "info".into(),
        data_folders: vec![PathBuf::from("obs")],
        algorithm_params: AlgorithmParams {
            threshold_std: 4.5,
            mu_min: 1.1,
            alpha: 0.005,
            beta: None,
            m: 40,
            sleep: 120,
            t_max: None,
            majority,
            s_0: None,
            b_0: None,
        },
    }
}

fn one_folder(table: EventTable, gtis: Vec<Gti>) -> (MemoryDataset, Vec<PathBuf>) {
    let mut provider = MemoryDataset::new();
    provider.insert("obs", gtis, table);
    (provider, vec![PathBuf::from("obs")])
}

#[test]
fn single_channel_search_finds_the_anomaly() {
    let mut state = SEED;
    let span = Gti::new(0.0, 100.0);
    let table = synthetic_table(&mut state, span, Some(Gti::new(60.0, 70.0)));
    let (provider, folders) = one_folder(table, vec![span]);

    let search = Search::from_config(&config(None)).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 1);
    assert!((events[0].start - 60.0).abs() < 5.0);
    assert!(events[0].bkg_pre_start >= span.start);
    assert!(events[0].bkg_post_end <= span.end);
}

#[test]
fn folded_search_finds_the_anomaly_by_majority() {
    let mut state = SEED;
    let span = Gti::new(0.0, 100.0);
    let table = synthetic_table(&mut state, span, Some(Gti::new(60.0, 70.0)));
    let (provider, folders) = one_folder(table, vec![span]);

    let search = Search::from_config(&config(Some(3))).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 1);
    assert!((events[0].start - 60.0).abs() < 5.0);
}

#[test]
fn a_silent_quadrant_is_masked_and_the_majority_still_triggers() {
    // Quadrant 3 records nothing at all: its background estimate is zero
    // and the folder masks it at the first tested bin. Three live
    // quadrants still reach a majority of three.
    let mut state = SEED;
    let span = Gti::new(0.0, 100.0);
    let table: EventTable = synthetic_table(&mut state, span, Some(Gti::new(60.0, 70.0)))
        .into_iter()
        .filter(|e| e.quad_id != QuadId(3))
        .collect();
    let (provider, folders) = one_folder(table, vec![span]);

    let search = Search::from_config(&config(Some(3))).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 1);
    assert!((events[0].start - 60.0).abs() < 5.0);
}

#[test]
fn an_empty_window_yields_no_events_and_no_error() {
    let span = Gti::new(0.0, 100.0);
    let (provider, folders) = one_folder(Vec::new(), vec![span]);

    let search = Search::from_config(&config(None)).unwrap();
    let events = search.run(&provider, &folders).unwrap();
    assert!(events.is_empty());
}

#[test]
fn events_across_windows_come_back_in_time_order() {
    let mut state = SEED;
    let first = Gti::new(0.0, 100.0);
    let second = Gti::new(200.0, 300.0);
    let mut table = synthetic_table(&mut state, first, Some(Gti::new(60.0, 70.0)));
    table.extend(synthetic_table(
        &mut state,
        second,
        Some(Gti::new(260.0, 270.0)),
    ));
    let (provider, folders) = one_folder(table, vec![first, second]);

    let search = Search::from_config(&config(None)).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 2);
    assert!((events[0].start - 60.0).abs() < 5.0);
    assert!((events[1].start - 260.0).abs() < 5.0);
    assert!(events[0].end <= events[1].start);
}

#[test]
fn a_window_with_a_dead_background_is_skipped_not_fatal() {
    // The first GTI has counts only in its final fifth: the delay buffer
    // averages to zero and the window dies on InvalidBackground. The
    // search logs it, skips it, and still delivers the second window.
    let mut state = SEED;
    let first = Gti::new(0.0, 100.0);
    let second = Gti::new(200.0, 300.0);
    let mut table = arrivals(&mut state, 100.0, 80.0, 100.0)
        .into_iter()
        .map(|time| EventRecord {
            time,
            energy: 50.0,
            quad_id: QuadId(0),
        })
        .collect::<EventTable>();
    table.extend(synthetic_table(
        &mut state,
        second,
        Some(Gti::new(260.0, 270.0)),
    ));
    let (provider, folders) = one_folder(table, vec![first, second]);

    let search = Search::from_config(&config(None)).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 1);
    assert!((events[0].start - 260.0).abs() < 5.0);
}

#[test]
fn too_few_live_quadrants_skip_the_window_not_the_run() {
    // Every quadrant silent at the start of the window: all four get
    // masked at the first tested bin, the majority is unreachable, and
    // the window is abandoned without failing the search.
    let mut state = SEED;
    let first = Gti::new(0.0, 100.0);
    let second = Gti::new(200.0, 300.0);
    let mut table = arrivals(&mut state, 100.0, 80.0, 100.0)
        .into_iter()
        .enumerate()
        .map(|(i, time)| EventRecord {
            time,
            energy: 50.0,
            quad_id: QuadId((i % 4) as u8),
        })
        .collect::<EventTable>();
    table.extend(synthetic_table(
        &mut state,
        second,
        Some(Gti::new(260.0, 270.0)),
    ));
    let (provider, folders) = one_folder(table, vec![first, second]);

    let search = Search::from_config(&config(Some(3))).unwrap();
    let events = search.run(&provider, &folders).unwrap();

    assert_eq!(events.len(), 1);
    assert!((events[0].start - 260.0).abs() < 5.0);
}

#[test]
fn out_of_band_events_are_invisible() {
    // The anomaly sits entirely outside the energy selection.
    let mut state = SEED;
    let span = Gti::new(0.0, 100.0);
    let mut table = synthetic_table(&mut state, span, None);
    for event in arrivals(&mut state, 300.0, 60.0, 70.0) {
        table.push(EventRecord {
            time: event,
            energy: 500.0,
            quad_id: QuadId(0),
        });
    }
    table.sort_by(|a, b| a.time.total_cmp(&b.time));
    let (provider, folders) = one_folder(table, vec![span]);

    let search = Search::from_config(&config(None)).unwrap();
    let events = search.run(&provider, &folders).unwrap();
    assert!(events.is_empty());
}
