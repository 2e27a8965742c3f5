//! Light-curve binning and energy selection.

use cinnabar_types::{EventRecord, EventTable, Gti, Met, QuadId};

/// Number of bins covering `gti` at width `binning`: enough that the last
/// bin edge lands at or beyond the end of the interval.
fn bin_count(gti: Gti, binning: f64) -> usize {
    (gti.length() / binning) as usize + 1
}

fn bin_edges(gti: Gti, binning: f64, n: usize) -> Vec<Met> {
    (0..=n).map(|i| gti.start + i as f64 * binning).collect()
}

/// Bins event arrival times over `[gti.start, gti.end)` into fixed-width
/// bins.
///
/// Returns `(counts, bins)` with `counts.len() == n` and
/// `bins.len() == n + 1`; the last edge is greater-equal than `gti.end`.
/// Events outside the binned range are ignored.
pub fn histogram(events: &[EventRecord], gti: Gti, binning: f64) -> (Vec<u32>, Vec<Met>) {
    let n = bin_count(gti, binning);
    let mut counts = vec![0u32; n];
    for event in events {
        if event.time < gti.start {
            continue;
        }
        let index = ((event.time - gti.start) / binning) as usize;
        if index < n {
            counts[index] += 1;
        }
    }
    (counts, bin_edges(gti, binning, n))
}

/// Quadrant-aware binning: one four-quadrant column per bin.
///
/// Every column always carries all four quadrants; quadrants with no
/// events in the table contribute zero rows.
pub fn histogram_quadrants(
    events: &[EventRecord],
    gti: Gti,
    binning: f64,
) -> (Vec<[u32; QuadId::COUNT]>, Vec<Met>) {
    let n = bin_count(gti, binning);
    let mut counts = vec![[0u32; QuadId::COUNT]; n];
    for event in events {
        if event.time < gti.start {
            continue;
        }
        let index = ((event.time - gti.start) / binning) as usize;
        let quadrant = event.quad_id.index();
        debug_assert!(quadrant < QuadId::COUNT, "quadrant ids are 0..4");
        if index < n && quadrant < QuadId::COUNT {
            counts[index][quadrant] += 1;
        }
    }
    (counts, bin_edges(gti, binning, n))
}

/// Keeps events with `lo <= energy < hi`.
pub fn filter_energy(mut events: EventTable, energy_lims: (f64, f64)) -> EventTable {
    let (lo, hi) = energy_lims;
    events.retain(|e| lo <= e.energy && e.energy < hi);
    events
}
