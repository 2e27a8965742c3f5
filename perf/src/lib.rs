//! Synthetic data for the cinnabar benchmarks.
//!
//! Everything is seeded and reproducible: an LCG drives exponential
//! arrival gaps and Poisson bin counts, so benchmark inputs are identical
//! across runs and machines.

use cinnabar_types::{EventRecord, EventTable, Gti, Met, QuadId};

/// Uniform draw in `(0, 1]`.
pub fn uniform(state: &mut u64) -> f64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (((*state >> 11) + 1) as f64) / (1u64 << 53) as f64
}

/// One Poisson draw with mean `lambda` (Knuth's product method; fine for
/// the small per-bin means light-curves carry).
pub fn poisson(state: &mut u64, lambda: f64) -> u32 {
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        p *= uniform(state);
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

/// `n` Poisson bin counts at a constant rate per bin.
pub fn poisson_counts(state: &mut u64, rate_per_bin: f64, n: usize) -> Vec<u32> {
    (0..n).map(|_| poisson(state, rate_per_bin)).collect()
}

/// Arrival times of a constant-rate process over `[start, end)`.
pub fn arrival_times(state: &mut u64, rate: f64, start: Met, end: Met) -> Vec<Met> {
    let mut times = Vec::new();
    let mut t = start;
    loop {
        t += -uniform(state).ln() / rate;
        if t >= end {
            return times;
        }
        times.push(t);
    }
}

/// A sorted event table over `span` at `rate` counts/s, quadrants
/// round-robin.
pub fn synthetic_table(state: &mut u64, span: Gti, rate: f64) -> EventTable {
    arrival_times(state, rate, span.start, span.end)
        .iter()
        .enumerate()
        .map(|(i, &time)| EventRecord {
            time,
            energy: 50.0,
            quad_id: QuadId((i % 4) as u8),
        })
        .collect()
}
