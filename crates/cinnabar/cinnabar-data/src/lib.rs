//! `cinnabar-data`: everything between the dataset adapter and the
//! trigger algorithms.
//!
//! # Core Components
//!
//! - [`DatasetProvider`]: the abstract source of GTIs and event tables
//! - [`catalog()`]: orders a set of data folders into a flat, time-sorted
//!   dataset of `(GTI, folder)` entries
//! - [`stream()`]: a pull iterator collating adjacent GTIs within a
//!   tolerance into merged windows, reading each folder at most once
//! - [`histogram()`] / [`histogram_quadrants()`]: fixed-width light-curve
//!   binning over a GTI
//! - [`filter_energy()`]: half-open energy band selection

#![forbid(unsafe_code)]

pub mod histogram;
pub mod provider;
pub mod stream;

pub use histogram::{filter_energy, histogram, histogram_quadrants};
pub use provider::{DatasetProvider, MemoryDataset};
pub use stream::{catalog, stream, Dataset, EventStream, DEFAULT_ABS_TOL};
