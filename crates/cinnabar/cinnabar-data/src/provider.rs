//! The dataset abstraction the search runs against.

use std::cell::Cell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use cinnabar_types::{EventTable, Gti};

/// A source of observation data, one event table and one GTI list per
/// data folder.
///
/// Contract, per folder: `list_gtis` returns a non-empty list sorted by
/// start, with intervals that do not overlap each other; `read_events`
/// returns the full event table sorted by arrival time. Anything that can
/// go wrong reading the underlying storage is the adapter's to report,
/// and propagates through the stream unchanged.
pub trait DatasetProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_gtis(&self, folder: &Path) -> Result<Vec<Gti>, Self::Error>;
    fn read_events(&self, folder: &Path) -> Result<EventTable, Self::Error>;
}

/// An in-memory dataset, used by tests and benchmarks.
///
/// Counts `read_events` calls so the stream's read-once economy is
/// observable.
#[derive(Debug, Default)]
pub struct MemoryDataset {
    folders: HashMap<PathBuf, (Vec<Gti>, EventTable)>,
    reads: Cell<usize>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, folder: impl Into<PathBuf>, gtis: Vec<Gti>, events: EventTable) {
        self.folders.insert(folder.into(), (gtis, events));
    }

    /// Total `read_events` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn folder(&self, folder: &Path) -> io::Result<&(Vec<Gti>, EventTable)> {
        self.folders.get(folder).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such data folder: {}", folder.display()),
            )
        })
    }
}

impl DatasetProvider for MemoryDataset {
    type Error = io::Error;

    fn list_gtis(&self, folder: &Path) -> io::Result<Vec<Gti>> {
        self.folder(folder).map(|(gtis, _)| gtis.clone())
    }

    fn read_events(&self, folder: &Path) -> io::Result<EventTable> {
        self.reads.set(self.reads.get() + 1);
        self.folder(folder).map(|(_, events)| events.clone())
    }
}
