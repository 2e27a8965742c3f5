//! Cataloguing data folders and streaming merged observation windows.
//!
//! # Design
//!
//! The catalogue is built once: every folder is asked for its GTI list,
//! folders are ordered by the start of their first GTI, and the result is
//! flattened into `(GTI, folder)` entries. Over a sane dataset both the
//! starts and the ends of the flattened sequence increase strictly.
//!
//! Streaming is pull-based. The iterator owns at most one folder's event
//! table at a time and reads a folder only when a window actually needs
//! it; consecutive windows served by the same folder reuse the cached
//! table. Consecutive GTIs whose boundary gap is within `abs_tol` (or
//! which overlap outright) are collated into one merged window, with the
//! seam de-duplicated by starting the second slice at whichever is later
//! of the previous end and the next start.

use std::iter::Peekable;
use std::path::PathBuf;

use cinnabar_types::{isclose, EventTable, Gti, Met};
use tracing::debug;

use crate::provider::DatasetProvider;

/// Flat, time-ordered sequence of `(GTI, folder)` entries.
pub type Dataset = Vec<(Gti, PathBuf)>;

/// Default GTI-merging tolerance, seconds.
pub const DEFAULT_ABS_TOL: f64 = 0.5;

/// Builds the dataset for a set of data folders.
///
/// Folders are sorted by the start of their first GTI; a folder with no
/// GTIs is dropped. Provider failures abort the catalogue.
pub fn catalog<P: DatasetProvider>(
    provider: &P,
    folders: &[PathBuf],
) -> Result<Dataset, P::Error> {
    let mut listed: Vec<(PathBuf, Vec<Gti>)> = Vec::with_capacity(folders.len());
    for folder in folders {
        let gtis = provider.list_gtis(folder)?;
        if gtis.is_empty() {
            debug!(folder = %folder.display(), "folder lists no GTIs, dropping it");
            continue;
        }
        listed.push((folder.clone(), gtis));
    }
    listed.sort_by(|(_, a), (_, b)| a[0].start.total_cmp(&b[0].start));

    let mut dataset = Dataset::new();
    for (folder, gtis) in listed {
        for gti in gtis {
            dataset.push((gti, folder.clone()));
        }
    }
    Ok(dataset)
}

/// Streams `(GTI, events)` windows off a catalogued dataset, merging
/// adjacent GTIs within `abs_tol`.
pub fn stream<P: DatasetProvider>(
    provider: &P,
    dataset: Dataset,
    abs_tol: f64,
) -> EventStream<'_, P> {
    EventStream {
        provider,
        entries: dataset.into_iter().peekable(),
        cache: None,
        abs_tol,
    }
}

/// Pull iterator over merged observation windows. See [`stream`].
pub struct EventStream<'a, P: DatasetProvider> {
    provider: &'a P,
    entries: Peekable<std::vec::IntoIter<(Gti, PathBuf)>>,
    /// The one folder table held at a time.
    cache: Option<(PathBuf, EventTable)>,
    abs_tol: f64,
}

impl<P: DatasetProvider> EventStream<'_, P> {
    /// Events of `folder` with arrival time in `[start, end)`.
    fn slice(&mut self, folder: &PathBuf, start: Met, end: Met) -> Result<EventTable, P::Error> {
        if self.cache.as_ref().is_none_or(|(cached, _)| cached != folder) {
            let table = self.provider.read_events(folder)?;
            self.cache = Some((folder.clone(), table));
        }
        let (_, table) = self.cache.as_ref().expect("cache was just filled");
        let lo = table.partition_point(|e| e.time < start);
        let hi = table.partition_point(|e| e.time < end);
        Ok(table[lo..hi].to_vec())
    }
}

impl<P: DatasetProvider> Iterator for EventStream<'_, P> {
    type Item = Result<(Gti, EventTable), P::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, folder) = self.entries.next()?;
        let mut span = first;
        let mut events = match self.slice(&folder, span.start, span.end) {
            Ok(events) => events,
            Err(err) => return Some(Err(err)),
        };

        while let Some((next_gti, _)) = self.entries.peek() {
            let touches =
                isclose(next_gti.start, span.end, self.abs_tol) || next_gti.start < span.end;
            if !touches {
                break;
            }
            let (next_gti, next_folder) = self
                .entries
                .next()
                .expect("peek guarantees another entry");
            // De-duplicate the seam: the second slice starts wherever the
            // window already reaches.
            let seam = span.end.max(next_gti.start);
            match self.slice(&next_folder, seam, next_gti.end) {
                Ok(mut tail) => events.append(&mut tail),
                Err(err) => return Some(Err(err)),
            }
            span.end = next_gti.end;
        }

        debug!(
            start = span.start,
            end = span.end,
            events = events.len(),
            "assembled window"
        );
        Some(Ok((span, events)))
    }
}
