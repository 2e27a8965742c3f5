//! Plain-text dataset adapter.
//!
//! Each data folder holds two whitespace-separated files:
//!
//! - `gti.txt`: one interval per line, `start end`
//! - `events.txt`: one event per line, `time energy quadid`, sorted by
//!   time ascending
//!
//! This keeps the binary usable without any instrument-format support;
//! richer adapters implement [`DatasetProvider`] elsewhere.

use std::io;
use std::path::Path;

use cinnabar_data::DatasetProvider;
use cinnabar_types::{EventRecord, EventTable, Gti, QuadId};

pub struct TextDataset;

fn bad_line(path: &Path, line_no: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}:{}: malformed line", path.display(), line_no + 1),
    )
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

impl DatasetProvider for TextDataset {
    type Error = io::Error;

    fn list_gtis(&self, folder: &Path) -> io::Result<Vec<Gti>> {
        let path = folder.join("gti.txt");
        let mut gtis = Vec::new();
        for (line_no, line) in read_lines(&path)?.iter().enumerate() {
            let mut fields = line.split_whitespace();
            let gti = fields
                .next()
                .zip(fields.next())
                .and_then(|(start, end)| {
                    Some(Gti::new(start.parse().ok()?, end.parse().ok()?))
                })
                .ok_or_else(|| bad_line(&path, line_no))?;
            gtis.push(gti);
        }
        Ok(gtis)
    }

    fn read_events(&self, folder: &Path) -> io::Result<EventTable> {
        let path = folder.join("events.txt");
        let mut events = EventTable::new();
        for (line_no, line) in read_lines(&path)?.iter().enumerate() {
            let mut fields = line.split_whitespace();
            let record = fields
                .next()
                .zip(fields.next())
                .zip(fields.next())
                .and_then(|((time, energy), quad)| {
                    Some(EventRecord {
                        time: time.parse().ok()?,
                        energy: energy.parse().ok()?,
                        quad_id: QuadId(quad.parse().ok()?),
                    })
                })
                .ok_or_else(|| bad_line(&path, line_no))?;
            events.push(record);
        }
        Ok(events)
    }
}
