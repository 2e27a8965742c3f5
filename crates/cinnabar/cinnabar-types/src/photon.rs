use serde::{Deserialize, Serialize};

use crate::gti::Met;

/// Identifies one of the four independent detector quadrants.
///
/// Newtype over `u8`; valid values are `0..4`. The id is assigned by the
/// instrument and stable across a dataset.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct QuadId(pub u8);

impl QuadId {
    /// Number of quadrants in the instrument.
    pub const COUNT: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single photon event as delivered by the dataset adapter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Arrival time (MET seconds).
    pub time: Met,
    /// Reconstructed energy (keV).
    pub energy: f64,
    /// Quadrant that recorded the event.
    pub quad_id: QuadId,
}

/// An event list, sorted by `time` ascending. Produced by the adapter for
/// one data folder, sliced by the stream assembler, and dropped once the
/// window it belongs to has been searched.
pub type EventTable = Vec<EventRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_id_is_a_plain_index() {
        assert_eq!(QuadId(3).index(), 3);
        assert_eq!(QuadId::COUNT, 4);
    }

    #[test]
    fn event_record_is_small() {
        // One table row should stay within three words so big event lists
        // slice and copy cheaply.
        assert!(std::mem::size_of::<EventRecord>() <= 24);
    }
}
