use serde::{Deserialize, Serialize};

use crate::gti::Met;

/// Per-step detector output: a significance in standard deviations and the
/// positive offset of the candidate changepoint behind the current step.
///
/// A non-detection is `(0.0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Change {
    pub significance: f64,
    pub offset: usize,
}

impl Change {
    /// The "nothing happened" change.
    pub const NONE: Change = Change {
        significance: 0.0,
        offset: 0,
    };

    #[inline]
    pub fn is_significant(&self) -> bool {
        self.significance > 0.0
    }
}

/// A detection located on a binned segment: the bin where the rate change
/// began and the bin at which the detector crossed threshold.
///
/// By convention a run that exhausts its input without triggering reports
/// `changepoint_bin > triggertime_bin`; callers test [`Changepoint::triggered`]
/// before using the indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Changepoint {
    pub significance: f64,
    pub changepoint_bin: usize,
    pub triggertime_bin: usize,
}

impl Changepoint {
    #[inline]
    pub fn triggered(&self) -> bool {
        self.triggertime_bin >= self.changepoint_bin
    }
}

/// A [`Changepoint`] with bin indices mapped back to MET (left bin edges).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangepointMet {
    pub significance: f64,
    pub changepoint: Met,
    pub triggertime: Met,
}

/// A formatted detection: six interval boundaries enclosing the
/// pre-trigger background window, the source interval, and the
/// post-trigger background window, all absolute MET and clipped to the
/// enclosing GTI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub bkg_pre_start: Met,
    pub bkg_pre_end: Met,
    pub start: Met,
    pub end: Met,
    pub bkg_post_start: Met,
    pub bkg_post_end: Met,
}
