//! The BFT folder: four independent PF+DES detectors, one per quadrant,
//! folded by a majority vote.
//!
//! Each quadrant slot is a two-state machine, `Alive` or `Dead`. A step
//! that fails with a recoverable detector error masks its quadrant: the
//! slot goes `Dead`, reports no change from then on, and the remaining
//! quadrants carry the search. The window is only abandoned when fewer
//! live quadrants remain than the majority requires.

use cinnabar_types::{Change, Changepoint};
use tracing::warn;

use crate::des::{DesParams, PoissonFocusDes};
use crate::{Trigger, TriggerError};

/// Quadrants in the instrument; the folder always runs exactly this many
/// detectors.
pub const DETECTOR_NUMBER: usize = 4;

/// Construction record for a [`Bft`] folder.
#[derive(Clone, Debug)]
pub struct BftParams {
    /// Parameters shared by the four per-quadrant detectors.
    pub des: DesParams,
    /// Quadrants over threshold required to trigger, `1..=4`.
    pub majority: usize,
}

#[derive(Clone, Debug)]
enum QuadrantSlot {
    Alive(PoissonFocusDes),
    Dead,
}

impl QuadrantSlot {
    fn is_alive(&self) -> bool {
        matches!(self, QuadrantSlot::Alive(_))
    }
}

/// Four-quadrant majority-vote changepoint detector.
#[derive(Clone, Debug)]
pub struct Bft {
    quadrants: [QuadrantSlot; DETECTOR_NUMBER],
    majority: usize,
}

impl Bft {
    pub fn new(params: &BftParams) -> Result<Self, TriggerError> {
        if !(1..=DETECTOR_NUMBER).contains(&params.majority) {
            return Err(TriggerError::InvalidParameter {
                name: "majority",
                reason: "must be between 1 and 4",
            });
        }
        // One detector per quadrant, all from the same record. Building
        // the first validates the shared parameters for all four.
        let first = PoissonFocusDes::new(&params.des)?;
        let quadrants = [
            QuadrantSlot::Alive(first.clone()),
            QuadrantSlot::Alive(first.clone()),
            QuadrantSlot::Alive(first.clone()),
            QuadrantSlot::Alive(first),
        ];
        Ok(Self {
            quadrants,
            majority: params.majority,
        })
    }

    /// Live (unmasked) quadrants.
    pub fn alive(&self) -> usize {
        self.quadrants.iter().filter(|s| s.is_alive()).count()
    }

    /// Advances all four detectors by one bin.
    ///
    /// A quadrant whose detector fails on its data is masked and reports
    /// [`Change::NONE`] from this step on. Fails with
    /// [`TriggerError::InsufficientQuadrants`] once masking leaves fewer
    /// live quadrants than the majority needs.
    pub fn step(
        &mut self,
        xs: [f64; DETECTOR_NUMBER],
    ) -> Result<[Change; DETECTOR_NUMBER], TriggerError> {
        let mut changes = [Change::NONE; DETECTOR_NUMBER];
        for (quadrant, (slot, &x)) in self.quadrants.iter_mut().zip(xs.iter()).enumerate() {
            if let QuadrantSlot::Alive(detector) = slot {
                match detector.step(x) {
                    Ok(change) => changes[quadrant] = change,
                    Err(
                        TriggerError::InvalidBackground { .. }
                        | TriggerError::InvalidParameter { .. },
                    ) => {
                        warn!(quadrant, "masking quadrant with broken background estimate");
                        *slot = QuadrantSlot::Dead;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        let alive = self.alive();
        if alive < self.majority {
            return Err(TriggerError::InsufficientQuadrants {
                alive,
                majority: self.majority,
            });
        }
        Ok(changes)
    }

    /// Folds the per-quadrant changes of step `t` into one changepoint:
    /// the strongest significance, the earliest candidate changepoint,
    /// and the current step as trigger time.
    fn fold(t: usize, changes: &[Change; DETECTOR_NUMBER]) -> Changepoint {
        let mut significance = 0.0f64;
        let mut changepoint_bin = t + 1;
        for change in changes.iter().filter(|c| c.is_significant()) {
            significance = significance.max(change.significance);
            changepoint_bin = changepoint_bin.min((t + 1).saturating_sub(change.offset));
        }
        Changepoint {
            significance,
            changepoint_bin,
            triggertime_bin: t,
        }
    }
}

impl Trigger<[u32; DETECTOR_NUMBER]> for Bft {
    fn run(&mut self, xs: &[[u32; DETECTOR_NUMBER]]) -> Result<Changepoint, TriggerError> {
        let mut t = 0;
        for (i, column) in xs.iter().enumerate() {
            t = i;
            let changes = self.step(column.map(|x| x as f64))?;
            let over = changes.iter().filter(|c| c.is_significant()).count();
            if over >= self.majority {
                return Ok(Self::fold(t, &changes));
            }
        }
        Ok(Changepoint {
            significance: 0.0,
            changepoint_bin: t + 1,
            triggertime_bin: t,
        })
    }
}
