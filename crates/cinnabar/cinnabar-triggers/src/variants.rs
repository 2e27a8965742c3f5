//! The four trigger configurations the search can run.
//!
//! A variant is a construction record, not a detector: the orchestrator
//! builds one from its configuration, validates it once (construction
//! failures are fatal), then instantiates fresh detectors from it for
//! every segment restart. SES variants are DES records with the slope
//! gain pinned to zero; they keep their own label because the distinction
//! matters in logs and reports.

use crate::bft::{Bft, BftParams};
use crate::des::{DesParams, PoissonFocusDes};
use crate::TriggerError;

/// Tagged sum of the four detector construction records.
#[derive(Clone, Debug)]
pub enum TriggerVariant {
    /// Single channel, single-exponential background (`beta = 0`).
    FocusSes(DesParams),
    /// Single channel, double-exponential background.
    FocusDes(DesParams),
    /// Four folded quadrants, single-exponential background.
    BftSes(BftParams),
    /// Four folded quadrants, double-exponential background.
    BftDes(BftParams),
}

impl TriggerVariant {
    /// Short human label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            TriggerVariant::FocusSes(_) => "PF+SES",
            TriggerVariant::FocusDes(_) => "PF+DES",
            TriggerVariant::BftSes(_) => "BFT+SES",
            TriggerVariant::BftDes(_) => "BFT+DES",
        }
    }

    /// Whether this variant consumes per-quadrant light-curves.
    pub fn folds_quadrants(&self) -> bool {
        matches!(self, TriggerVariant::BftSes(_) | TriggerVariant::BftDes(_))
    }

    /// Builds and drops one detector, surfacing any `InvalidParameter`
    /// before data is touched.
    pub fn validate(&self) -> Result<(), TriggerError> {
        match self {
            TriggerVariant::FocusSes(p) | TriggerVariant::FocusDes(p) => {
                PoissonFocusDes::new(p).map(drop)
            }
            TriggerVariant::BftSes(p) | TriggerVariant::BftDes(p) => Bft::new(p).map(drop),
        }
    }
}
