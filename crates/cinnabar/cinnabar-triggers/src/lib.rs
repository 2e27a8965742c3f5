//! `cinnabar-triggers`: sequential changepoint detectors for binned
//! light-curves.
//!
//! # Core Components
//!
//! - [`PoissonFocus`]: the FOCuS curve stack, maximizing the Poisson
//!   log-likelihood ratio over every candidate changepoint at once
//! - [`PoissonFocusDes`]: FOCuS fed by a delayed double-exponential-smoothing
//!   background estimate, with a collect/update/test warm-up schedule
//! - [`Bft`]: four independent per-quadrant detectors folded by a majority
//!   vote, with fault masking of quadrants whose background estimate breaks
//! - [`TriggerVariant`]: the four construction records the search
//!   orchestrator picks from (`PF+SES`, `PF+DES`, `BFT+SES`, `BFT+DES`)
//!
//! Detectors are single-threaded state machines: one `step` per bin, no
//! state shared between instances, and no state carried across segment
//! restarts (callers rebuild the detector instead).

#![forbid(unsafe_code)]

pub mod bft;
pub mod des;
pub mod focus;
pub mod variants;

pub use bft::{Bft, BftParams, DETECTOR_NUMBER};
pub use des::{DesParams, PoissonFocusDes};
pub use focus::PoissonFocus;
pub use variants::TriggerVariant;

use cinnabar_types::Changepoint;

/// Everything that can go wrong inside a detector.
///
/// `InvalidParameter` is a construction-time failure and fatal to the
/// enclosing search. `InvalidBackground` is a per-step data failure: the
/// BFT catches it and masks the offending quadrant, a single-channel run
/// aborts its window. `InsufficientQuadrants` means masking has eaten into
/// the majority and the window cannot be searched.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error("background estimate must be positive, got {value}")]
    InvalidBackground { value: f64 },

    #[error("{alive} live quadrants cannot reach a majority of {majority}")]
    InsufficientQuadrants { alive: usize, majority: usize },
}

/// A detector that can be driven over one binned segment.
///
/// `X` is the per-bin sample: a plain count for single-channel detectors,
/// a four-quadrant column for the folded one. `run` consumes bins until a
/// detection or the end of the series; an exhausted run reports
/// `changepoint_bin > triggertime_bin` (see [`Changepoint::triggered`]).
pub trait Trigger<X> {
    fn run(&mut self, xs: &[X]) -> Result<Changepoint, TriggerError>;
}
