//! `cinnabar-types`: shared records for the transient search pipeline.
//!
//! Everything downstream crates exchange lives here: mission time and good
//! time intervals, photon event records, and the detection records produced
//! by the trigger algorithms (changes, changepoints, formatted events).
//! No logic beyond small accessors; the crates that own the algorithms own
//! the behavior.

#![forbid(unsafe_code)]

pub mod detection;
pub mod gti;
pub mod photon;

pub use detection::{Change, Changepoint, ChangepointMet, Event};
pub use gti::{Gti, Met, isclose};
pub use photon::{EventRecord, EventTable, QuadId};
