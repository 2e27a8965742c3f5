//! Poisson-FOCuS with an automatic background estimate via double
//! exponential smoothing.
//!
//! The estimator forecasts `lambda(t) = s_t + m * b_t` from a smoothed
//! level `s` and slope `b`, fed with counts delayed by `m` bins so a
//! rising transient does not contaminate its own background. Before it can
//! test anything, the detector walks a warm-up schedule driven by a
//! countdown starting at `m + sleep`:
//!
//! - **collect** (`m` bins): fill the delay buffer, then initialize the
//!   smoothing state (from `s_0`/`b_0` when given, else from the buffer
//!   mean and a flat slope);
//! - **update** (`sleep` bins): run the estimator on delayed counts
//!   without testing, letting it settle;
//! - **test** (steady state): refresh the forecast, feed FOCuS, and apply
//!   the `t_max` quality control to any crossing.

use std::collections::VecDeque;

use cinnabar_types::{Change, Changepoint};
use tracing::debug;

use crate::focus::PoissonFocus;
use crate::{Trigger, TriggerError};

/// Construction record for a [`PoissonFocusDes`] detector.
#[derive(Clone, Debug)]
pub struct DesParams {
    /// Trigger threshold, standard deviations.
    pub threshold_std: f64,
    /// FOCuS pruning intensity ratio, `>= 1`.
    pub mu_min: f64,
    /// Smoothing gain on the level term.
    pub alpha: f64,
    /// Smoothing gain on the slope term. Zero degrades the estimator to
    /// single exponential smoothing.
    pub beta: f64,
    /// Background delay and forecast length, bins.
    pub m: usize,
    /// Warm-up dead time after the buffer fills, bins.
    pub sleep: usize,
    /// Quality control: crossings whose changepoint lies this many or more
    /// bins back are suppressed. Disabled when `None`.
    pub t_max: Option<usize>,
    /// Optional override for the initial level.
    pub s_0: Option<f64>,
    /// Optional override for the initial slope.
    pub b_0: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Schedule {
    Collect,
    Update,
    Test,
}

/// Single-channel changepoint detector: FOCuS over a DES background.
#[derive(Clone, Debug)]
pub struct PoissonFocusDes {
    focus: PoissonFocus,
    /// Delay line of the last `m` observed counts.
    buffer: VecDeque<f64>,
    s_t: f64,
    b_t: f64,
    lambda_t: f64,
    alpha: f64,
    beta: f64,
    m: usize,
    sleep: usize,
    t_max: Option<usize>,
    s_0: Option<f64>,
    b_0: Option<f64>,
    /// Warm-up countdown, from `m + sleep` down to zero.
    countdown: usize,
    schedule: Schedule,
}

impl PoissonFocusDes {
    pub fn new(params: &DesParams) -> Result<Self, TriggerError> {
        let focus = PoissonFocus::new(params.threshold_std, params.mu_min)?;
        if !(params.alpha >= 0.0) {
            return Err(TriggerError::InvalidParameter {
                name: "alpha",
                reason: "level gain must be non-negative",
            });
        }
        if !(params.beta >= 0.0) {
            return Err(TriggerError::InvalidParameter {
                name: "beta",
                reason: "slope gain must be non-negative",
            });
        }
        if params.m < 1 {
            return Err(TriggerError::InvalidParameter {
                name: "m",
                reason: "delay must be at least one bin",
            });
        }
        if let Some(t_max) = params.t_max
            && t_max < 1
        {
            return Err(TriggerError::InvalidParameter {
                name: "t_max",
                reason: "must be at least one bin",
            });
        }
        if let Some(s_0) = params.s_0
            && !(s_0 >= 0.0)
        {
            return Err(TriggerError::InvalidParameter {
                name: "s_0",
                reason: "initial level must be non-negative",
            });
        }
        if let Some(b_0) = params.b_0
            && !(b_0 >= 0.0)
        {
            return Err(TriggerError::InvalidParameter {
                name: "b_0",
                reason: "initial slope must be non-negative",
            });
        }
        Ok(Self {
            focus,
            buffer: VecDeque::with_capacity(params.m),
            s_t: 0.0,
            b_t: 0.0,
            lambda_t: 0.0,
            alpha: params.alpha,
            beta: params.beta,
            m: params.m,
            sleep: params.sleep,
            t_max: params.t_max,
            s_0: params.s_0,
            b_0: params.b_0,
            countdown: params.m + params.sleep,
            schedule: Schedule::Collect,
        })
    }

    /// The current background forecast. Meaningful once warm-up is over.
    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda_t
    }

    /// Seeds the smoothing state once the delay buffer holds `m` counts.
    fn initialize(&mut self) {
        self.s_t = match self.s_0 {
            Some(s_0) => s_0,
            None => self.buffer.iter().sum::<f64>() / self.m as f64,
        };
        self.b_t = self.b_0.unwrap_or(0.0);
        self.lambda_t = self.s_t;
        debug!(level = self.s_t, slope = self.b_t, "background initialized");
    }

    /// One smoothing step on a delayed count; returns the new forecast.
    fn smooth(&mut self, x: f64) -> f64 {
        let s_prev = self.s_t;
        let b_prev = self.b_t;
        self.s_t = self.alpha * x + (1.0 - self.alpha) * (s_prev + b_prev);
        self.b_t = self.beta * (self.s_t - s_prev) + (1.0 - self.beta) * b_prev;
        self.s_t + self.m as f64 * self.b_t
    }

    fn pop_delayed(&mut self) -> f64 {
        self.buffer
            .pop_front()
            .expect("delay buffer holds m counts after warm-up")
    }

    /// Suppresses crossings whose changepoint is too old to trust given
    /// the delayed background estimate.
    fn quality_control(&self) -> Change {
        let global_max = self.focus.global_max();
        let offset = self.focus.time_offset();
        if global_max > 0.0 && self.t_max.is_none_or(|t_max| offset < t_max) {
            Change {
                significance: (2.0 * global_max).sqrt(),
                offset,
            }
        } else {
            Change::NONE
        }
    }

    /// Feeds one bin count through the warm-up schedule and, once in the
    /// test phase, through FOCuS.
    pub fn step(&mut self, x: f64) -> Result<Change, TriggerError> {
        match self.schedule {
            Schedule::Collect => {
                self.buffer.push_back(x);
                self.countdown -= 1;
                if self.countdown == self.sleep {
                    self.initialize();
                    self.schedule = if self.sleep > 0 {
                        Schedule::Update
                    } else {
                        Schedule::Test
                    };
                }
                Ok(Change::NONE)
            }
            Schedule::Update => {
                let delayed = self.pop_delayed();
                self.lambda_t = self.smooth(delayed);
                self.buffer.push_back(x);
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.schedule = Schedule::Test;
                }
                Ok(Change::NONE)
            }
            Schedule::Test => {
                let delayed = self.pop_delayed();
                self.lambda_t = self.smooth(delayed);
                self.buffer.push_back(x);
                if !(self.lambda_t > 0.0) {
                    return Err(TriggerError::InvalidBackground {
                        value: self.lambda_t,
                    });
                }
                self.focus.update(x, self.lambda_t)?;
                Ok(self.quality_control())
            }
        }
    }
}

impl Trigger<u32> for PoissonFocusDes {
    fn run(&mut self, xs: &[u32]) -> Result<Changepoint, TriggerError> {
        let mut t = 0;
        for (i, &x) in xs.iter().enumerate() {
            t = i;
            let change = self.step(x as f64)?;
            if change.is_significant() {
                return Ok(Changepoint {
                    significance: change.significance,
                    changepoint_bin: (t + 1).saturating_sub(change.offset),
                    triggertime_bin: t,
                });
            }
        }
        Ok(Changepoint {
            significance: 0.0,
            changepoint_bin: t + 1,
            triggertime_bin: t,
        })
    }
}
