//! Poisson-FOCuS: functional online CUSUM over a stack of candidate
//! changepoint curves.
//!
//! Each [`Curve`] carries the sufficient statistics of one hypothetical
//! changepoint: counts `x` and background `b` accumulated since it, its
//! start index `t`, and a stored partial maximum `m`. The stack keeps two
//! invariants:
//!
//! - the bottom element is a sentinel with `x = +inf`, which no curve can
//!   dominate, so pruning always terminates;
//! - every adjacent pair is ordered by dominance with respect to the
//!   accumulator on top, so the maximization walk can stop early.
//!
//! Per update the stack is pruned, the accumulator extended, and the global
//! log-likelihood-ratio maximum refreshed. Amortized cost per bin is O(1).

use cinnabar_types::Changepoint;

use crate::TriggerError;

/// Sufficient statistics of a single candidate changepoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Curve {
    /// Accumulated counts since this changepoint.
    x: f64,
    /// Accumulated background expectation since this changepoint.
    b: f64,
    /// Update index at which this curve was started.
    t: usize,
    /// Partial maximum carried for the early-stopping walk.
    m: f64,
}

impl Curve {
    /// Stack bottom. Infinite counts mean it dominates everything.
    const SENTINEL: Curve = Curve {
        x: f64::INFINITY,
        b: 0.0,
        t: 0,
        m: 0.0,
    };

    /// A fresh, empty accumulator.
    const ZERO: Curve = Curve {
        x: 0.0,
        b: 0.0,
        t: 0,
        m: 0.0,
    };
}

/// Maximum of `curve`'s LLR evaluated against the accumulator.
/// Requires the excess counts to exceed the excess background.
fn ymax(curve: &Curve, acc: &Curve) -> f64 {
    let x = acc.x - curve.x;
    let b = acc.b - curve.b;
    debug_assert!(x > b, "ymax needs an excess of counts over background");
    x * (x / b).ln() - (x - b)
}

/// Whether `p` dominates `q` with respect to the accumulator: the signed
/// area test of the FOCuS pruning rule.
fn dominates(p: &Curve, q: &Curve, acc: &Curve) -> bool {
    (acc.x - p.x) * (acc.b - q.b) - (acc.x - q.x) * (acc.b - p.b) > 0.0
}

/// Stack capacity heuristic. Curves admitted per segment shrink as
/// `mu_min` grows; with `mu_min = 1` the stack can grow with the log of
/// the segment length, so reserve for long segments outright.
fn curve_capacity(mu_min: f64) -> usize {
    if mu_min > 1.0 {
        ((20.0 / (mu_min - 1.0)).ceil() as usize + 2).min(256)
    } else {
        64
    }
}

/// The FOCuS detector core.
///
/// Drive it with [`PoissonFocus::update`] once per bin, passing the
/// observed count and a positive background forecast. After each update,
/// [`PoissonFocus::global_max`] is the maximum LLR over all candidate
/// changepoints (zero when below threshold) and
/// [`PoissonFocus::time_offset`] how many updates back the best candidate
/// lies.
#[derive(Clone, Debug)]
pub struct PoissonFocus {
    ab_crit: f64,
    threshold_llr: f64,
    global_max: f64,
    time_offset: usize,
    curves: Vec<Curve>,
}

impl PoissonFocus {
    /// Builds a detector triggering at `threshold_std` standard deviations.
    ///
    /// `mu_min` kills changepoints with intensity ratio below it, keeping
    /// the stack short at a small sensitivity cost; `1.0` disables the
    /// pruning.
    pub fn new(threshold_std: f64, mu_min: f64) -> Result<Self, TriggerError> {
        if !(threshold_std > 0.0) {
            return Err(TriggerError::InvalidParameter {
                name: "threshold_std",
                reason: "threshold must be positive",
            });
        }
        if !(mu_min >= 1.0) {
            return Err(TriggerError::InvalidParameter {
                name: "mu_min",
                reason: "must not be smaller than 1",
            });
        }
        let ab_crit = if mu_min == 1.0 {
            1.0
        } else {
            (mu_min - 1.0) / mu_min.ln()
        };
        let mut curves = Vec::with_capacity(curve_capacity(mu_min));
        curves.push(Curve::SENTINEL);
        curves.push(Curve::ZERO);
        Ok(Self {
            ab_crit,
            threshold_llr: threshold_std * threshold_std / 2.0,
            global_max: 0.0,
            time_offset: 0,
            curves,
        })
    }

    /// Maximum LLR seen at the last update; `0.0` while under threshold.
    #[inline]
    pub fn global_max(&self) -> f64 {
        self.global_max
    }

    /// Updates-ago position of the best candidate changepoint.
    #[inline]
    pub fn time_offset(&self) -> usize {
        self.time_offset
    }

    /// The LLR trigger level, `threshold_std^2 / 2`.
    #[inline]
    pub fn threshold_llr(&self) -> f64 {
        self.threshold_llr
    }

    fn pop(&mut self) -> Curve {
        debug_assert!(self.curves.len() > 1, "curve stack keeps its sentinel");
        self.curves.pop().unwrap_or(Curve::SENTINEL)
    }

    fn top(&self) -> &Curve {
        self.curves.last().unwrap_or(&Curve::SENTINEL)
    }

    /// One FOCuS step: absorb a count `x` against background forecast `b`.
    ///
    /// Fails with [`TriggerError::InvalidBackground`] when `b` is not a
    /// positive number. A non-finite or negative count is rejected with the
    /// same error, since it would corrupt the dominance pruning; the BFT
    /// relies on that to mask a quadrant whose stream went bad.
    pub fn update(&mut self, x: f64, b: f64) -> Result<(), TriggerError> {
        if !(b > 0.0) || !b.is_finite() {
            return Err(TriggerError::InvalidBackground { value: b });
        }
        if !(x >= 0.0) || !x.is_finite() {
            return Err(TriggerError::InvalidBackground { value: x });
        }
        self.global_max = 0.0;
        self.time_offset = 0;

        let mut p = self.pop();
        let mut acc = Curve {
            x: p.x + x,
            b: p.b + b,
            t: p.t + 1,
            m: p.m,
        };
        while !dominates(&p, self.top(), &acc) {
            p = self.pop();
        }

        if acc.x - p.x > self.ab_crit * (acc.b - p.b) {
            acc.m = p.m + ymax(&p, &acc);
            self.maximize(p, acc);
            self.curves.push(p);
            self.curves.push(acc);
        } else {
            // Every curve is dominated: drop them all and start over from
            // an empty accumulator above the sentinel.
            self.curves.truncate(1);
            self.curves.push(Curve::ZERO);
        }
        Ok(())
    }

    /// Walks the stack top-down refreshing partial maxima, recording the
    /// global maximum as soon as one clears the threshold. The walk stops
    /// once the carried maxima cannot reach the threshold anymore; the
    /// bottom real curve carries `m = 0`, so it terminates before the
    /// sentinel.
    fn maximize(&mut self, p: Curve, acc: Curve) {
        let mut p = p;
        let mut m = acc.m - p.m;
        let mut i = self.curves.len();
        while m + p.m >= self.threshold_llr {
            if m >= self.threshold_llr {
                self.global_max = m;
                self.time_offset = acc.t - p.t;
                break;
            }
            i -= 1;
            p = self.curves[i];
            m = ymax(&p, &acc);
        }
    }

    /// Drives the detector over a whole segment with an explicit
    /// background series. Returns at the first threshold crossing.
    pub fn run(&mut self, xs: &[f64], bs: &[f64]) -> Result<Changepoint, TriggerError> {
        let mut t = 0;
        for (i, (&x, &b)) in xs.iter().zip(bs.iter()).enumerate() {
            t = i;
            self.update(x, b)?;
            if self.global_max > self.threshold_llr {
                return Ok(Changepoint {
                    significance: (2.0 * self.global_max).sqrt(),
                    changepoint_bin: t + 1 - self.time_offset,
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
