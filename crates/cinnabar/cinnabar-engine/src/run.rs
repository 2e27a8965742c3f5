//! Driving a detector over one binned segment.

use cinnabar_triggers::{Trigger, TriggerError};
use cinnabar_types::Changepoint;

/// Runs a detector over `counts`, restarting after every detection.
///
/// The detector is rebuilt from scratch at offset zero and after each
/// trigger, `skip` bins past the trigger time: no state survives a
/// restart. Detections are reported with bin indices relative to the
/// whole segment. `X` is the per-bin sample, a count or a four-quadrant
/// column; `init` is called once per (re)start.
pub fn run_on_segment<X, T, F>(
    init: F,
    counts: &[X],
    skip: usize,
) -> Result<Vec<Changepoint>, TriggerError>
where
    T: Trigger<X>,
    F: Fn() -> Result<T, TriggerError>,
{
    let mut changepoints = Vec::new();
    let mut acc = 0;
    while acc < counts.len() {
        let mut detector = init()?;
        let found = detector.run(&counts[acc..])?;
        if found.triggered() {
            changepoints.push(Changepoint {
                significance: found.significance,
                changepoint_bin: acc + found.changepoint_bin,
                triggertime_bin: acc + found.triggertime_bin,
            });
        }
        // Always at least one bin of progress: with skip = 0 a restarted
        // detector can trigger on the first bin it sees, and the scan
        // must move past it instead of stalling there.
        acc += (found.triggertime_bin + skip).max(1);
    }
    Ok(changepoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinnabar_triggers::{DesParams, PoissonFocusDes};

    /// Detector settings with a short warm-up and the background level
    /// pinned by `s_0`, so trailing zeros keep a positive forecast.
    fn params() -> DesParams {
        DesParams {
            threshold_std: 5.0,
            mu_min: 1.0,
            alpha: 0.1,
            beta: 0.0,
            m: 4,
            sleep: 4,
            t_max: None,
            s_0: Some(10.0),
            b_0: None,
        }
    }

    fn flat(len: usize, level: u32) -> Vec<u32> {
        vec![level; len]
    }

    #[test]
    fn a_single_spike_yields_a_single_changepoint() {
        // One trigger location; the restarted detector sees only zeros
        // and must stay quiet.
        let mut counts = flat(40, 10);
        counts[30] = 100;
        counts.extend(flat(60, 0));
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].triggertime_bin, 30);
        assert_eq!(found[0].changepoint_bin, 30);
        assert!(found[0].significance > 5.0);
    }

    #[test]
    fn restarts_pick_up_well_separated_triggers() {
        let mut counts = flat(120, 10);
        counts[40] = 100;
        counts[80] = 100;
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 10).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].triggertime_bin, 40);
        assert_eq!(found[1].triggertime_bin, 80);
    }

    #[test]
    fn the_skip_interval_blinds_the_detector_after_a_trigger() {
        // The second spike falls inside skip + warm-up of the restarted
        // detector and must go unreported.
        let mut counts = flat(60, 10);
        counts[30] = 100;
        counts[35] = 100;
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].triggertime_bin, 30);
    }

    #[test]
    fn quiet_counts_yield_nothing() {
        let counts = flat(200, 10);
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 10).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_segments_yield_nothing() {
        let counts: Vec<u32> = Vec::new();
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 10).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skip_zero_terminates() {
        // Even with skip = 0 the runner makes progress and ends.
        let counts = flat(30, 10);
        let found = run_on_segment(|| PoissonFocusDes::new(&params()), &counts, 0).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skip_zero_scans_past_an_immediate_trigger() {
        // A warm-up-free detector that fires on any bin over 50. With
        // skip = 0 each restart lands on the trigger bin itself, so the
        // restarted detector fires again at offset zero; the runner must
        // step past it and still reach the second spike instead of
        // abandoning the rest of the segment.
        struct Threshold;
        impl Trigger<u32> for Threshold {
            fn run(&mut self, xs: &[u32]) -> Result<Changepoint, TriggerError> {
                let mut t = 0;
                for (i, &x) in xs.iter().enumerate() {
                    t = i;
                    if x > 50 {
                        return Ok(Changepoint {
                            significance: 6.0,
                            changepoint_bin: t,
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

        let mut counts = flat(10, 10);
        counts[4] = 100;
        counts[5] = 100;
        let found = run_on_segment(|| Ok(Threshold), &counts, 0).unwrap();
        // Bin 4 is reported twice: once by the first pass and once by the
        // detector restarted on it. Bin 5 must still be found after that.
        let trigger_bins: Vec<usize> = found.iter().map(|cp| cp.triggertime_bin).collect();
        assert_eq!(trigger_bins, vec![4, 4, 5]);
    }

    #[test]
    fn construction_failures_abort_the_segment() {
        let mut bad = params();
        bad.m = 0;
        let counts = flat(10, 1);
        let result = run_on_segment(|| PoissonFocusDes::new(&bad), &counts, 10);
        assert!(matches!(
            result,
            Err(TriggerError::InvalidParameter { .. })
        ));
    }
}
