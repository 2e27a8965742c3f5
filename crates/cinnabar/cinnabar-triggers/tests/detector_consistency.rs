//! Cross-detector consistency checks.
//!
//! The detectors here are layers over the same FOCuS core, so several
//! configurations are forced to agree exactly:
//!
//! - a PF+DES detector with a frozen background (`alpha = 0`, `s_0`
//!   pinned) must reproduce bare FOCuS driven with that background
//!   explicitly;
//! - a BFT with four identical quadrant streams and `majority = 1` must
//!   trigger on the same bin as the single-channel detector on one of
//!   those streams.

use cinnabar_triggers::{
    Bft, BftParams, DesParams, PoissonFocus, PoissonFocusDes, Trigger,
};

/// Deterministic count series: quiet in 10..=13 per bin, one strong
/// spike. The quiet mean sits just under the frozen background level the
/// tests use, so nothing accumulates before the spike.
fn spiky_counts(len: usize, spike_at: usize) -> Vec<u32> {
    let mut state = 99u64;
    let mut counts: Vec<u32> = (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            10 + (state >> 62) as u32
        })
        .collect();
    counts[spike_at] = 120;
    counts
}

fn frozen_background_params(level: f64) -> DesParams {
    DesParams {
        threshold_std: 5.0,
        mu_min: 1.0,
        alpha: 0.0,
        beta: 0.0,
        m: 8,
        sleep: 0,
        t_max: None,
        s_0: Some(level),
        b_0: None,
    }
}

#[test]
fn frozen_des_matches_bare_focus() {
    let level = 12.0;
    let counts = spiky_counts(200, 140);
    let params = frozen_background_params(level);
    let warmup = params.m + params.sleep;

    let des_result = PoissonFocusDes::new(&params)
        .unwrap()
        .run(&counts)
        .unwrap();

    // Bare FOCuS over the tested suffix with the same flat background.
    let tested: Vec<f64> = counts[warmup..].iter().map(|&x| f64::from(x)).collect();
    let background = vec![level; tested.len()];
    let focus_result = PoissonFocus::new(params.threshold_std, params.mu_min)
        .unwrap()
        .run(&tested, &background)
        .unwrap();

    assert!(des_result.triggered());
    assert!(focus_result.triggered());
    assert_eq!(des_result.triggertime_bin, focus_result.triggertime_bin + warmup);
    assert_eq!(
        des_result.changepoint_bin,
        focus_result.changepoint_bin + warmup
    );
    assert!((des_result.significance - focus_result.significance).abs() < 1e-9);
}

#[test]
fn unanimous_quadrants_match_the_single_channel() {
    let counts = spiky_counts(200, 140);
    let params = frozen_background_params(12.0);

    let single = PoissonFocusDes::new(&params)
        .unwrap()
        .run(&counts)
        .unwrap();

    let columns: Vec<[u32; 4]> = counts.iter().map(|&x| [x; 4]).collect();
    let folded = Bft::new(&BftParams {
        des: params,
        majority: 1,
    })
    .unwrap()
    .run(&columns)
    .unwrap();

    assert!(folded.triggered());
    assert_eq!(folded.triggertime_bin, single.triggertime_bin);
    assert_eq!(folded.changepoint_bin, single.changepoint_bin);
    assert_eq!(folded.significance, single.significance);
}

#[test]
fn significance_is_the_root_of_twice_the_llr() {
    // One spike against a unit background: the reported significance must
    // equal sqrt(2 * (x ln x - (x - 1))) for the spike count x.
    let x: f64 = 40.0;
    let expected = (2.0 * (x * x.ln() - (x - 1.0))).sqrt();

    let mut focus = PoissonFocus::new(3.0, 1.0).unwrap();
    let xs = [1.0, 1.0, x];
    let bs = [1.0, 1.0, 1.0];
    let result = focus.run(&xs, &bs).unwrap();
    assert!(result.triggered());
    assert!((result.significance - expected).abs() < 1e-12);
}

#[test]
fn quiet_streams_never_report_a_negative_maximum() {
    let counts = spiky_counts(500, 499);
    let params = frozen_background_params(12.0);
    let mut detector = PoissonFocusDes::new(&params).unwrap();
    for &x in &counts[..499] {
        let change = detector.step(f64::from(x)).unwrap();
        assert!(change.significance >= 0.0);
    }
}
