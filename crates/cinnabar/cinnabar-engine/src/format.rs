//! Turning detections into events with background windows.

use cinnabar_types::{ChangepointMet, Event, Gti};

/// Durations entering the event layout, all derived from the search
/// configuration: background windows last `binning / alpha` seconds, the
/// pre window ends `binning * m` seconds before the trigger (the stretch
/// the delayed estimate already used), the post window starts
/// `binning * skip` seconds after it (the stretch the detector skips
/// before restarting).
#[derive(Clone, Copy, Debug)]
pub struct FormatParams {
    pub binning: f64,
    pub alpha: f64,
    pub m: usize,
    pub skip: usize,
}

impl FormatParams {
    fn background_duration(&self) -> f64 {
        self.binning / self.alpha
    }

    fn pre_gap(&self) -> f64 {
        self.binning * self.m as f64
    }

    fn post_gap(&self) -> f64 {
        self.binning * self.skip as f64
    }
}

/// Lays six absolute-MET boundaries around a detection, clipped to the
/// enclosing GTI.
///
/// The pre-background window keeps its end anchored when the left clamp
/// fires; the post-background window slides left of the GTI end when the
/// right clamp fires, but never before the trigger. The event interval
/// runs from the changepoint to the start of the post window, so every
/// boundary stays inside the GTI. For a window assembled from several
/// merged GTIs the clamps act on the outer boundaries only: internal
/// seams are no boundary at all.
pub fn format_event(result: ChangepointMet, gti: Gti, params: &FormatParams) -> Event {
    let duration = params.background_duration();

    let bkg_pre_end = result.triggertime - params.pre_gap();
    let bkg_pre_start = (bkg_pre_end - duration).max(gti.start);

    let (bkg_post_start, bkg_post_end) = if result.triggertime + params.post_gap() + duration
        > gti.end
    {
        let end = gti.end;
        ((end - duration).max(result.triggertime), end)
    } else {
        let start = result.triggertime + params.post_gap();
        (start, start + duration)
    };

    Event {
        bkg_pre_start,
        bkg_pre_end,
        start: result.changepoint,
        end: bkg_post_start,
        bkg_post_start,
        bkg_post_end,
    }
}
