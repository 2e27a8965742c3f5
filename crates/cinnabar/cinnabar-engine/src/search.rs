//! The search orchestrator: configuration in, event list out.

use std::path::PathBuf;

use cinnabar_config::{AlgorithmParams, SearchConfig};
use cinnabar_data::{
    catalog, filter_energy, histogram, histogram_quadrants, stream, DatasetProvider,
    DEFAULT_ABS_TOL,
};
use cinnabar_triggers::{
    Bft, BftParams, DesParams, PoissonFocusDes, TriggerError, TriggerVariant,
};
use cinnabar_types::{Changepoint, ChangepointMet, Event, EventTable, Gti, Met};
use tracing::{info, warn};

use crate::format::{format_event, FormatParams};
use crate::run::run_on_segment;

/// A search run can fail on its own algorithms or on the dataset adapter;
/// adapter errors pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SearchError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("trigger algorithm failed")]
    Trigger(#[from] TriggerError),

    #[error("dataset provider failed")]
    Provider(#[source] E),
}

/// Builds the trigger construction record the configuration asks for:
/// `majority` selects the quadrant-folded detectors, `beta` the
/// double-exponential background.
fn select_variant(params: &AlgorithmParams) -> TriggerVariant {
    let des = DesParams {
        threshold_std: params.threshold_std,
        mu_min: params.mu_min,
        alpha: params.alpha,
        beta: params.beta.unwrap_or(0.0),
        m: params.m,
        sleep: params.sleep,
        t_max: params.t_max,
        s_0: params.s_0,
        b_0: params.b_0,
    };
    match (params.majority, params.beta) {
        (Some(majority), Some(_)) => TriggerVariant::BftDes(BftParams { des, majority }),
        (Some(majority), None) => TriggerVariant::BftSes(BftParams { des, majority }),
        (None, Some(_)) => TriggerVariant::FocusDes(des),
        (None, None) => TriggerVariant::FocusSes(des),
    }
}

/// The configured search, ready to run over any dataset.
#[derive(Clone, Debug)]
pub struct Search {
    binning: f64,
    skip: usize,
    energy_lims: (f64, f64),
    abs_tol: f64,
    variant: TriggerVariant,
}

impl Search {
    /// Binds a validated configuration to a trigger variant. Fails with
    /// `InvalidParameter` on any constraint the detectors reject; such a
    /// failure is fatal, no search object exists afterwards.
    pub fn from_config(config: &SearchConfig) -> Result<Self, TriggerError> {
        let variant = select_variant(&config.algorithm_params);
        variant.validate()?;
        info!(algorithm = variant.label(), "configured search");
        Ok(Self {
            binning: config.binning,
            skip: config.skip,
            energy_lims: config.energy_lims,
            abs_tol: DEFAULT_ABS_TOL,
            variant,
        })
    }

    /// Overrides the GTI-merging tolerance (seconds).
    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    fn format_params(&self) -> FormatParams {
        let (m, alpha) = match &self.variant {
            TriggerVariant::FocusSes(p) | TriggerVariant::FocusDes(p) => (p.m, p.alpha),
            TriggerVariant::BftSes(p) | TriggerVariant::BftDes(p) => (p.des.m, p.des.alpha),
        };
        FormatParams {
            binning: self.binning,
            alpha,
            m,
            skip: self.skip,
        }
    }

    /// Runs the search over every window the dataset yields.
    ///
    /// Windows that fail on their data (broken background estimate, too
    /// many masked quadrants) are logged and contribute no events; the
    /// run carries on with the next window. Events come back ordered by
    /// trigger time across the whole dataset.
    pub fn run<P: DatasetProvider>(
        &self,
        provider: &P,
        folders: &[PathBuf],
    ) -> Result<Vec<Event>, SearchError<P::Error>> {
        let dataset = catalog(provider, folders).map_err(SearchError::Provider)?;
        info!(
            entries = dataset.len(),
            algorithm = self.variant.label(),
            "searching dataset"
        );

        let mut events = Vec::new();
        for window in stream(provider, dataset, self.abs_tol) {
            let (gti, table) = window.map_err(SearchError::Provider)?;
            info!(start = gti.start, end = gti.end, "on window");
            match self.search_window(gti, table) {
                Ok(mut found) => {
                    if !found.is_empty() {
                        info!(transients = found.len(), "found transients");
                    }
                    events.append(&mut found);
                }
                Err(err @ TriggerError::InvalidParameter { .. }) => return Err(err.into()),
                Err(err) => {
                    warn!(
                        start = gti.start,
                        end = gti.end,
                        error = %err,
                        "skipping window"
                    );
                }
            }
        }
        Ok(events)
    }

    /// Searches one merged window: energy filter, binning, segment run,
    /// bins back to MET, formatting. Empty inputs yield empty results.
    fn search_window(&self, gti: Gti, table: EventTable) -> Result<Vec<Event>, TriggerError> {
        let table = filter_energy(table, self.energy_lims);
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let found = match &self.variant {
            TriggerVariant::FocusSes(params) | TriggerVariant::FocusDes(params) => {
                let (counts, bins) = histogram(&table, gti, self.binning);
                let changepoints =
                    run_on_segment(|| PoissonFocusDes::new(params), &counts, self.skip)?;
                map_to_met(&changepoints, &bins)
            }
            TriggerVariant::BftSes(params) | TriggerVariant::BftDes(params) => {
                let (counts, bins) = histogram_quadrants(&table, gti, self.binning);
                let changepoints = run_on_segment(|| Bft::new(params), &counts, self.skip)?;
                map_to_met(&changepoints, &bins)
            }
        };

        let format_params = self.format_params();
        for cp in &found {
            info!(
                triggertime = cp.triggertime,
                offset = cp.triggertime - gti.start,
                significance = cp.significance,
                "transient"
            );
        }
        Ok(found
            .into_iter()
            .map(|cp| format_event(cp, gti, &format_params))
            .collect())
    }
}

/// Maps bin indices to the left edges of their bins.
fn map_to_met(changepoints: &[Changepoint], bins: &[Met]) -> Vec<ChangepointMet> {
    changepoints
        .iter()
        .map(|cp| ChangepointMet {
            significance: cp.significance,
            changepoint: bins[cp.changepoint_bin],
            triggertime: bins[cp.triggertime_bin],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(majority: Option<usize>, beta: Option<f64>) -> AlgorithmParams {
        AlgorithmParams {
            threshold_std: 4.5,
            mu_min: 1.1,
            alpha: 0.005,
            beta,
            m: 40,
            sleep: 120,
            t_max: None,
            majority,
            s_0: None,
            b_0: None,
        }
    }

    #[test]
    fn optional_keys_pick_the_variant() {
        assert_eq!(select_variant(&params(None, None)).label(), "PF+SES");
        assert_eq!(select_variant(&params(None, Some(0.001))).label(), "PF+DES");
        assert_eq!(select_variant(&params(Some(3), None)).label(), "BFT+SES");
        assert_eq!(
            select_variant(&params(Some(3), Some(0.001))).label(),
            "BFT+DES"
        );
    }

    #[test]
    fn met_mapping_uses_left_edges() {
        let bins = vec![0.0, 0.5, 1.0, 1.5, 2.0];
        let cps = [Changepoint {
            significance: 5.0,
            changepoint_bin: 1,
            triggertime_bin: 3,
        }];
        let mets = map_to_met(&cps, &bins);
        assert_eq!(mets[0].changepoint, 0.5);
        assert_eq!(mets[0].triggertime, 1.5);
    }
}
