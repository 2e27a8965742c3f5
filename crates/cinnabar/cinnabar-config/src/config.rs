use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level search configuration, loaded from a TOML file.
#[derive(Deserialize, Debug, Clone)]
pub struct SearchConfig {
    /// Light-curve bin width, seconds.
    pub binning: f64,
    /// Bins skipped before the detector restarts after a trigger.
    pub skip: usize,
    /// Events with `lo <= energy < hi` (keV) are kept.
    #[serde(default = "defaults::energy_lims")]
    pub energy_lims: (f64, f64),
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Data folders to search, in any order.
    #[serde(default)]
    pub data_folders: Vec<PathBuf>,
    pub algorithm_params: AlgorithmParams,
}

/// Trigger algorithm parameters. The presence of the optional keys selects
/// the variant: `majority` folds four quadrant detectors, `beta` enables
/// the slope term of the background estimate.
#[derive(Deserialize, Debug, Clone)]
pub struct AlgorithmParams {
    /// Trigger threshold, standard deviations.
    pub threshold_std: f64,
    pub mu_min: f64,
    /// Background smoothing gain on the level term.
    pub alpha: f64,
    /// Background smoothing gain on the slope term.
    pub beta: Option<f64>,
    /// Background estimate delay, bins.
    pub m: usize,
    /// Warm-up dead time, bins.
    pub sleep: usize,
    /// Maximum trusted changepoint offset, bins.
    pub t_max: Option<usize>,
    /// Quadrants over threshold required to trigger.
    pub majority: Option<usize>,
    /// Overrides the automatic initialization of the background level.
    pub s_0: Option<f64>,
    /// Overrides the automatic initialization of the background slope.
    pub b_0: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{key}': {reason}")]
    Validate { key: &'static str, reason: String },
}

mod defaults {
    pub fn energy_lims() -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validate {
        key,
        reason: reason.into(),
    }
}

impl SearchConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: SearchConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks on everything the search consumes directly. The trigger
    /// crate re-validates its own parameters at construction; this pass
    /// rejects a bad file before any data is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.binning > 0.0) {
            return Err(invalid("binning", "bin width must be positive"));
        }
        let (lo, hi) = self.energy_lims;
        if !(lo < hi) {
            return Err(invalid("energy_lims", "lower limit must be below upper"));
        }
        self.algorithm_params.validate()
    }
}

impl AlgorithmParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold_std > 0.0) {
            return Err(invalid("threshold_std", "threshold must be positive"));
        }
        if !(self.mu_min >= 1.0) {
            return Err(invalid("mu_min", "must not be smaller than 1"));
        }
        if !(self.alpha > 0.0) {
            return Err(invalid("alpha", "level gain must be positive"));
        }
        if let Some(beta) = self.beta
            && !(beta >= 0.0)
        {
            return Err(invalid("beta", "slope gain must be non-negative"));
        }
        if self.m < 1 {
            return Err(invalid("m", "delay must be at least one bin"));
        }
        if let Some(t_max) = self.t_max
            && t_max < 1
        {
            return Err(invalid("t_max", "must be at least one bin"));
        }
        if let Some(majority) = self.majority
            && !(1..=4).contains(&majority)
        {
            return Err(invalid("majority", "must be between 1 and 4"));
        }
        if let Some(s_0) = self.s_0
            && !(s_0 >= 0.0)
        {
            return Err(invalid("s_0", "initial level must be non-negative"));
        }
        if let Some(b_0) = self.b_0
            && !(b_0 >= 0.0)
        {
            return Err(invalid("b_0", "initial slope must be non-negative"));
        }
        Ok(())
    }
}
