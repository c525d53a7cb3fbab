//! Analysis configuration
//!
//! Defaults follow common results-sheet conventions: laps slower than 107% of
//! the session best are bad laps, and consistency ignores laps more than 21
//! seconds off the participant's best.
//!
//! ```rust
//! use lapstats::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_yaml_str("bad_lap_percent: 105").unwrap();
//! assert_eq!(config.bad_lap_percent, 105.0);
//! assert_eq!(config.consistency_window_seconds, 21.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StatsError};

/// Tunables for the statistics that accept parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Laps slower than this percentage of the session best are bad laps
    pub bad_lap_percent: f64,
    /// Laps at or beyond best lap + this many seconds are left out of consistency
    pub consistency_window_seconds: f64,
    /// Leave each participant's first lap out of consistency
    pub ignore_first_lap: bool,
    /// Leave pit lane sectors out of average laps
    pub exclude_pitstop_sectors: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bad_lap_percent: 107.0,
            consistency_window_seconds: 21.0,
            ignore_first_lap: true,
            exclude_pitstop_sectors: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AnalysisConfig = if yaml.trim().is_empty() {
            AnalysisConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;

        debug!(
            bad_lap_percent = config.bad_lap_percent,
            consistency_window_seconds = config.consistency_window_seconds,
            ignore_first_lap = config.ignore_first_lap,
            exclude_pitstop_sectors = config.exclude_pitstop_sectors,
            "Loaded analysis config"
        );
        Ok(config)
    }

    /// Check values are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.bad_lap_percent.is_finite() && self.bad_lap_percent > 0.0) {
            return Err(StatsError::config(
                "bad_lap_percent",
                format!("must be a positive number, got {}", self.bad_lap_percent),
            ));
        }

        if !(self.consistency_window_seconds.is_finite() && self.consistency_window_seconds > 0.0) {
            return Err(StatsError::config(
                "consistency_window_seconds",
                format!("must be a positive number, got {}", self.consistency_window_seconds),
            ));
        }

        Ok(())
    }
}
