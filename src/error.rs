//! Error types for session statistics.
//!
//! Queries over a session never fail: missing data is reported as `None` or an
//! empty sequence. The errors in this module cover the edges of the crate,
//! where configuration is loaded and where a reader hands over a lap graph
//! that should be checked before it is analysed.
//!
//! ## Error Categories
//!
//! - **Config Errors**: YAML configuration that cannot be parsed or holds
//!   out-of-range values
//! - **Validation Errors**: lap graphs that break the data model (lap number 0,
//!   duplicate lap numbers, too many sector times)
//! - **Sector Errors**: sector numbers outside `1..=3`
//!
//! ```rust
//! use lapstats::StatsError;
//!
//! let error = StatsError::invalid_sector(4);
//! assert!(error.is_data_error());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use thiserror::Error;

/// Result type alias for statistics operations.
pub type Result<T, E = StatsError> = std::result::Result<T, E>;

/// Main error type for statistics operations.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Session validation failed: {reason}")]
    Validation { reason: String },

    #[error("Sector {sector} does not exist, sectors are numbered 1 to 3")]
    InvalidSector { sector: u8 },
}

impl StatsError {
    /// Returns whether the error comes from the supplied data rather than from
    /// configuration.
    pub fn is_data_error(&self) -> bool {
        match self {
            StatsError::Config { .. } => false,
            StatsError::Validation { .. } => true,
            StatsError::InvalidSector { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StatsError::Config { .. } => vec![
                "Check the YAML syntax of the configuration",
                "Use positive values for percentages and time windows",
                "Remove unknown keys from the configuration",
            ],
            StatsError::Validation { .. } => vec![
                "Check the reader attaches laps in the order they occurred",
                "Make sure lap numbers start at 1 and are unique per participant",
                "Drop sector times beyond the third sector",
            ],
            StatsError::InvalidSector { .. } => {
                vec!["Use sector numbers 1, 2 or 3", "Map split indexes to sectors before querying"]
            }
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config(context: impl Into<String>, details: impl Into<String>) -> Self {
        StatsError::Config { context: context.into(), details: details.into() }
    }

    /// Helper constructor for validation errors.
    pub fn validation(reason: impl Into<String>) -> Self {
        StatsError::Validation { reason: reason.into() }
    }

    /// Helper constructor for invalid sector numbers.
    pub fn invalid_sector(sector: u8) -> Self {
        StatsError::InvalidSector { sector }
    }
}

impl From<serde_yaml_ng::Error> for StatsError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StatsError::Config { context: "YAML deserialization".to_string(), details: err.to_string() }
    }
}
