//! Memoized lap and session statistics for motorsport results.
//!
//! lapstats turns the laps of a session (as read from a simulator results
//! file) into the numbers a results sheet shows: best laps overall and per
//! sector, best possible laps, consistency, gaps to lapped cars, laps led and
//! bad laps.
//!
//! # Features
//!
//! - **Immutable facts**: [`Session`], [`Participant`] and [`Lap`] hold data only
//! - **Memoized queries**: every statistic is computed once per [`SessionStats`]
//! - **Thread safe**: engines are `Send + Sync` and compute each query once
//!   under concurrent access
//! - **Fixed-point rounding**: times accumulate at 4 decimals like the source
//!   data
//!
//! # Quick Start
//!
//! ```rust
//! use lapstats::{Lap, Participant, Sector, Session, SessionStats, SessionType};
//!
//! let session = Session::new(
//!     SessionType::Race,
//!     vec![Participant::with_laps([
//!         Lap::new(1).with_sectors([30.0, 40.0, 50.0]),
//!         Lap::new(2).with_sectors([29.0, 39.0, 49.0]),
//!         Lap::new(3),
//!     ])],
//! );
//!
//! let stats = SessionStats::new(session);
//! let driver = stats.participant(0).unwrap();
//!
//! assert_eq!(driver.best_lap().map(|lap| lap.number), Some(2));
//! assert_eq!(driver.number_of_completed_laps(), 2);
//! assert_eq!(driver.best_possible_lap().and_then(|lap| lap.time()), Some(117.0));
//! assert_eq!(stats.best_lap_by_sector(Sector::One).map(|lap| lap.number), Some(2));
//! ```

// Facts and shared helpers
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod timing;
pub mod types;

// Query layer
pub mod aggregate;
pub mod cache;
pub mod config;
mod engine;
pub mod ordering;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use cache::CacheStats;
pub use config::AnalysisConfig;
pub use engine::{LapRef, ParticipantStats, SessionStats};
