//! Lap timing records

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Cut, Driver, Sector, Vehicle};
use crate::timing::{accumulate, round4};

/// A single timed lap of a participant.
///
/// `time` holds the time reported by the simulator. When it is missing and all
/// three sector times are known, [`Lap::time`] derives the lap time from the
/// sectors instead.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Lap {
    /// Lap number, starting at 1
    pub number: u32,
    /// Running position after this lap
    pub position: Option<u32>,
    /// Reported lap time in seconds
    pub time: Option<f64>,
    /// Sector times in seconds, index 0 is sector 1
    pub sector_times: Vec<f64>,
    /// Elapsed session time when the lap started
    pub elapsed_seconds: Option<f64>,
    /// Whether the participant pitted on this lap
    pub pit_lap: bool,
    /// Vehicle used on this lap
    pub vehicle: Option<Arc<Vehicle>>,
    /// Driver on this lap
    pub driver: Option<Arc<Driver>>,
    /// Track limits violations
    pub cuts: Vec<Cut>,
}

impl Lap {
    /// Create an empty lap with the given number
    pub fn new(number: u32) -> Self {
        Self { number, ..Self::default() }
    }

    /// Set the reported lap time
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the sector times
    pub fn with_sectors(mut self, sector_times: impl Into<Vec<f64>>) -> Self {
        self.sector_times = sector_times.into();
        self
    }

    /// Set the running position
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the elapsed time before the lap started
    pub fn with_elapsed_seconds(mut self, elapsed_seconds: f64) -> Self {
        self.elapsed_seconds = Some(elapsed_seconds);
        self
    }

    /// Mark the lap as a pit lap
    pub fn with_pit_lap(mut self, pit_lap: bool) -> Self {
        self.pit_lap = pit_lap;
        self
    }

    /// Set the vehicle used on the lap
    pub fn with_vehicle(mut self, vehicle: Arc<Vehicle>) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    /// Set the driver of the lap
    pub fn with_driver(mut self, driver: Arc<Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Record a track limits violation
    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.cuts.push(cut);
        self
    }

    /// Effective lap time.
    ///
    /// The reported time when present. Otherwise the rounded sum of exactly
    /// three sector times, unless that sum is zero or negative.
    pub fn time(&self) -> Option<f64> {
        if let Some(time) = self.time {
            return Some(time);
        }

        if self.sector_times.len() != 3 {
            return None;
        }

        let sum = round4(self.sector_times.iter().sum());
        (sum > 0.0).then_some(sum)
    }

    /// Whether the lap has an effective time
    pub fn is_completed(&self) -> bool {
        self.time().is_some()
    }

    /// Whether the lap may count as a best lap.
    ///
    /// Completed laps without track limits violations qualify.
    pub fn is_valid_for_best(&self) -> bool {
        self.is_completed() && self.cuts.is_empty()
    }

    /// Time of one sector, if recorded
    pub fn sector_time(&self, sector: Sector) -> Option<f64> {
        self.sector_times.get(sector.index()).copied()
    }

    /// Time difference to `other`, positive when `other` is slower
    pub fn gap(&self, other: &Lap) -> Option<f64> {
        Some(round4(other.time()? - self.time()?))
    }

    /// Sector time difference to `other`, positive when `other` is slower
    pub fn sector_gap(&self, other: &Lap, sector: Sector) -> Option<f64> {
        Some(round4(other.sector_time(sector)? - self.sector_time(sector)?))
    }

    /// Number of track limits violations
    pub fn number_of_cuts(&self) -> usize {
        self.cuts.len()
    }

    /// Total duration of all cuts that report one
    pub fn cuts_time(&self) -> Option<f64> {
        let mut times = self.cuts.iter().filter_map(|cut| cut.time).peekable();
        times.peek()?;
        Some(times.fold(0.0, accumulate))
    }

    /// Build a lap that is not part of any participant, such as an average
    /// or best possible lap. Synthetic laps carry number 0.
    pub(crate) fn synthetic(sector_times: Vec<f64>) -> Self {
        let time = sector_times.iter().copied().fold(0.0, accumulate);
        Self { time: Some(time), sector_times, ..Self::default() }
    }
}
