//! Participants and their laps

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use super::vehicle::push_distinct;
use super::{Driver, Lap, Vehicle};
use crate::timing::{accumulate, round2};

/// How a participant's session ended
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum FinishStatus {
    /// Took the flag
    Normal,
    /// Did not finish
    Dnf,
    /// Disqualified
    Dq,
    /// No finish status reported
    #[default]
    None,
}

/// A competitor in a session.
///
/// Laps are kept in the order they were driven, which is not necessarily
/// ordered by lap number. The participant caches its computed total time;
/// [`Participant::laps_mut`] and cloning both drop that cached value.
#[derive(Default, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Participant {
    /// Final position
    pub position: Option<u32>,
    /// Starting grid position
    pub grid_position: Option<u32>,
    /// Final position within the vehicle class
    pub class_position: Option<u32>,
    /// Reported number of pit stops, overrides counting pit laps
    pub pit_stops: Option<u32>,
    /// How the session ended for this participant
    pub finish_status: FinishStatus,
    /// Reported total time, overrides summing lap times
    pub total_time: Option<f64>,
    /// Declared vehicle
    pub vehicle: Option<Arc<Vehicle>>,
    /// Drivers sharing this entry
    pub drivers: Vec<Arc<Driver>>,
    laps: Vec<Lap>,
    #[serde(skip)]
    #[cfg_attr(feature = "tauri", specta(skip))]
    computed_total_time: OnceLock<f64>,
}

impl Clone for Participant {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            grid_position: self.grid_position,
            class_position: self.class_position,
            pit_stops: self.pit_stops,
            finish_status: self.finish_status,
            total_time: self.total_time,
            vehicle: self.vehicle.clone(),
            drivers: self.drivers.clone(),
            laps: self.laps.clone(),
            computed_total_time: OnceLock::new(),
        }
    }
}

impl Participant {
    /// Create a participant without laps
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a participant driving the given laps
    pub fn with_laps(laps: impl IntoIterator<Item = Lap>) -> Self {
        Self { laps: laps.into_iter().collect(), ..Self::default() }
    }

    /// Set the declared vehicle
    pub fn with_vehicle(mut self, vehicle: Arc<Vehicle>) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    /// Laps in driving order
    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Mutable access to the laps; drops the cached total time
    pub fn laps_mut(&mut self) -> &mut Vec<Lap> {
        self.computed_total_time = OnceLock::new();
        &mut self.laps
    }

    /// Append a lap
    pub fn push_lap(&mut self, lap: Lap) {
        self.laps_mut().push(lap);
    }

    /// Lap with the given number
    pub fn lap(&self, number: u32) -> Option<&Lap> {
        self.laps.iter().find(|lap| lap.number == number)
    }

    /// Last lap driven
    pub fn last_lap(&self) -> Option<&Lap> {
        self.laps.last()
    }

    /// Number of laps, completed or not
    pub fn number_of_laps(&self) -> usize {
        self.laps.len()
    }

    /// Total time: the reported value, or the sum of completed lap times
    /// rounded after every addition.
    pub fn total_time(&self) -> f64 {
        if let Some(total) = self.total_time {
            return total;
        }

        *self.computed_total_time.get_or_init(|| {
            self.laps.iter().filter_map(Lap::time).fold(0.0, accumulate)
        })
    }

    /// Pit stops: the reported count, or the number of pit laps
    pub fn pit_stops(&self) -> u32 {
        self.pit_stops.unwrap_or_else(|| self.laps.iter().filter(|lap| lap.pit_lap).count() as u32)
    }

    /// Distinct lap vehicles in first-seen order, or the declared vehicle
    pub fn vehicles(&self) -> Vec<Arc<Vehicle>> {
        let mut vehicles = Vec::new();
        for vehicle in self.laps.iter().filter_map(|lap| lap.vehicle.as_ref()) {
            push_distinct(&mut vehicles, vehicle);
        }

        if vehicles.is_empty() {
            vehicles.extend(self.vehicle.iter().cloned());
        }
        vehicles
    }

    /// Declared vehicle, or the first vehicle seen on a lap
    pub fn vehicle(&self) -> Option<&Arc<Vehicle>> {
        self.vehicle.as_ref().or_else(|| self.laps.iter().find_map(|lap| lap.vehicle.as_ref()))
    }

    /// Places gained from the grid, negative when places were lost
    pub fn position_difference(&self) -> Option<i64> {
        Some(i64::from(self.grid_position?) - i64::from(self.position?))
    }

    /// Share of laps driven by `driver`, in percent
    pub fn driver_percentage(&self, driver: &Arc<Driver>) -> Option<f64> {
        if self.laps.is_empty() {
            return None;
        }

        let driven = self
            .laps
            .iter()
            .filter(|lap| lap.driver.as_ref().is_some_and(|d| Arc::ptr_eq(d, driver)))
            .count();
        Some(round2(driven as f64 / self.laps.len() as f64 * 100.0))
    }
}
