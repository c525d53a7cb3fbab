//! Sessions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::vehicle::intern;
use super::{Driver, Lap, Participant, Vehicle};
use crate::error::{Result, StatsError};

/// Kind of session
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Practice,
    Qualify,
    Warmup,
    Race,
}

/// Location of a lap inside a session: participant index and lap index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapId {
    /// Index into [`Session::participants`]
    pub participant: usize,
    /// Index into [`Participant::laps`]
    pub lap: usize,
}

impl LapId {
    /// Create a lap id
    pub fn new(participant: usize, lap: usize) -> Self {
        Self { participant, lap }
    }
}

/// A practice, qualifying, warmup or race session.
///
/// Participants are kept in the order the reader supplied, which is the
/// finishing order.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct Session {
    /// Session name
    pub name: Option<String>,
    /// Session kind
    pub session_type: SessionType,
    /// Scheduled number of laps
    pub max_laps: Option<u32>,
    /// Scheduled duration in minutes
    pub max_minutes: Option<u32>,
    /// Participants in finishing order
    pub participants: Vec<Participant>,
}

impl Session {
    /// Create a session of the given kind with its participants
    pub fn new(session_type: SessionType, participants: Vec<Participant>) -> Self {
        Self { session_type, participants, ..Self::default() }
    }

    /// Resolve a lap id
    pub fn lap(&self, id: LapId) -> Option<&Lap> {
        self.participants.get(id.participant)?.laps().get(id.lap)
    }

    /// Copy of this session holding only the given participants
    pub fn with_participants(&self, participants: Vec<Participant>) -> Self {
        Self {
            name: self.name.clone(),
            session_type: self.session_type,
            max_laps: self.max_laps,
            max_minutes: self.max_minutes,
            participants,
        }
    }

    /// Share one handle between all equal vehicles of the session.
    ///
    /// Vehicles are told apart by identity, while deserialization allocates a
    /// new vehicle for every participant and lap that names one. Run this after
    /// reading a session so a car driven for several laps counts once.
    pub fn intern_vehicles(&mut self) {
        let mut table: Vec<Arc<Vehicle>> = Vec::new();
        for participant in &mut self.participants {
            if let Some(vehicle) = participant.vehicle.as_mut() {
                intern(&mut table, vehicle);
            }
            for lap in participant.laps_mut() {
                if let Some(vehicle) = lap.vehicle.as_mut() {
                    intern(&mut table, vehicle);
                }
            }
        }
        debug!(vehicles = table.len(), "Interned session vehicles");
    }

    /// Share one handle between all equal drivers of the session
    pub fn intern_drivers(&mut self) {
        let mut table: Vec<Arc<Driver>> = Vec::new();
        for participant in &mut self.participants {
            for driver in &mut participant.drivers {
                intern(&mut table, driver);
            }
            for lap in participant.laps_mut() {
                if let Some(driver) = lap.driver.as_mut() {
                    intern(&mut table, driver);
                }
            }
        }
        debug!(drivers = table.len(), "Interned session drivers");
    }

    /// Check the lap graph against the data model.
    ///
    /// Rejects lap number 0, duplicate lap numbers within a participant, more
    /// than three sector times and position 0.
    pub fn validate(&self) -> Result<()> {
        for (index, participant) in self.participants.iter().enumerate() {
            if participant.position == Some(0) {
                return Err(reject(format!("participant {index} has position 0")));
            }

            let mut seen = HashSet::new();
            for lap in participant.laps() {
                if lap.number == 0 {
                    return Err(reject(format!("participant {index} has a lap numbered 0")));
                }
                if !seen.insert(lap.number) {
                    return Err(reject(format!(
                        "participant {index} has lap {} more than once",
                        lap.number
                    )));
                }
                if lap.sector_times.len() > 3 {
                    return Err(reject(format!(
                        "participant {index} lap {} has {} sector times",
                        lap.number,
                        lap.sector_times.len()
                    )));
                }
                if lap.position == Some(0) {
                    return Err(reject(format!(
                        "participant {index} lap {} has position 0",
                        lap.number
                    )));
                }
            }
        }

        Ok(())
    }
}

fn reject(reason: String) -> StatsError {
    warn!(%reason, "Rejecting session");
    StatsError::validation(reason)
}
