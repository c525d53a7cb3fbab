//! Cache keys
//!
//! A key names the receiver of a query, the query and its arguments.
//! Participants are reduced to their index inside the owning session, and
//! floating point arguments to their bit patterns so keys stay `Eq + Hash`.

use crate::types::Sector;

/// Object a query is asked of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    Session,
    Participant(usize),
}

/// Cached query together with its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    // Shared by participants and sessions
    LapsSortedByTime,
    BestLap,
    LapsSortedBySector(Sector),
    BestLapBySector(Sector),

    // Participant queries
    NumberOfCompletedLaps,
    NumberOfLapsLed,
    AverageLap { exclude_pitstop_sectors: bool },
    BestPossibleLap,
    Consistency { ignore_first_lap: bool },
    ConsistencyPercentage { ignore_first_lap: bool },
    TotalTime,
    TotalTimeGap { other: usize },
    Vehicles,
    PitStops,

    // Session queries
    LapsByLapNumberSortedByTime(u32),
    BestLapByLapNumber(u32),
    BestLapsGroupedByParticipant,
    BestLapsBySectorGroupedByParticipant(Sector),
    LapsSortedBySectorByLapNumber(Sector, u32),
    BestLapBySectorByLapNumber(Sector, u32),
    BadLaps { above_percent_bits: u64 },
    LedMostParticipant,
    WinningParticipant,
    LeadingParticipant(u32),
    LeadingParticipantByElapsedTime(u32),
    LastedLaps,
    MaxPosition,
    ParticipantsSortedByBestLap,
    ParticipantsSortedByConsistency,
}

impl Query {
    /// Key for bad laps above a percentage of the session best
    pub fn bad_laps(above_percent: f64) -> Self {
        Query::BadLaps { above_percent_bits: above_percent.to_bits() }
    }
}

/// Full cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub receiver: Receiver,
    pub query: Query,
}

impl CacheKey {
    pub fn session(query: Query) -> Self {
        Self { receiver: Receiver::Session, query }
    }

    pub fn participant(index: usize, query: Query) -> Self {
        Self { receiver: Receiver::Participant(index), query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn receivers_and_arguments_separate_keys() {
        let keys: HashSet<CacheKey> = [
            CacheKey::session(Query::BestLap),
            CacheKey::participant(0, Query::BestLap),
            CacheKey::participant(1, Query::BestLap),
            CacheKey::participant(1, Query::Consistency { ignore_first_lap: true }),
            CacheKey::participant(1, Query::Consistency { ignore_first_lap: false }),
            CacheKey::session(Query::bad_laps(107.0)),
            CacheKey::session(Query::bad_laps(105.0)),
            CacheKey::session(Query::BestLapBySector(Sector::One)),
            CacheKey::session(Query::BestLapBySector(Sector::Two)),
        ]
        .into_iter()
        .collect();

        assert_eq!(keys.len(), 9);
        assert_eq!(
            CacheKey::session(Query::bad_laps(107.0)),
            CacheKey::session(Query::bad_laps(107.0))
        );
    }
}
