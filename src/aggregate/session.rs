//! Session-wide statistics
//!
//! [`SessionAggregator`] ranks laps across all participants. Whenever it needs
//! a per-participant result it asks through [`ParticipantQueries`], so the
//! engine can answer those from its cache while [`DirectQueries`] computes
//! them on the spot.

use std::collections::BTreeMap;

use super::{ParticipantAggregator, require_lap_number};
use crate::config::AnalysisConfig;
use crate::ordering::{compare_optional, sort_by_sector, sort_by_time};
use crate::timing::round4;
use crate::types::{Lap, LapId, Sector, Session};

/// Per-participant results a session aggregation depends on.
///
/// Participants are addressed by their index in [`Session::participants`],
/// laps by their index in the participant's lap list.
pub trait ParticipantQueries {
    fn best_lap(&self, participant: usize) -> Option<usize>;

    fn best_lap_by_sector(&self, participant: usize, sector: Sector) -> Option<usize>;

    fn number_of_laps_led(&self, participant: usize) -> usize;

    fn consistency(&self, participant: usize) -> Option<f64>;
}

/// Answers participant queries without caching
#[derive(Debug, Clone, Copy)]
pub struct DirectQueries<'a> {
    session: &'a Session,
    config: &'a AnalysisConfig,
}

impl<'a> DirectQueries<'a> {
    pub fn new(session: &'a Session, config: &'a AnalysisConfig) -> Self {
        Self { session, config }
    }

    fn aggregator(&self, participant: usize) -> Option<ParticipantAggregator<'a>> {
        self.session
            .participants
            .get(participant)
            .map(|p| ParticipantAggregator::new(p, self.config))
    }
}

impl ParticipantQueries for DirectQueries<'_> {
    fn best_lap(&self, participant: usize) -> Option<usize> {
        self.aggregator(participant)?.best_lap()
    }

    fn best_lap_by_sector(&self, participant: usize, sector: Sector) -> Option<usize> {
        self.aggregator(participant)?.best_lap_by_sector(sector)
    }

    fn number_of_laps_led(&self, participant: usize) -> usize {
        self.aggregator(participant).map_or(0, |a| a.number_of_laps_led())
    }

    fn consistency(&self, participant: usize) -> Option<f64> {
        self.aggregator(participant)?.consistency(self.config.ignore_first_lap)
    }
}

/// Uncached statistics over a whole session
#[derive(Debug, Clone, Copy)]
pub struct SessionAggregator<'a, Q: ?Sized> {
    session: &'a Session,
    participants: &'a Q,
}

impl<'a, Q> SessionAggregator<'a, Q>
where
    Q: ParticipantQueries + ?Sized,
{
    pub fn new(session: &'a Session, participants: &'a Q) -> Self {
        Self { session, participants }
    }

    fn lap(&self, id: LapId) -> &'a Lap {
        &self.session.participants[id.participant].laps()[id.lap]
    }

    fn all_laps(&self) -> Vec<LapId> {
        self.session
            .participants
            .iter()
            .enumerate()
            .flat_map(|(p, participant)| {
                (0..participant.laps().len()).map(move |l| LapId::new(p, l))
            })
            .collect()
    }

    fn laps_by_lap_number(&self, lap_number: u32) -> Vec<LapId> {
        require_lap_number(lap_number);
        self.session
            .participants
            .iter()
            .enumerate()
            .filter_map(|(p, participant)| {
                let index = participant.laps().iter().position(|lap| lap.number == lap_number)?;
                Some(LapId::new(p, index))
            })
            .collect()
    }

    fn by_time(&self, mut laps: Vec<LapId>) -> Vec<LapId> {
        sort_by_time(&mut laps, |&id| self.lap(id));
        laps
    }

    fn by_sector(&self, mut laps: Vec<LapId>, sector: Sector) -> Vec<LapId> {
        sort_by_sector(&mut laps, sector, |&id| self.lap(id));
        laps
    }

    fn first_completed(&self, laps: Vec<LapId>) -> Option<LapId> {
        laps.into_iter().find(|&id| self.lap(id).is_completed())
    }

    /// Every lap of every participant, ordered by time
    pub fn laps_sorted_by_time(&self) -> Vec<LapId> {
        self.by_time(self.all_laps())
    }

    /// Fastest completed lap of the session
    pub fn best_lap(&self) -> Option<LapId> {
        self.first_completed(self.laps_sorted_by_time())
    }

    /// Each participant's lap with this number, ordered by time
    ///
    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn laps_by_lap_number_sorted_by_time(&self, lap_number: u32) -> Vec<LapId> {
        self.by_time(self.laps_by_lap_number(lap_number))
    }

    /// Fastest completed lap with this number
    pub fn best_lap_by_lap_number(&self, lap_number: u32) -> Option<LapId> {
        self.first_completed(self.laps_by_lap_number_sorted_by_time(lap_number))
    }

    /// One best lap per participant, ordered by time
    pub fn best_laps_grouped_by_participant(&self) -> Vec<LapId> {
        let laps = (0..self.session.participants.len())
            .filter_map(|p| Some(LapId::new(p, self.participants.best_lap(p)?)))
            .collect();
        self.by_time(laps)
    }

    /// Every lap ordered by one sector
    pub fn laps_sorted_by_sector(&self, sector: Sector) -> Vec<LapId> {
        self.by_sector(self.all_laps(), sector)
    }

    /// First lap of the sector ordering, which may lack that sector
    pub fn best_lap_by_sector(&self, sector: Sector) -> Option<LapId> {
        self.laps_sorted_by_sector(sector).first().copied()
    }

    /// One best lap by sector per participant, ordered by that sector
    pub fn best_laps_by_sector_grouped_by_participant(&self, sector: Sector) -> Vec<LapId> {
        let laps = (0..self.session.participants.len())
            .filter_map(|p| Some(LapId::new(p, self.participants.best_lap_by_sector(p, sector)?)))
            .collect();
        self.by_sector(laps, sector)
    }

    /// Each participant's lap with this number, ordered by one sector
    pub fn laps_sorted_by_sector_by_lap_number(
        &self,
        sector: Sector,
        lap_number: u32,
    ) -> Vec<LapId> {
        self.by_sector(self.laps_by_lap_number(lap_number), sector)
    }

    pub fn best_lap_by_sector_by_lap_number(
        &self,
        sector: Sector,
        lap_number: u32,
    ) -> Option<LapId> {
        self.laps_sorted_by_sector_by_lap_number(sector, lap_number).first().copied()
    }

    /// Completed laps slower than `above_percent` of the session best, in
    /// time order. Empty without a session best.
    pub fn bad_laps(&self, above_percent: f64) -> Vec<LapId> {
        let sorted = self.laps_sorted_by_time();
        let Some(best_time) =
            self.first_completed(sorted.clone()).and_then(|id| self.lap(id).time())
        else {
            return Vec::new();
        };

        let threshold = round4(best_time * above_percent / 100.0);
        sorted
            .into_iter()
            .filter(|&id| self.lap(id).time().is_some_and(|time| time > threshold))
            .collect()
    }

    /// Participant leading the most laps, the earliest one on a tie
    pub fn led_most_participant(&self) -> Option<usize> {
        let mut most: Option<(usize, usize)> = None;
        for p in 0..self.session.participants.len() {
            let led = self.participants.number_of_laps_led(p);
            if most.is_none_or(|(_, best)| led > best) {
                most = Some((p, led));
            }
        }
        most.map(|(p, _)| p)
    }

    /// First participant in finishing order
    pub fn winning_participant(&self) -> Option<usize> {
        (!self.session.participants.is_empty()).then_some(0)
    }

    /// Participant whose lap with this number was completed in first position
    pub fn leading_participant(&self, lap_number: u32) -> Option<usize> {
        require_lap_number(lap_number);
        self.session.participants.iter().position(|participant| {
            participant.lap(lap_number).is_some_and(|lap| lap.position == Some(1))
        })
    }

    /// Participant that started this lap earliest in the session.
    ///
    /// A lap without elapsed time is only picked while no lap has been picked
    /// yet. Unlike [`Self::leading_participant`] this ignores reported positions.
    pub fn leading_participant_by_elapsed_time(&self, lap_number: u32) -> Option<usize> {
        require_lap_number(lap_number);

        let mut leader: Option<(usize, Option<f64>)> = None;
        for (p, participant) in self.session.participants.iter().enumerate() {
            let Some(lap) = participant.lap(lap_number) else {
                continue;
            };

            let take = match (leader, lap.elapsed_seconds) {
                (None, _) => true,
                (Some((_, None)), Some(_)) => true,
                (Some((_, Some(best))), Some(elapsed)) => elapsed < best,
                (Some(_), None) => false,
            };
            if take {
                leader = Some((p, lap.elapsed_seconds));
            }
        }
        leader.map(|(p, _)| p)
    }

    /// Highest number of laps any participant drove
    pub fn lasted_laps(&self) -> Option<usize> {
        self.session.participants.iter().map(|p| p.number_of_laps()).max().filter(|&laps| laps > 0)
    }

    /// Highest running position seen on any lap, at least 1
    pub fn max_position(&self) -> u32 {
        self.session
            .participants
            .iter()
            .flat_map(|participant| participant.laps())
            .filter_map(|lap| lap.position)
            .fold(1, u32::max)
    }

    /// Participant indexes ordered by best lap, participants without one last
    pub fn participants_sorted_by_best_lap(&self) -> Vec<usize> {
        let best_times: Vec<Option<f64>> = (0..self.session.participants.len())
            .map(|p| self.participants.best_lap(p).and_then(|l| self.lap(LapId::new(p, l)).time()))
            .collect();

        let mut order: Vec<usize> = (0..best_times.len()).collect();
        order.sort_by(|&a, &b| compare_optional(best_times[a], best_times[b]));
        order
    }

    /// Participant indexes ordered by consistency, participants without one last
    pub fn participants_sorted_by_consistency(&self) -> Vec<usize> {
        let consistency: Vec<Option<f64>> = (0..self.session.participants.len())
            .map(|p| self.participants.consistency(p))
            .collect();

        let mut order: Vec<usize> = (0..consistency.len()).collect();
        order.sort_by(|&a, &b| compare_optional(consistency[a], consistency[b]));
        order
    }

    /// Participant indexes grouped by vehicle class, classes in ascending order.
    ///
    /// Participants without a vehicle are left out; a vehicle without class
    /// falls under the empty class name.
    pub fn participants_by_vehicle_class(&self) -> BTreeMap<String, Vec<usize>> {
        let mut classes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (p, participant) in self.session.participants.iter().enumerate() {
            let Some(vehicle) = participant.vehicle() else {
                continue;
            };
            classes.entry(vehicle.class.clone().unwrap_or_default()).or_default().push(p);
        }
        classes
    }
}
