//! Memoized query engine
//!
//! [`SessionStats`] owns a [`Session`], the [`AnalysisConfig`] it is analysed
//! with and a [`QueryCache`]. Every statistic is computed by the aggregators in
//! [`crate::aggregate`] on first request and answered from the cache
//! afterwards. The session is never mutated in place; [`SessionStats::modify`]
//! produces a new engine with an empty cache.
//!
//! ```
//! use lapstats::{Lap, Participant, Session, SessionStats, SessionType};
//!
//! let session = Session::new(
//!     SessionType::Race,
//!     vec![
//!         Participant::with_laps([Lap::new(1).with_time(91.2), Lap::new(2).with_time(90.4)]),
//!         Participant::with_laps([Lap::new(1).with_time(92.0), Lap::new(2).with_time(89.9)]),
//!     ],
//! );
//!
//! let stats = SessionStats::new(session);
//! let best = stats.best_lap().unwrap();
//! assert_eq!(best.time(), Some(89.9));
//! assert_eq!(best.id.participant, 1);
//! ```

mod lap_ref;
mod participant;

pub use lap_ref::LapRef;
pub use participant::ParticipantStats;

use std::collections::BTreeMap;
use tracing::debug;

use crate::aggregate::{ParticipantQueries, SessionAggregator, require_lap_number};
use crate::cache::{CacheKey, CacheStats, Query, QueryCache};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{LapId, Sector, Session};

/// Cached statistics over one session
#[derive(Debug, Clone)]
pub struct SessionStats {
    session: Session,
    config: AnalysisConfig,
    cache: QueryCache,
}

impl SessionStats {
    /// Engine with the default analysis settings
    pub fn new(session: Session) -> Self {
        Self::with_config(session, AnalysisConfig::default())
    }

    pub fn with_config(session: Session, config: AnalysisConfig) -> Self {
        Self { session, config, cache: QueryCache::new() }
    }

    /// Validate the session and the settings before building the engine.
    ///
    /// Equal vehicles and drivers are merged into shared handles first, so a
    /// session read from YAML tells them apart the same way as one built in
    /// code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed session and a configuration
    /// error for unusable settings.
    pub fn try_new(mut session: Session, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        session.validate()?;
        session.intern_vehicles();
        session.intern_drivers();
        Ok(Self::with_config(session, config))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Copy the session, apply `change` to the copy and analyse it with a new
    /// cache. `self` keeps its facts and cached results.
    pub fn modify(&self, change: impl FnOnce(&mut Session)) -> Self {
        let mut session = self.session.clone();
        change(&mut session);
        Self::with_config(session, self.config.clone())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn participants(&self) -> impl ExactSizeIterator<Item = ParticipantStats<'_>> + '_ {
        (0..self.session.participants.len()).map(move |index| ParticipantStats::new(self, index))
    }

    pub fn participant(&self, index: usize) -> Option<ParticipantStats<'_>> {
        (index < self.session.participants.len()).then(|| ParticipantStats::new(self, index))
    }

    fn aggregator(&self) -> SessionAggregator<'_, Self> {
        SessionAggregator::new(&self.session, self)
    }

    pub(crate) fn resolve(&self, id: LapId) -> LapRef<'_> {
        let participant = &self.session.participants[id.participant];
        LapRef { id, participant, lap: &participant.laps()[id.lap] }
    }

    pub(crate) fn resolve_all(&self, ids: &[LapId]) -> Vec<LapRef<'_>> {
        ids.iter().map(|&id| self.resolve(id)).collect()
    }

    fn lap_list(&self, query: Query, compute: impl FnOnce() -> Vec<LapId>) -> Vec<LapRef<'_>> {
        let ids = self.cache.memoize(&self.cache.lap_lists, CacheKey::session(query), || {
            compute().into()
        });
        self.resolve_all(&ids)
    }

    fn single_lap(
        &self,
        query: Query,
        compute: impl FnOnce() -> Option<LapId>,
    ) -> Option<LapRef<'_>> {
        self.cache
            .memoize(&self.cache.laps, CacheKey::session(query), compute)
            .map(|id| self.resolve(id))
    }

    fn single_participant(
        &self,
        query: Query,
        compute: impl FnOnce() -> Option<usize>,
    ) -> Option<ParticipantStats<'_>> {
        self.cache
            .memoize(&self.cache.participants, CacheKey::session(query), compute)
            .map(|index| ParticipantStats::new(self, index))
    }

    fn participant_list(
        &self,
        query: Query,
        compute: impl FnOnce() -> Vec<usize>,
    ) -> Vec<ParticipantStats<'_>> {
        let indexes = self
            .cache
            .memoize(&self.cache.participant_lists, CacheKey::session(query), || compute().into());
        indexes.iter().map(|&index| ParticipantStats::new(self, index)).collect()
    }

    /// Every lap of the session ordered by time, laps without time last
    pub fn laps_sorted_by_time(&self) -> Vec<LapRef<'_>> {
        self.lap_list(Query::LapsSortedByTime, || self.aggregator().laps_sorted_by_time())
    }

    /// Fastest completed lap of the session
    pub fn best_lap(&self) -> Option<LapRef<'_>> {
        self.single_lap(Query::BestLap, || self.aggregator().best_lap())
    }

    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn laps_by_lap_number_sorted_by_time(&self, lap_number: u32) -> Vec<LapRef<'_>> {
        require_lap_number(lap_number);
        self.lap_list(Query::LapsByLapNumberSortedByTime(lap_number), || {
            self.aggregator().laps_by_lap_number_sorted_by_time(lap_number)
        })
    }

    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn best_lap_by_lap_number(&self, lap_number: u32) -> Option<LapRef<'_>> {
        require_lap_number(lap_number);
        self.single_lap(Query::BestLapByLapNumber(lap_number), || {
            self.aggregator().best_lap_by_lap_number(lap_number)
        })
    }

    pub fn best_laps_grouped_by_participant(&self) -> Vec<LapRef<'_>> {
        self.lap_list(Query::BestLapsGroupedByParticipant, || {
            self.aggregator().best_laps_grouped_by_participant()
        })
    }

    pub fn laps_sorted_by_sector(&self, sector: Sector) -> Vec<LapRef<'_>> {
        self.lap_list(Query::LapsSortedBySector(sector), || {
            self.aggregator().laps_sorted_by_sector(sector)
        })
    }

    /// First lap of the sector ordering; check that it carries the sector.
    pub fn best_lap_by_sector(&self, sector: Sector) -> Option<LapRef<'_>> {
        self.single_lap(Query::BestLapBySector(sector), || {
            self.aggregator().best_lap_by_sector(sector)
        })
    }

    pub fn best_laps_by_sector_grouped_by_participant(&self, sector: Sector) -> Vec<LapRef<'_>> {
        self.lap_list(Query::BestLapsBySectorGroupedByParticipant(sector), || {
            self.aggregator().best_laps_by_sector_grouped_by_participant(sector)
        })
    }

    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn laps_sorted_by_sector_by_lap_number(
        &self,
        sector: Sector,
        lap_number: u32,
    ) -> Vec<LapRef<'_>> {
        require_lap_number(lap_number);
        self.lap_list(Query::LapsSortedBySectorByLapNumber(sector, lap_number), || {
            self.aggregator().laps_sorted_by_sector_by_lap_number(sector, lap_number)
        })
    }

    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn best_lap_by_sector_by_lap_number(
        &self,
        sector: Sector,
        lap_number: u32,
    ) -> Option<LapRef<'_>> {
        require_lap_number(lap_number);
        self.single_lap(Query::BestLapBySectorByLapNumber(sector, lap_number), || {
            self.aggregator().best_lap_by_sector_by_lap_number(sector, lap_number)
        })
    }

    /// Laps slower than the configured percentage of the session best
    pub fn bad_laps(&self) -> Vec<LapRef<'_>> {
        self.bad_laps_above(self.config.bad_lap_percent)
    }

    /// Completed laps strictly slower than `above_percent` of the session best,
    /// in time order
    pub fn bad_laps_above(&self, above_percent: f64) -> Vec<LapRef<'_>> {
        self.lap_list(Query::bad_laps(above_percent), || self.aggregator().bad_laps(above_percent))
    }

    /// Participant that led the most laps, the earliest one on a tie
    pub fn led_most_participant(&self) -> Option<ParticipantStats<'_>> {
        self.single_participant(Query::LedMostParticipant, || {
            self.aggregator().led_most_participant()
        })
    }

    pub fn winning_participant(&self) -> Option<ParticipantStats<'_>> {
        self.single_participant(Query::WinningParticipant, || {
            self.aggregator().winning_participant()
        })
    }

    /// Participant whose lap `lap_number` ended in first position
    ///
    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn leading_participant(&self, lap_number: u32) -> Option<ParticipantStats<'_>> {
        require_lap_number(lap_number);
        self.single_participant(Query::LeadingParticipant(lap_number), || {
            self.aggregator().leading_participant(lap_number)
        })
    }

    /// Participant that started lap `lap_number` earliest
    ///
    /// # Panics
    ///
    /// Panics when `lap_number` is 0.
    pub fn leading_participant_by_elapsed_time(
        &self,
        lap_number: u32,
    ) -> Option<ParticipantStats<'_>> {
        require_lap_number(lap_number);
        self.single_participant(Query::LeadingParticipantByElapsedTime(lap_number), || {
            self.aggregator().leading_participant_by_elapsed_time(lap_number)
        })
    }

    /// Most laps driven by any participant, absent when nobody drove a lap
    pub fn lasted_laps(&self) -> Option<usize> {
        let laps = self.cache.memoize(&self.cache.counts, CacheKey::session(Query::LastedLaps), || {
            self.aggregator().lasted_laps().unwrap_or(0)
        });
        (laps > 0).then_some(laps)
    }

    pub fn max_position(&self) -> u32 {
        self.cache.memoize(&self.cache.numbers, CacheKey::session(Query::MaxPosition), || {
            self.aggregator().max_position()
        })
    }

    pub fn participants_sorted_by_best_lap(&self) -> Vec<ParticipantStats<'_>> {
        self.participant_list(Query::ParticipantsSortedByBestLap, || {
            self.aggregator().participants_sorted_by_best_lap()
        })
    }

    pub fn participants_sorted_by_consistency(&self) -> Vec<ParticipantStats<'_>> {
        self.participant_list(Query::ParticipantsSortedByConsistency, || {
            self.aggregator().participants_sorted_by_consistency()
        })
    }

    /// One engine per vehicle class, classes in ascending order.
    ///
    /// Participants without any vehicle are dropped. Each engine analyses a
    /// copy of its participants with the same settings and a new cache.
    pub fn split_by_vehicle_class(&self) -> BTreeMap<String, SessionStats> {
        let classes = self.aggregator().participants_by_vehicle_class();
        debug!(
            classes = classes.len(),
            participants = self.session.participants.len(),
            "Splitting session by vehicle class"
        );

        classes
            .into_iter()
            .map(|(class, indexes)| {
                let participants = indexes
                    .iter()
                    .map(|&index| self.session.participants[index].clone())
                    .collect();
                let session = self.session.with_participants(participants);
                (class, Self::with_config(session, self.config.clone()))
            })
            .collect()
    }
}

/// Session aggregations read participant results through the cache.
impl ParticipantQueries for SessionStats {
    fn best_lap(&self, participant: usize) -> Option<usize> {
        self.participant(participant)?.best_lap_id().map(|id| id.lap)
    }

    fn best_lap_by_sector(&self, participant: usize, sector: Sector) -> Option<usize> {
        self.participant(participant)?.best_lap_by_sector_id(sector).map(|id| id.lap)
    }

    fn number_of_laps_led(&self, participant: usize) -> usize {
        self.participant(participant).map_or(0, |p| p.number_of_laps_led())
    }

    fn consistency(&self, participant: usize) -> Option<f64> {
        self.participant(participant)?.consistency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DirectQueries;
    use crate::types::{Lap, Participant, SessionType, Vehicle};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn timed(number: u32, time: f64) -> Lap {
        Lap::new(number).with_time(time)
    }

    fn race(participants: Vec<Participant>) -> Session {
        Session::new(SessionType::Race, participants)
    }

    #[test]
    fn engine_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SessionStats>();
        assert_send_sync::<ParticipantStats<'static>>();
    }

    #[test]
    fn best_lap_and_bad_laps() {
        let stats = SessionStats::new(race(vec![
            Participant::with_laps([timed(1, 90.0), timed(2, 96.3)]),
            Participant::with_laps([timed(1, 96.3001), timed(2, 95.0)]),
        ]));

        let best = stats.best_lap().unwrap();
        assert_eq!(best.id, LapId::new(0, 0));

        let bad: Vec<LapId> = stats.bad_laps().iter().map(|lap| lap.id).collect();
        assert_eq!(bad, vec![LapId::new(1, 0)]);
        assert!(stats.bad_laps_above(110.0).is_empty());
    }

    #[test]
    fn second_query_is_answered_from_cache() {
        let stats = SessionStats::new(race(vec![Participant::with_laps([timed(1, 90.0)])]));

        stats.best_laps_grouped_by_participant();
        let first = stats.cache_stats();
        stats.best_laps_grouped_by_participant();
        let second = stats.cache_stats();

        assert_eq!(second.misses, first.misses);
        assert_eq!(second.hits, first.hits + 1);
    }

    #[test]
    fn modify_leaves_original_untouched() {
        let stats =
            SessionStats::new(race(vec![Participant::with_laps([timed(1, 90.0), timed(2, 91.0)])]));
        assert_eq!(stats.best_lap().unwrap().time(), Some(90.0));

        let faster = stats.modify(|session| {
            session.participants[0].push_lap(timed(3, 88.0));
        });

        assert_eq!(faster.best_lap().unwrap().time(), Some(88.0));
        assert_eq!(stats.best_lap().unwrap().time(), Some(90.0));
        assert_eq!(faster.cache_stats().hits, 0);
    }

    #[test]
    fn try_new_rejects_bad_input() {
        let zero_lap = race(vec![Participant::with_laps([Lap::new(0)])]);
        assert!(SessionStats::try_new(zero_lap, AnalysisConfig::default()).is_err());

        let config = AnalysisConfig { bad_lap_percent: 0.0, ..AnalysisConfig::default() };
        assert!(SessionStats::try_new(Session::default(), config).is_err());

        assert!(SessionStats::try_new(Session::default(), AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn try_new_shares_vehicles_read_from_yaml() {
        let yaml = "
participants:
  - laps:
      - { number: 1, time: 90.0, vehicle: { name: Car, class: GT3 } }
      - { number: 2, time: 90.5, vehicle: { name: Car, class: GT3 } }
      - { number: 3, time: 91.0, vehicle: { name: Car, class: GT3 } }
";
        let session: Session = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(session.participants[0].vehicles().len(), 3);

        let stats = SessionStats::try_new(session, AnalysisConfig::default()).unwrap();
        let vehicles = stats.participant(0).unwrap().vehicles();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].class.as_deref(), Some("GT3"));
    }

    #[test]
    #[should_panic(expected = "lap numbers start at 1")]
    fn lap_number_zero_panics() {
        SessionStats::new(Session::default()).leading_participant(0);
    }

    #[test]
    fn split_by_vehicle_class_orders_classes() {
        crate::test_utils::init_tracing();
        let gt3 = Arc::new(Vehicle::new("911 GT3 R", Some("GT3")));
        let gt4 = Arc::new(Vehicle::new("Cayman GT4", Some("GT4")));
        let stats = SessionStats::new(race(vec![
            Participant::with_laps([timed(1, 100.0)]).with_vehicle(gt4),
            Participant::with_laps([timed(1, 90.0)]).with_vehicle(gt3),
            Participant::with_laps([timed(1, 80.0)]),
        ]));

        let split = stats.split_by_vehicle_class();
        let classes: Vec<&str> = split.keys().map(String::as_str).collect();
        assert_eq!(classes, vec!["GT3", "GT4"]);
        assert_eq!(split["GT3"].best_lap().unwrap().time(), Some(90.0));
        assert_eq!(split["GT4"].session().participants.len(), 1);
    }

    fn arbitrary_session() -> impl Strategy<Value = Session> {
        let lap = (prop::option::of(80.0f64..100.0), prop::option::of(1u32..5), any::<bool>());
        let participant = prop::collection::vec(lap, 0..8).prop_map(|laps| {
            Participant::with_laps(laps.into_iter().enumerate().map(|(i, (time, position, pit))| {
                let mut lap = Lap::new(i as u32 + 1).with_pit_lap(pit);
                lap.time = time;
                lap.position = position;
                lap
            }))
        });
        prop::collection::vec(participant, 0..6).prop_map(race)
    }

    proptest! {
        #[test]
        fn cached_results_match_direct_aggregation(session in arbitrary_session()) {
            let config = AnalysisConfig::default();
            let direct = DirectQueries::new(&session, &config);
            let uncached = SessionAggregator::new(&session, &direct);
            let stats = SessionStats::new(session.clone());

            // Twice, so the second pass is answered from the cache
            for _ in 0..2 {
                let ids: Vec<LapId> =
                    stats.laps_sorted_by_time().iter().map(|lap| lap.id).collect();
                prop_assert_eq!(ids, uncached.laps_sorted_by_time());
                prop_assert_eq!(stats.best_lap().map(|lap| lap.id), uncached.best_lap());

                let grouped: Vec<LapId> = stats
                    .best_laps_grouped_by_participant()
                    .iter()
                    .map(|lap| lap.id)
                    .collect();
                prop_assert_eq!(grouped, uncached.best_laps_grouped_by_participant());

                let bad: Vec<LapId> = stats.bad_laps().iter().map(|lap| lap.id).collect();
                prop_assert_eq!(bad, uncached.bad_laps(config.bad_lap_percent));

                prop_assert_eq!(
                    stats.led_most_participant().map(|p| p.index()),
                    uncached.led_most_participant()
                );
                prop_assert_eq!(stats.lasted_laps(), uncached.lasted_laps());
                prop_assert_eq!(stats.max_position(), uncached.max_position());

                let by_consistency: Vec<usize> =
                    stats.participants_sorted_by_consistency().iter().map(|p| p.index()).collect();
                prop_assert_eq!(by_consistency, uncached.participants_sorted_by_consistency());
            }
        }
    }
}
