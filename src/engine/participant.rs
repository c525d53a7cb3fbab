//! Cached per-participant statistics

use std::sync::Arc;

use super::{LapRef, SessionStats};
use crate::aggregate::ParticipantAggregator;
use crate::cache::{CacheKey, Query};
use crate::types::{Lap, LapId, Participant, Sector, Vehicle};

/// Statistics of one participant of a [`SessionStats`].
///
/// A cheap handle: copying it does not copy any data. Every query goes through
/// the owning engine's cache.
#[derive(Debug, Clone, Copy)]
pub struct ParticipantStats<'a> {
    engine: &'a SessionStats,
    index: usize,
}

impl<'a> ParticipantStats<'a> {
    pub(crate) fn new(engine: &'a SessionStats, index: usize) -> Self {
        Self { engine, index }
    }

    /// Position of the participant in [`crate::Session::participants`]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn participant(&self) -> &'a Participant {
        &self.engine.session().participants[self.index]
    }

    fn aggregator(&self) -> ParticipantAggregator<'a> {
        ParticipantAggregator::new(self.participant(), self.engine.config())
    }

    fn key(&self, query: Query) -> CacheKey {
        CacheKey::participant(self.index, query)
    }

    fn lap_ids(&self, indexes: Vec<usize>) -> Arc<[LapId]> {
        indexes.into_iter().map(|lap| LapId::new(self.index, lap)).collect()
    }

    pub fn laps_sorted_by_time(&self) -> Vec<LapRef<'a>> {
        let cache = &self.engine.cache;
        let ids = cache.memoize(&cache.lap_lists, self.key(Query::LapsSortedByTime), || {
            self.lap_ids(self.aggregator().laps_sorted_by_time())
        });
        self.engine.resolve_all(&ids)
    }

    pub(crate) fn best_lap_id(&self) -> Option<LapId> {
        let cache = &self.engine.cache;
        cache.memoize(&cache.laps, self.key(Query::BestLap), || {
            self.aggregator().best_lap().map(|lap| LapId::new(self.index, lap))
        })
    }

    /// Fastest lap without cuts
    pub fn best_lap(&self) -> Option<LapRef<'a>> {
        self.best_lap_id().map(|id| self.engine.resolve(id))
    }

    pub fn number_of_completed_laps(&self) -> usize {
        let cache = &self.engine.cache;
        cache.memoize(&cache.counts, self.key(Query::NumberOfCompletedLaps), || {
            self.aggregator().number_of_completed_laps()
        })
    }

    pub fn number_of_laps_led(&self) -> usize {
        let cache = &self.engine.cache;
        cache.memoize(&cache.counts, self.key(Query::NumberOfLapsLed), || {
            self.aggregator().number_of_laps_led()
        })
    }

    pub fn laps_sorted_by_sector(&self, sector: Sector) -> Vec<LapRef<'a>> {
        let cache = &self.engine.cache;
        let ids = cache.memoize(&cache.lap_lists, self.key(Query::LapsSortedBySector(sector)), || {
            self.lap_ids(self.aggregator().laps_sorted_by_sector(sector))
        });
        self.engine.resolve_all(&ids)
    }

    pub(crate) fn best_lap_by_sector_id(&self, sector: Sector) -> Option<LapId> {
        let cache = &self.engine.cache;
        cache.memoize(&cache.laps, self.key(Query::BestLapBySector(sector)), || {
            self.aggregator().best_lap_by_sector(sector).map(|lap| LapId::new(self.index, lap))
        })
    }

    /// First lap of the sector ordering; check that it carries the sector.
    pub fn best_lap_by_sector(&self, sector: Sector) -> Option<LapRef<'a>> {
        self.best_lap_by_sector_id(sector).map(|id| self.engine.resolve(id))
    }

    /// Average lap using the configured pit sector exclusion
    pub fn average_lap(&self) -> Option<Arc<Lap>> {
        self.average_lap_with(self.engine.config().exclude_pitstop_sectors)
    }

    pub fn average_lap_with(&self, exclude_pitstop_sectors: bool) -> Option<Arc<Lap>> {
        let cache = &self.engine.cache;
        let key = self.key(Query::AverageLap { exclude_pitstop_sectors });
        cache.memoize(&cache.synthetic_laps, key, || {
            self.aggregator().average_lap(exclude_pitstop_sectors).map(Arc::new)
        })
    }

    pub fn best_possible_lap(&self) -> Option<Arc<Lap>> {
        let cache = &self.engine.cache;
        cache.memoize(&cache.synthetic_laps, self.key(Query::BestPossibleLap), || {
            self.aggregator().best_possible_lap().map(Arc::new)
        })
    }

    /// Consistency using the configured first lap handling
    pub fn consistency(&self) -> Option<f64> {
        self.consistency_with(self.engine.config().ignore_first_lap)
    }

    pub fn consistency_with(&self, ignore_first_lap: bool) -> Option<f64> {
        let cache = &self.engine.cache;
        cache.memoize(&cache.seconds, self.key(Query::Consistency { ignore_first_lap }), || {
            self.aggregator().consistency(ignore_first_lap)
        })
    }

    pub fn consistency_percentage(&self) -> Option<f64> {
        self.consistency_percentage_with(self.engine.config().ignore_first_lap)
    }

    pub fn consistency_percentage_with(&self, ignore_first_lap: bool) -> Option<f64> {
        let cache = &self.engine.cache;
        let key = self.key(Query::ConsistencyPercentage { ignore_first_lap });
        cache.memoize(&cache.seconds, key, || {
            self.aggregator().consistency_percentage(ignore_first_lap)
        })
    }

    pub fn total_time(&self) -> f64 {
        let cache = &self.engine.cache;
        cache.memoize(&cache.totals, self.key(Query::TotalTime), || self.aggregator().total_time())
    }

    /// Time between this participant and `other`, positive when `other` is
    /// behind.
    ///
    /// Only participants of the same engine are cached; a participant of
    /// another engine is compared directly.
    pub fn total_time_gap(&self, other: ParticipantStats<'_>) -> f64 {
        if !std::ptr::eq(self.engine, other.engine) {
            return self.aggregator().total_time_gap(other.participant());
        }

        let cache = &self.engine.cache;
        cache.memoize(&cache.totals, self.key(Query::TotalTimeGap { other: other.index }), || {
            self.aggregator().total_time_gap(other.participant())
        })
    }

    /// Distinct vehicles driven, in order of first use
    pub fn vehicles(&self) -> Arc<[Arc<Vehicle>]> {
        let cache = &self.engine.cache;
        cache.memoize(&cache.vehicles, self.key(Query::Vehicles), || {
            self.aggregator().vehicles().into()
        })
    }

    pub fn pit_stops(&self) -> u32 {
        let cache = &self.engine.cache;
        cache.memoize(&cache.numbers, self.key(Query::PitStops), || self.aggregator().pit_stops())
    }
}

/// Handles are equal when they name the same participant of the same engine.
impl PartialEq for ParticipantStats<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.engine, other.engine) && self.index == other.index
    }
}

impl Eq for ParticipantStats<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Session, SessionType};

    fn timed(number: u32, time: f64) -> Lap {
        Lap::new(number).with_time(time)
    }

    fn engine() -> SessionStats {
        SessionStats::new(Session::new(
            SessionType::Race,
            vec![
                Participant::with_laps([
                    Lap::new(1).with_sectors([30.0, 40.0, 50.0]),
                    Lap::new(2).with_sectors([29.0, 39.0, 49.0]),
                    Lap::new(3),
                ]),
                Participant::with_laps([timed(1, 125.0), timed(2, 119.0)]),
            ],
        ))
    }

    #[test]
    fn best_lap_resolves_to_participant_lap() {
        let engine = engine();
        let first = engine.participant(0).unwrap();

        let best = first.best_lap().unwrap();
        assert_eq!(best.id, LapId::new(0, 1));
        assert_eq!(best.number, 2);
        assert!(std::ptr::eq(best.participant, first.participant()));
        assert_eq!(first.number_of_completed_laps(), 2);
        assert_eq!(first.best_possible_lap().unwrap().time(), Some(117.0));
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let engine = engine();
        let first = engine.participant(0).unwrap();

        let before = engine.cache_stats();
        let a = first.best_possible_lap();
        let b = first.best_possible_lap();
        let after = engine.cache_stats();

        assert!(Arc::ptr_eq(a.as_ref().unwrap(), b.as_ref().unwrap()));
        assert_eq!(after.hits - before.hits, 1);
    }

    #[test]
    fn configured_and_explicit_variants_share_entries() {
        let engine = engine();
        let second = engine.participant(1).unwrap();

        assert_eq!(second.consistency(), second.consistency_with(true));
        assert_eq!(second.consistency_with(false), Some(6.0));
        assert_eq!(second.consistency(), None);
        assert_eq!(second.average_lap(), None);
    }

    #[test]
    fn gap_between_engines_is_computed_directly() {
        let engine = engine();
        let other = engine.clone();

        let a = engine.participant(0).unwrap();
        let b = other.participant(1).unwrap();
        assert_eq!(a.total_time_gap(b), 244.0 - 237.0);
        assert_eq!(a.total_time_gap(engine.participant(1).unwrap()), 7.0);
        assert_ne!(b, other.participant(0).unwrap());
        assert_eq!(b, other.participant(1).unwrap());
    }
}
