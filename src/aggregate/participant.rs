//! Per-participant statistics
//!
//! Laps are identified by their index in [`Participant::laps`], so results can
//! be stored and resolved again without borrowing the participant.

use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::ordering::{sort_by_sector, sort_by_time};
use crate::timing::{accumulate, round2, round4};
use crate::types::{Lap, Participant, Sector, Vehicle};

/// Uncached statistics over one participant's laps
#[derive(Debug, Clone, Copy)]
pub struct ParticipantAggregator<'a> {
    participant: &'a Participant,
    consistency_window_seconds: f64,
}

impl<'a> ParticipantAggregator<'a> {
    pub fn new(participant: &'a Participant, config: &AnalysisConfig) -> Self {
        Self { participant, consistency_window_seconds: config.consistency_window_seconds }
    }

    pub fn participant(&self) -> &'a Participant {
        self.participant
    }

    fn laps(&self) -> &'a [Lap] {
        self.participant.laps()
    }

    /// Lap indexes ordered by time, laps without time last
    pub fn laps_sorted_by_time(&self) -> Vec<usize> {
        let laps = self.laps();
        let mut indexes: Vec<usize> = (0..laps.len()).collect();
        sort_by_time(&mut indexes, |&i| &laps[i]);
        indexes
    }

    /// Fastest lap that is valid for best
    pub fn best_lap(&self) -> Option<usize> {
        let laps = self.laps();
        self.laps_sorted_by_time().into_iter().find(|&i| laps[i].is_valid_for_best())
    }

    pub fn number_of_completed_laps(&self) -> usize {
        self.laps().iter().filter(|lap| lap.is_completed()).count()
    }

    /// Laps finished in first position
    pub fn number_of_laps_led(&self) -> usize {
        self.laps().iter().filter(|lap| lap.position == Some(1)).count()
    }

    /// Lap indexes ordered by one sector, laps without that sector last
    pub fn laps_sorted_by_sector(&self, sector: Sector) -> Vec<usize> {
        let laps = self.laps();
        let mut indexes: Vec<usize> = (0..laps.len()).collect();
        sort_by_sector(&mut indexes, sector, |&i| &laps[i]);
        indexes
    }

    /// First lap of the sector ordering.
    ///
    /// This can be a lap without that sector when no lap has it.
    pub fn best_lap_by_sector(&self, sector: Sector) -> Option<usize> {
        self.laps_sorted_by_sector(sector).first().copied()
    }

    /// Synthetic lap made of the mean of each sector.
    ///
    /// With `exclude_pitstop_sectors`, the last sector of a pit lap and the
    /// first sector of the lap after it are left out. Absent when any sector
    /// has no sample left.
    pub fn average_lap(&self, exclude_pitstop_sectors: bool) -> Option<Lap> {
        let laps = self.laps();
        let mut sums = [0.0f64; 3];
        let mut counts = [0usize; 3];

        for (index, lap) in laps.iter().enumerate() {
            let after_pit_lap = index > 0 && laps[index - 1].pit_lap;

            for sector in Sector::ALL {
                let Some(time) = lap.sector_time(sector) else {
                    continue;
                };

                if exclude_pitstop_sectors {
                    if sector == Sector::Three && lap.pit_lap {
                        continue;
                    }
                    if sector == Sector::One && after_pit_lap {
                        continue;
                    }
                }

                sums[sector.index()] += time;
                counts[sector.index()] += 1;
            }
        }

        if counts.contains(&0) {
            return None;
        }

        let means =
            sums.iter().zip(counts).map(|(sum, count)| round4(sum / count as f64)).collect();
        Some(Lap::synthetic(means))
    }

    /// Synthetic lap combining the best time of each sector.
    ///
    /// Absent when any sector lacks a best time or its best time is zero.
    pub fn best_possible_lap(&self) -> Option<Lap> {
        let laps = self.laps();
        let mut sectors = Vec::with_capacity(3);

        for sector in Sector::ALL {
            let best = self.best_lap_by_sector(sector)?;
            let time = laps[best].sector_time(sector).filter(|time| *time != 0.0)?;
            sectors.push(time);
        }

        Some(Lap::synthetic(sectors))
    }

    /// Average distance to the best lap in seconds.
    ///
    /// Needs two completed laps and a best lap. The best lap itself, laps not
    /// valid for best, pit laps and laps at or beyond the consistency window
    /// are left out, as is the first lap in driving order when
    /// `ignore_first_lap` is set.
    pub fn consistency(&self, ignore_first_lap: bool) -> Option<f64> {
        if self.number_of_completed_laps() < 2 {
            return None;
        }

        let laps = self.laps();
        let best = self.best_lap()?;
        let best_time = laps[best].time()?;
        let limit = best_time + self.consistency_window_seconds;

        let mut sum = 0.0;
        let mut count = 0usize;
        for (index, lap) in laps.iter().enumerate() {
            if index == best || !lap.is_valid_for_best() || lap.pit_lap {
                continue;
            }
            if ignore_first_lap && index == 0 {
                continue;
            }
            let Some(time) = lap.time() else {
                continue;
            };
            if time >= limit {
                continue;
            }

            sum += time;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        Some(round4(sum / count as f64 - best_time))
    }

    /// Consistency as a percentage, 100 being a perfectly consistent driver
    pub fn consistency_percentage(&self, ignore_first_lap: bool) -> Option<f64> {
        let consistency = self.consistency(ignore_first_lap)?;
        if consistency == 0.0 {
            return None;
        }

        let best_time = self.laps()[self.best_lap()?].time()?;
        Some(round2(100.0 - consistency / (best_time / 100.0)))
    }

    pub fn total_time(&self) -> f64 {
        self.participant.total_time()
    }

    /// Time between this participant and `other`, positive when `other` is
    /// behind.
    ///
    /// When the lap counts differ, the leader's last laps are folded into the
    /// gap so a lapped participant is reported by how far it trails on the
    /// road. Lap numbers the leader lacks are skipped.
    pub fn total_time_gap(&self, other: &Participant) -> f64 {
        let this = self.participant;
        let mut gap = round4(other.total_time() - this.total_time());

        let difference = this.number_of_laps() as i64 - other.number_of_laps() as i64;
        if difference == 0 {
            return gap;
        }

        let this_leads = difference > 0;
        let leader = if this_leads { this } else { other };
        let leader_laps = leader.number_of_laps();

        for offset in 0..difference.unsigned_abs() as usize {
            let number = (leader_laps - offset) as u32;
            let Some(time) = leader.lap(number).and_then(Lap::time) else {
                continue;
            };
            gap = if this_leads { accumulate(gap, time) } else { accumulate(gap, -time) };
        }

        gap
    }

    pub fn vehicles(&self) -> Vec<Arc<Vehicle>> {
        self.participant.vehicles()
    }

    pub fn pit_stops(&self) -> u32 {
        self.participant.pit_stops()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cut;
    use proptest::prelude::*;

    fn aggregator(participant: &Participant) -> ParticipantAggregator<'_> {
        ParticipantAggregator::new(participant, &AnalysisConfig::default())
    }

    fn timed(number: u32, time: f64) -> Lap {
        Lap::new(number).with_time(time)
    }

    fn scenario() -> Participant {
        Participant::with_laps([
            Lap::new(1).with_sectors([30.0, 40.0, 50.0]),
            Lap::new(2).with_sectors([29.0, 39.0, 49.0]),
            Lap::new(3),
        ])
    }

    #[test]
    fn scenario_best_lap_and_best_possible() {
        let participant = scenario();
        let stats = aggregator(&participant);

        assert_eq!(stats.best_lap(), Some(1));
        assert_eq!(stats.number_of_completed_laps(), 2);

        let possible = stats.best_possible_lap().unwrap();
        assert_eq!(possible.sector_times, vec![29.0, 39.0, 49.0]);
        assert_eq!(possible.time(), Some(117.0));
    }

    #[test]
    fn best_lap_needs_valid_lap() {
        let empty = Participant::new();
        assert_eq!(aggregator(&empty).best_lap(), None);

        let cut = Participant::with_laps([timed(1, 80.0).with_cut(Cut::default()), Lap::new(2)]);
        assert_eq!(aggregator(&cut).best_lap(), None);

        let single = Participant::with_laps([Lap::new(1), timed(2, 95.0)]);
        assert_eq!(aggregator(&single).best_lap(), Some(1));
    }

    #[test]
    fn best_lap_skips_faster_cut_lap() {
        let participant =
            Participant::with_laps([timed(1, 80.0).with_cut(Cut::default()), timed(2, 90.0)]);
        assert_eq!(aggregator(&participant).best_lap(), Some(1));
    }

    #[test]
    fn laps_led_counts_first_positions() {
        let participant = Participant::with_laps([
            timed(1, 90.0).with_position(2),
            timed(2, 90.0).with_position(1),
            timed(3, 90.0).with_position(1),
            timed(4, 90.0),
        ]);
        assert_eq!(aggregator(&participant).number_of_laps_led(), 2);
    }

    #[test]
    fn best_lap_by_sector_may_lack_the_sector() {
        let participant = Participant::with_laps([timed(1, 90.0), timed(2, 91.0)]);
        let stats = aggregator(&participant);
        assert_eq!(stats.best_lap_by_sector(Sector::Two), Some(0));
        assert_eq!(participant.laps()[0].sector_time(Sector::Two), None);
        assert_eq!(stats.best_possible_lap(), None);
        assert_eq!(aggregator(&Participant::new()).best_lap_by_sector(Sector::One), None);
    }

    #[test]
    fn best_possible_lap_rejects_zero_sector() {
        let participant = Participant::with_laps([Lap::new(1).with_sectors([0.0, 40.0, 50.0])]);
        assert_eq!(aggregator(&participant).best_possible_lap(), None);
    }

    #[test]
    fn average_lap_excludes_pit_sectors() {
        let participant = Participant::with_laps([
            Lap::new(1).with_sectors([30.0, 40.0, 50.0]),
            Lap::new(2).with_sectors([30.0, 40.0, 70.0]).with_pit_lap(true),
            Lap::new(3).with_sectors([45.0, 40.0, 50.0]),
            Lap::new(4).with_sectors([32.0, 42.0, 52.0]),
        ]);
        let stats = aggregator(&participant);

        let excluded = stats.average_lap(true).unwrap();
        assert_eq!(excluded.sector_times, vec![30.6667, 40.5, 50.6667]);
        assert_eq!(excluded.time(), Some(121.8334));

        let included = stats.average_lap(false).unwrap();
        assert_eq!(included.sector_times, vec![34.25, 40.5, 55.5]);
        assert_eq!(included.time(), Some(130.25));
    }

    #[test]
    fn average_lap_absent_without_samples() {
        let participant = Participant::with_laps([Lap::new(1).with_sectors([30.0, 40.0])]);
        assert_eq!(aggregator(&participant).average_lap(false), None);

        let only_pit = Participant::with_laps([
            Lap::new(1).with_sectors([30.0, 40.0, 60.0]).with_pit_lap(true),
        ]);
        assert!(aggregator(&only_pit).average_lap(false).is_some());
        assert_eq!(aggregator(&only_pit).average_lap(true), None);
    }

    #[test]
    fn consistency_averages_distance_to_best() {
        let participant = Participant::with_laps([
            timed(1, 100.0),
            timed(2, 90.0),
            timed(3, 91.0),
            timed(4, 92.0),
            timed(5, 130.0),
            timed(6, 91.5).with_pit_lap(true),
            timed(7, 89.0).with_cut(Cut::default()),
        ]);
        let stats = aggregator(&participant);

        assert_eq!(stats.consistency(true), Some(1.5));
        assert_eq!(stats.consistency(false), Some(4.3333));
        assert_eq!(stats.consistency_percentage(true), Some(98.33));
    }

    #[test]
    fn consistency_ignores_first_lap_by_driving_order() {
        let participant = Participant::with_laps([timed(3, 95.0), timed(1, 90.0), timed(2, 92.0)]);
        assert_eq!(aggregator(&participant).consistency(true), Some(2.0));
    }

    #[test]
    fn consistency_absent_cases() {
        let single = Participant::with_laps([timed(1, 90.0), Lap::new(2)]);
        assert_eq!(aggregator(&single).consistency(false), None);

        let outside_window = Participant::with_laps([timed(1, 90.0), timed(2, 111.0)]);
        assert_eq!(aggregator(&outside_window).consistency(false), None);

        let just_inside = Participant::with_laps([timed(1, 90.0), timed(2, 110.9)]);
        assert_eq!(aggregator(&just_inside).consistency(false), Some(20.9));
    }

    #[test]
    fn consistency_percentage_absent_for_zero_consistency() {
        let participant = Participant::with_laps([timed(1, 90.0), timed(2, 90.0), timed(3, 90.0)]);
        let stats = aggregator(&participant);
        assert_eq!(stats.consistency(true), Some(0.0));
        assert_eq!(stats.consistency_percentage(true), None);
    }

    #[test]
    fn gap_between_participants_on_same_lap() {
        let winner = Participant::with_laps([timed(1, 90.0), timed(2, 90.0)]);
        let second = Participant::with_laps([timed(1, 91.0), timed(2, 90.5)]);

        assert_eq!(aggregator(&winner).total_time_gap(&second), 1.5);
        assert_eq!(aggregator(&second).total_time_gap(&winner), -1.5);
    }

    #[test]
    fn gap_to_lapped_participant_folds_in_leader_laps() {
        let mut leader = Participant::with_laps((1..=10).map(|n| timed(n, 100.0)));
        leader.total_time = Some(1000.0);
        let mut lapped = Participant::with_laps((1..=9).map(|n| timed(n, 111.0)));
        lapped.total_time = Some(1005.0);

        assert_eq!(aggregator(&leader).total_time_gap(&lapped), 105.0);
        assert_eq!(aggregator(&lapped).total_time_gap(&leader), -105.0);
    }

    #[test]
    fn gap_skips_lap_numbers_the_leader_lacks() {
        let leader = Participant::with_laps([timed(1, 100.0), timed(2, 100.0), timed(4, 100.0)]);
        let lapped = Participant::with_laps([timed(1, 150.0)]);

        // Leader has 3 laps: walks lap numbers 3 (missing) and 2
        assert_eq!(aggregator(&leader).total_time_gap(&lapped), -150.0 + 100.0);
    }

    proptest! {
        #[test]
        fn gap_is_antisymmetric_on_equal_lap_counts(
            a in prop::collection::vec(60.0f64..180.0, 1..15),
            b_offsets in prop::collection::vec(-5.0f64..5.0, 15)
        ) {
            let first =
                Participant::with_laps(a.iter().enumerate().map(|(i, t)| timed(i as u32 + 1, *t)));
            let second = Participant::with_laps(
                a.iter().zip(&b_offsets).enumerate().map(|(i, (t, o))| timed(i as u32 + 1, t + o)),
            );

            let forward = aggregator(&first).total_time_gap(&second);
            let backward = aggregator(&second).total_time_gap(&first);
            prop_assert_eq!(forward, -backward);
        }
    }
}
