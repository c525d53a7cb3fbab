//! Concurrent Query Tests
//!
//! Many readers share one engine. Each query must be computed once per cache
//! epoch no matter how many threads ask for it first.

use lapstats::{Lap, LapId, Participant, Sector, Session, SessionStats, SessionType};
use std::sync::Barrier;

fn race(participants: usize, laps: u32) -> Session {
    let entries = (0..participants)
        .map(|p| {
            Participant::with_laps((1..=laps).map(|n| {
                let spread = ((p * 11 + n as usize * 7) % 31) as f64 / 10.0;
                Lap::new(n)
                    .with_sectors([30.0 + spread, 40.0, 20.0 + spread / 2.0])
                    .with_position(((p + n as usize) % participants) as u32 + 1)
            }))
        })
        .collect();
    Session::new(SessionType::Race, entries)
}

#[test]
fn test_concurrent_readers_compute_each_query_once() {
    let stats = SessionStats::new(race(16, 40));
    let threads = 8;
    let barrier = Barrier::new(threads);

    let results: Vec<(Option<LapId>, Vec<LapId>, Option<usize>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let best = stats.best_lap().map(|lap| lap.id);
                    let grouped = stats
                        .best_laps_grouped_by_participant()
                        .iter()
                        .map(|lap| lap.id)
                        .collect();
                    let led = stats.led_most_participant().map(|p| p.index());
                    (best, grouped, led)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));

    // Session: best lap, grouped best laps, led most.
    // Participants: best lap and laps led for each of the 16.
    let cache = stats.cache_stats();
    assert_eq!(cache.misses, 3 + 16 * 2);
    assert_eq!(cache.entries as u64, cache.misses);
}

#[test]
fn test_concurrent_readers_on_cloned_engines_are_independent() {
    let stats = SessionStats::new(race(6, 12));
    let copies: Vec<SessionStats> = (0..4).map(|_| stats.clone()).collect();
    let stats = &stats;

    std::thread::scope(|scope| {
        for copy in &copies {
            scope.spawn(move || {
                let best = copy.best_lap_by_sector(Sector::One).map(|lap| lap.id);
                assert_eq!(best, stats.best_lap_by_sector(Sector::One).map(|lap| lap.id));
            });
        }
    });

    for copy in &copies {
        assert_eq!(copy.cache_stats().misses, 1);
    }
    assert_eq!(stats.cache_stats().misses, 1);
}
