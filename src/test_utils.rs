//! Test utilities for session fixtures and generated sessions
//!
//! Shared by unit tests and, with the `benchmark` feature, the benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::types::{Lap, Participant, Session, SessionType, Vehicle};

/// Directory holding the YAML session fixtures
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Load a session from a YAML file in [`fixtures_dir`].
///
/// Equal vehicles and drivers are interned so they compare by identity the
/// same way as in a session built in code.
///
/// # Errors
///
/// Returns an error naming the fixture when it is missing or does not parse.
pub fn load_session_fixture(file_name: &str) -> anyhow::Result<Session> {
    let path = fixtures_dir().join(file_name);
    let yaml = std::fs::read_to_string(&path)
        .with_context(|| format!("Missing session fixture: {}", path.display()))?;
    let mut session: Session = serde_yaml_ng::from_str(&yaml)
        .with_context(|| format!("Invalid session fixture: {}", path.display()))?;
    session.intern_vehicles();
    session.intern_drivers();
    Ok(session)
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Generate a race with `participants` entries of `laps` laps each.
///
/// The output is deterministic. Lap times spread over about seven seconds,
/// every third participant pits every fifteenth lap, every fifth lap of every
/// seventh participant has a missing sector, and classes alternate between
/// GT3 and GT4.
pub fn generate_session(participants: usize, laps: u32) -> Session {
    let gt3 = Arc::new(Vehicle::new("GT3 car", Some("GT3")));
    let gt4 = Arc::new(Vehicle::new("GT4 car", Some("GT4")));

    let entries = (0..participants)
        .map(|p| {
            let vehicle = if p % 2 == 0 { &gt3 } else { &gt4 };
            let mut elapsed = p as f64 * 0.25;
            let mut participant = Participant::new().with_vehicle(Arc::clone(vehicle));
            participant.position = Some(p as u32 + 1);
            participant.grid_position = Some(((p * 3) % participants.max(1)) as u32 + 1);

            for number in 1..=laps {
                let variation = ((p * 7 + number as usize * 13) % 53) as f64 * 0.137;
                let s1 = 30.0 + (variation * 0.3 * 10_000.0).round() / 10_000.0;
                let s2 = 40.0 + (variation * 0.5 * 10_000.0).round() / 10_000.0;
                let s3 = 20.0 + (variation * 0.2 * 10_000.0).round() / 10_000.0;

                let mut lap = Lap::new(number)
                    .with_elapsed_seconds(elapsed)
                    .with_position(((p + number as usize) % participants) as u32 + 1)
                    .with_vehicle(Arc::clone(vehicle))
                    .with_pit_lap(p % 3 == 0 && number % 15 == 0);

                lap = if p % 7 == 3 && number % 5 == 0 {
                    lap.with_sectors([s1, s2])
                } else {
                    lap.with_sectors([s1, s2, s3])
                };

                elapsed += s1 + s2 + s3;
                participant.push_lap(lap);
            }
            participant
        })
        .collect();

    let mut session = Session::new(SessionType::Race, entries);
    session.name = Some(format!("Generated race {participants}x{laps}"));
    session.max_laps = Some(laps);
    session
}
