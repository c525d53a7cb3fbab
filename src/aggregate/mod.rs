//! Uncached aggregation over the facts graph.
//!
//! The aggregators are plain functions of the data they borrow. They never
//! cache; [`crate::SessionStats`] wraps them and memoizes their results.

mod participant;
mod session;

pub use participant::ParticipantAggregator;
pub use session::{DirectQueries, ParticipantQueries, SessionAggregator};

/// Lap numbers start at 1; asking for lap 0 is a caller bug.
pub(crate) fn require_lap_number(lap_number: u32) {
    assert!(lap_number > 0, "lap numbers start at 1, got {lap_number}");
}
