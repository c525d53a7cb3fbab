//! Lap orderings used by every ranking in the crate
//!
//! Both orderings are ascending and place laps without the compared value
//! after all laps that have it. Sorting goes through `slice::sort_by`, which is
//! stable: equal laps keep the order they were supplied in, and no further
//! tie-break is applied.

use std::cmp::Ordering;

use crate::types::{Lap, Sector};

/// Order two laps by effective time, laps without time last
pub fn compare_by_time(a: &Lap, b: &Lap) -> Ordering {
    compare_optional(a.time(), b.time())
}

/// Order two laps by one sector time, laps without that sector last
pub fn compare_by_sector(a: &Lap, b: &Lap, sector: Sector) -> Ordering {
    compare_optional(a.sector_time(sector), b.sector_time(sector))
}

/// Order two optional values ascending, absent values last
pub fn compare_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Stable sort of lap handles by the time of the lap each one resolves to
pub fn sort_by_time<'l, T>(items: &mut [T], lap_of: impl Fn(&T) -> &'l Lap) {
    items.sort_by(|a, b| compare_by_time(lap_of(a), lap_of(b)));
}

/// Stable sort of lap handles by one sector of the lap each one resolves to
pub fn sort_by_sector<'l, T>(items: &mut [T], sector: Sector, lap_of: impl Fn(&T) -> &'l Lap) {
    items.sort_by(|a, b| compare_by_sector(lap_of(a), lap_of(b), sector));
}
