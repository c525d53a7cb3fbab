//! Query result caching
//!
//! [`QueryCache`] stores the result of every derived query asked of a session
//! or one of its participants. It is a correctness mechanism for one query
//! surface, not a general purpose cache: entries never expire and are never
//! evicted.
//!
//! ## Epochs
//!
//! Each cache is one epoch. Cloning a cache does not copy its entries; the
//! clone starts a new, empty epoch. Owners that duplicate their facts therefore
//! never see results computed for the original.
//!
//! ## Concurrency
//!
//! Results live in typed slot maps of `Arc<OnceLock<V>>`. The map lock is only
//! held while a slot is looked up or inserted; the computation itself runs
//! under the slot's `OnceLock`, so concurrent first access to one key computes
//! it once while unrelated keys, including the participant queries a session
//! query depends on, proceed independently.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ memoize(key)                                 │
//! │   read lock ──► slot found? ──► get_or_init  │
//! │       │                            │         │
//! │       ▼                            ▼         │
//! │   write lock ──► insert slot    compute once │
//! └──────────────────────────────────────────────┘
//! ```

mod key;

pub use key::{CacheKey, Query, Receiver};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

use crate::types::{Lap, LapId, Vehicle};

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Slots for one result type
pub(crate) struct Slots<V> {
    map: RwLock<HashMap<CacheKey, Arc<OnceLock<V>>>>,
}

impl<V> Default for Slots<V> {
    fn default() -> Self {
        Self { map: RwLock::new(HashMap::new()) }
    }
}

impl<V> Slots<V> {
    fn slot(&self, key: CacheKey) -> Arc<OnceLock<V>> {
        let existing = self.map.read().unwrap_or_else(PoisonError::into_inner).get(&key).cloned();
        if let Some(slot) = existing {
            return slot;
        }

        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key).or_default())
    }

    fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Counters describing one cache epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Identifier of the epoch, unique per cache instance
    pub epoch: u64,
    /// Queries answered from a stored result
    pub hits: u64,
    /// Queries that had to be computed
    pub misses: u64,
    /// Stored keys
    pub entries: usize,
}

/// Memoized results of one session and its participants
pub struct QueryCache {
    epoch: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    pub(crate) lap_lists: Slots<Arc<[LapId]>>,
    pub(crate) laps: Slots<Option<LapId>>,
    pub(crate) synthetic_laps: Slots<Option<Arc<Lap>>>,
    pub(crate) seconds: Slots<Option<f64>>,
    pub(crate) totals: Slots<f64>,
    pub(crate) counts: Slots<usize>,
    pub(crate) numbers: Slots<u32>,
    pub(crate) participants: Slots<Option<usize>>,
    pub(crate) participant_lists: Slots<Arc<[usize]>>,
    pub(crate) vehicles: Slots<Arc<[Arc<Vehicle>]>>,
}

impl QueryCache {
    /// Start a new, empty epoch
    pub fn new() -> Self {
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        debug!(epoch, "Starting query cache epoch");
        Self {
            epoch,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            lap_lists: Slots::default(),
            laps: Slots::default(),
            synthetic_laps: Slots::default(),
            seconds: Slots::default(),
            totals: Slots::default(),
            counts: Slots::default(),
            numbers: Slots::default(),
            participants: Slots::default(),
            participant_lists: Slots::default(),
            vehicles: Slots::default(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Return the stored result for `key`, computing it on first access.
    ///
    /// `None` results are stored like any other value and are not recomputed.
    pub(crate) fn memoize<V: Clone>(
        &self,
        slots: &Slots<V>,
        key: CacheKey,
        compute: impl FnOnce() -> V,
    ) -> V {
        let slot = slots.slot(key);
        let mut computed = false;
        let value = slot
            .get_or_init(|| {
                computed = true;
                compute()
            })
            .clone();

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(epoch = self.epoch, ?key, "Computed query");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(epoch = self.epoch, ?key, "Query cache hit");
        }

        value
    }

    /// Snapshot of the epoch counters
    pub fn stats(&self) -> CacheStats {
        let entries = self.lap_lists.len()
            + self.laps.len()
            + self.synthetic_laps.len()
            + self.seconds.len()
            + self.totals.len()
            + self.counts.len()
            + self.numbers.len()
            + self.participants.len()
            + self.participant_lists.len()
            + self.vehicles.len();

        CacheStats {
            epoch: self.epoch,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning starts a new epoch: entries are never shared with the source.
impl Clone for QueryCache {
    fn clone(&self) -> Self {
        let fresh = Self::new();
        debug!(from = self.epoch, to = fresh.epoch, "Query cache duplicated into new epoch");
        fresh
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").field("stats", &self.stats()).finish()
    }
}
