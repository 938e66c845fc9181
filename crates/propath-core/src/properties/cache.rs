//! Expiring cache
//!
//! A concurrent map whose entries expire after an idle window measured from
//! their last access. Expired entries read as misses and are dropped on
//! access; a full sweep runs at most once per window, triggered by reads.
//! Values are computed outside any lock, so concurrent misses may compute
//! twice; the first stored value wins.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

/// Default idle window: ten minutes
pub const DEFAULT_IDLE: Duration = Duration::from_secs(600);

/// Time source
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

struct Slot<V> {
    value: V,
    last_access: Mutex<Instant>,
}

impl<V> Slot<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            last_access: Mutex::new(now),
        }
    }

    fn is_expired(&self, now: Instant, idle: Duration) -> bool {
        now.saturating_duration_since(*self.last_access.lock()) >= idle
    }
}

/// Concurrent map with sliding idle expiry
pub struct ExpiringCache<K, V> {
    entries: DashMap<K, Slot<V>>,
    idle: Duration,
    clock: Arc<dyn Clock>,
    last_sweep: Mutex<Instant>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Cache on the wall clock
    pub fn new(idle: Duration) -> Self {
        Self::with_clock(idle, Arc::new(SystemClock))
    }

    /// Cache on an explicit clock
    pub fn with_clock(idle: Duration, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            entries: DashMap::new(),
            idle,
            clock,
            last_sweep: Mutex::new(now),
        }
    }

    /// Idle window
    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Time source
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Live value for `key`, refreshing its last access
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.maybe_sweep(now);

        {
            let slot = self.entries.get(key)?;
            let mut last = slot.last_access.lock();
            if now.saturating_duration_since(*last) < self.idle {
                *last = now;
                return Some(slot.value.clone());
            }
        }

        self.entries
            .remove_if(key, |_, slot| slot.is_expired(now, self.idle));
        None
    }

    /// Store `value` unless a live value is already present
    ///
    /// Returns whichever value ends up stored.
    pub fn insert(&self, key: K, value: V) -> V {
        let now = self.clock.now();
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.idle) {
                    occupied.insert(Slot::new(value.clone(), now));
                    value
                } else {
                    let slot = occupied.get();
                    *slot.last_access.lock() = now;
                    slot.value.clone()
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value.clone(), now));
                value
            }
        }
    }

    /// Cached value, or compute and store one
    ///
    /// `load` runs without holding any lock; its failure is returned and
    /// nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = load()?;
        Ok(self.insert(key.clone(), value))
    }

    /// Drop an entry
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, slot)| slot.value)
    }

    /// Drop every expired entry, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        *self.last_sweep.lock() = now;
        self.sweep_at(now)
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| !slot.is_expired(now, self.idle));
        before.saturating_sub(self.entries.len())
    }

    fn maybe_sweep(&self, now: Instant) {
        {
            let mut last = self.last_sweep.lock();
            if now.saturating_duration_since(*last) < self.idle {
                return;
            }
            *last = now;
        }
        let removed = self.sweep_at(now);
        trace!(removed, "swept expired cache entries");
    }

    /// Number of stored entries, live or not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }
}
