//! Bounded, time-expiring cache.

use std::{
    hash::Hash,
    marker::PhantomData,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use indexmap::IndexMap;
use quanta::{Clock, Instant};
use satellite_error::GenericError;

use crate::hash::FastBuildHasher;

mod telemetry;
use self::telemetry::Telemetry;

/// Builder for creating a [`Cache`].
pub struct CacheBuilder<K, V> {
    identifier: String,
    capacity: NonZeroUsize,
    time_to_live: Option<Duration>,
    clock: Clock,
    telemetry_enabled: bool,
    _key: PhantomData<K>,
    _value: PhantomData<V>,
}

impl<K, V> CacheBuilder<K, V> {
    /// Creates a new `CacheBuilder` with the given cache identifier.
    ///
    /// The identifier is attached to all telemetry emitted by the cache. It should be unique, but that isn't enforced:
    /// caches sharing an identifier will have their metrics aggregated together.
    ///
    /// # Errors
    ///
    /// If the given cache identifier is empty, an error is returned.
    pub fn from_identifier<N: Into<String>>(identifier: N) -> Result<Self, GenericError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(GenericError::msg("cache identifier must not be empty"));
        }

        Ok(Self {
            identifier,
            capacity: NonZeroUsize::MAX,
            time_to_live: None,
            clock: Clock::new(),
            telemetry_enabled: true,
            _key: PhantomData,
            _value: PhantomData,
        })
    }

    /// Configures a `CacheBuilder` that is suitable for tests.
    ///
    /// Uses an identifier of "noop", unlimited capacity, no expiration, and disables telemetry.
    pub fn for_tests() -> Self {
        Self {
            identifier: "noop".to_string(),
            capacity: NonZeroUsize::MAX,
            time_to_live: None,
            clock: Clock::new(),
            telemetry_enabled: false,
            _key: PhantomData,
            _value: PhantomData,
        }
    }

    /// Sets the maximum number of entries the cache may hold.
    ///
    /// Defaults to unlimited capacity.
    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets how long an entry stays valid after it was inserted.
    ///
    /// Reading an entry does not extend its lifetime; only overwriting it does. If the given value is `None`, entries
    /// never expire.
    ///
    /// Defaults to no expiration.
    pub fn with_time_to_live(mut self, time_to_live: Option<Duration>) -> Self {
        self.time_to_live = time_to_live;
        self
    }

    /// Sets the clock used to stamp and check entry expiration.
    ///
    /// Mostly useful with [`Clock::mock`] to control time in tests.
    ///
    /// Defaults to [`Clock::new`].
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets whether or not to emit telemetry for this cache.
    ///
    /// Defaults to telemetry enabled.
    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Builds a [`Cache`] from the current configuration.
    pub fn build(self) -> Cache<K, V> {
        let telemetry = if self.telemetry_enabled {
            Telemetry::new(&self.identifier)
        } else {
            Telemetry::noop()
        };
        telemetry.capacity().set(self.capacity.get() as f64);

        Cache {
            state: Arc::new(Mutex::new(State {
                entries: IndexMap::with_hasher(FastBuildHasher::default()),
            })),
            capacity: self.capacity.get(),
            time_to_live: self.time_to_live,
            clock: self.clock,
            telemetry,
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

struct State<K, V> {
    // Ordered from least to most recently used.
    entries: IndexMap<K, Entry<V>, FastBuildHasher>,
}

impl<K, V> State<K, V>
where
    K: Eq + Hash,
{
    fn touch(&mut self, index: usize) -> usize {
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        last
    }

    fn remove_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

/// A concurrent, bounded cache with least-recently-used eviction and per-entry expiration.
///
/// Every entry is stamped with an absolute expiry time when it is inserted (insertion time plus the configured
/// time-to-live). Expiry is checked lazily: an entry whose expiry time has passed is treated as absent by
/// [`get`][Self::get] even if it hasn't been physically removed yet. When an insert would exceed the configured capacity,
/// expired entries are purged first, and only if the cache is still full is the least-recently-used live entry evicted.
///
/// The cache never holds more entries than its configured capacity.
///
/// Cloning a `Cache` is cheap and yields a handle to the same underlying storage.
pub struct Cache<K, V> {
    state: Arc<Mutex<State<K, V>>>,
    capacity: usize,
    time_to_live: Option<Duration>,
    clock: Clock,
    telemetry: Telemetry,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            capacity: self.capacity,
            time_to_live: self.time_to_live,
            clock: self.clock.clone(),
            telemetry: self.telemetry.clone(),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn lock_state(&self) -> MutexGuard<'_, State<K, V>> {
        self.state.lock().unwrap()
    }

    /// Returns the maximum number of entries the cache may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured time-to-live, if any.
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live
    }

    /// Returns the number of entries currently held.
    ///
    /// This includes expired entries that have not yet been purged.
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets a clone of the value for the given key.
    ///
    /// Returns `None` if the key is absent or its entry has expired. A hit marks the entry as most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.lock_state();

        let Some(index) = state.entries.get_index_of(key) else {
            self.telemetry.misses_total().increment(1);
            return None;
        };

        if state.entries[index].is_expired(now) {
            state.entries.shift_remove_index(index);
            self.telemetry.items_expired_total().increment(1);
            self.telemetry.misses_total().increment(1);
            self.telemetry.current_items().set(state.entries.len() as f64);
            return None;
        }

        let index = state.touch(index);
        self.telemetry.hits_total().increment(1);
        Some(state.entries[index].value.clone())
    }

    /// Inserts a value for the given key, overwriting any existing entry.
    ///
    /// The entry's expiry is reset to now plus the configured time-to-live, and it becomes the most recently used. If
    /// the key is new and the cache is full, expired entries are purged first; if none were expired, the least recently
    /// used entry is evicted.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        // A time-to-live too large to represent as an instant never expires.
        let expires_at = self.time_to_live.and_then(|ttl| now.checked_add(ttl));
        let mut state = self.lock_state();

        if let Some(index) = state.entries.get_index_of(&key) {
            let index = state.touch(index);
            if let Some((_, entry)) = state.entries.get_index_mut(index) {
                *entry = Entry { value, expires_at };
            }
            self.telemetry.items_inserted_total().increment(1);
            return;
        }

        if state.entries.len() >= self.capacity {
            let expired = state.remove_expired(now);
            self.telemetry.items_expired_total().increment(expired as u64);

            if state.entries.len() >= self.capacity {
                state.entries.shift_remove_index(0);
                self.telemetry.items_evicted_total().increment(1);
            }
        }

        state.entries.insert(key, Entry { value, expires_at });
        self.telemetry.items_inserted_total().increment(1);
        self.telemetry.current_items().set(state.entries.len() as f64);
    }

    /// Removes the entry for the given key, returning its value if it was present and not expired.
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.lock_state();

        let entry = state.entries.shift_remove(key)?;
        self.telemetry.items_removed_total().increment(1);
        self.telemetry.current_items().set(state.entries.len() as f64);

        (!entry.is_expired(now)).then_some(entry.value)
    }

    /// Removes all expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock_state();

        let expired = state.remove_expired(now);
        self.telemetry.items_expired_total().increment(expired as u64);
        self.telemetry.current_items().set(state.entries.len() as f64);
        expired
    }
}
