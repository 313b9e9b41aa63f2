use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;

use super::interaction::Interactive;

/// Shared handle to one live session. The mutex serializes work on that
/// session only; other keys are never blocked by it.
pub type Slot<V> = Arc<Mutex<V>>;

/// Concurrent per-feature session store with lazy TTL eviction.
///
/// Every access sweeps the table first, so an expired session is never
/// handed out. Sessions whose lock is currently held are in use and count as
/// live regardless of age.
pub struct SessionRegistry<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: DashMap<K, Slot<V>>,
}

impl<K, V> SessionRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Interactive,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(slot: &Slot<V>, ttl: Duration) -> bool {
        match slot.try_lock() {
            Ok(session) => session.age() <= ttl,
            Err(_) => true,
        }
    }

    /// Drops every expired, unlocked session. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, slot| Self::is_live(slot, ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            log::debug!("{}: swept {} expired sessions", self.name, removed);
        }
        removed
    }

    /// Live session for `key`, if any.
    pub fn get(&self, key: &K) -> Option<Slot<V>> {
        self.sweep();
        self.entries.get(key).map(|slot| Arc::clone(slot.value()))
    }

    /// Live session for `key`, or a fresh one from `make` replacing whatever
    /// expired entry was there.
    pub fn open(&self, key: K, make: impl FnOnce() -> V) -> Slot<V> {
        self.sweep();
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if !Self::is_live(entry.get(), self.ttl) {
                    entry.insert(Arc::new(Mutex::new(make())));
                }
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => Arc::clone(entry.insert(Arc::new(Mutex::new(make()))).value()),
        }
    }

    /// Inserts `value` only if `key` has no live session.
    ///
    /// Returns the new slot, or `None` when a live session already exists.
    pub fn try_create(&self, key: K, value: V) -> Option<Slot<V>> {
        self.sweep();
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if Self::is_live(entry.get(), self.ttl) {
                    return None;
                }
                let slot = Arc::new(Mutex::new(value));
                entry.insert(Arc::clone(&slot));
                Some(slot)
            }
            Entry::Vacant(entry) => {
                let slot = Arc::new(Mutex::new(value));
                entry.insert(Arc::clone(&slot));
                Some(slot)
            }
        }
    }

    /// Unconditionally replaces the session for `key`.
    pub fn insert(&self, key: K, value: V) -> Slot<V> {
        let slot = Arc::new(Mutex::new(value));
        self.entries.insert(key, Arc::clone(&slot));
        slot
    }

    pub fn remove(&self, key: &K) -> Option<Slot<V>> {
        self.entries.remove(key).map(|(_, slot)| slot)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
