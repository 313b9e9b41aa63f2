use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

/// Keyed cooldown locks for public chats.
///
/// A key is "locked" until its deadline passes. Used to stop group members
/// from spamming menu re-renders: `"<chat id> <menu title>"` can only be
/// taken once per cooldown window.
#[derive(Default)]
pub struct CooldownLocks {
    /// Deadline per key; a key is free once `Instant::now() >= deadline`
    locks: DashMap<String, Instant>,
}

impl CooldownLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes `key` for `duration` unless it is still held.
    ///
    /// Returns `true` when the caller acquired the lock.
    pub fn try_lock_for(&self, key: &str, duration: Duration) -> bool {
        let now = Instant::now();
        match self.locks.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return false;
                }
                entry.insert(now + duration);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now + duration);
                true
            }
        }
    }

    /// Remaining time before `key` frees up, `None` if it is free already.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let deadline = *self.locks.get(key)?;
        let now = Instant::now();
        (now < deadline).then(|| deadline - now)
    }

    /// Releases `key` immediately.
    pub fn release(&self, key: &str) {
        self.locks.remove(key);
    }

    /// Drops expired locks. Only memory hygiene; expired entries are
    /// already treated as free by `try_lock_for`.
    pub fn tidy(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.locks.retain(|_, deadline| {
            let live = *deadline > now;
            removed += usize::from(!live);
            live
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_lock_blocks_until_deadline() {
        let locks = CooldownLocks::new();
        assert!(locks.try_lock_for("1 Games", Duration::from_secs(3)));
        assert!(!locks.try_lock_for("1 Games", Duration::from_secs(3)));
        // other chats are independent
        assert!(locks.try_lock_for("2 Games", Duration::from_secs(3)));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(locks.try_lock_for("1 Games", Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_and_release() {
        let locks = CooldownLocks::new();
        assert_eq!(locks.remaining("k"), None);
        locks.try_lock_for("k", Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(locks.remaining("k"), Some(Duration::from_secs(6)));
        locks.release("k");
        assert!(locks.try_lock_for("k", Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tidy_removes_only_expired() {
        let locks = CooldownLocks::new();
        locks.try_lock_for("short", Duration::from_secs(1));
        locks.try_lock_for("long", Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(locks.tidy(), 1);
        assert_eq!(locks.len(), 1);
        assert!(locks.remaining("long").is_some());
    }

    #[test]
    fn test_tidy_counts_only_its_own_removals() {
        let locks = CooldownLocks::new();
        for i in 0..100 {
            locks.try_lock_for(&format!("old {i}"), Duration::ZERO);
        }

        let removed = std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..1_000 {
                    locks.try_lock_for(&format!("new {i}"), Duration::from_secs(60));
                }
            });
            (0..50).map(|_| locks.tidy()).sum::<usize>()
        });

        assert_eq!(removed + locks.tidy(), 100);
        assert_eq!(locks.len(), 1_000);
    }
}
