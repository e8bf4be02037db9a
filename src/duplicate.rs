//! Suppression of repeated transaction submissions.
//!
//! A double click or a resubmitted form produces a second, identical request a
//! moment after the first. [DuplicateGuard] remembers when each
//! [duplicate key](crate::validation::create_duplicate_key) was last accepted
//! so the second request can be turned away without touching the database.

use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// How long after an accepted submission an identical one is rejected.
pub const DUPLICATE_WINDOW: Duration = Duration::from_millis(2000);

/// Entries older than this are dropped on the next check.
pub const CLEANUP_THRESHOLD: Duration = Duration::from_millis(5000);

/// A source of the current time.
pub trait Clock: Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// A [Clock] backed by the monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Remembers recently accepted submissions.
///
/// Cloning the guard is cheap and clones share the same registry.
#[derive(Debug, Clone)]
pub struct DuplicateGuard {
    recent: Arc<Mutex<HashMap<String, Instant>>>,
    clock: Arc<dyn Clock>,
}

impl Default for DuplicateGuard {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl DuplicateGuard {
    /// Create a guard with an empty registry that reads the time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            recent: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Whether `key` was accepted less than [DUPLICATE_WINDOW] ago.
    ///
    /// Entries older than [CLEANUP_THRESHOLD] are removed first.
    pub fn is_duplicate(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut recent = self.lock();

        recent.retain(|_, last_seen| now.saturating_duration_since(*last_seen) <= CLEANUP_THRESHOLD);

        match recent.get(key) {
            Some(last_seen) => now.saturating_duration_since(*last_seen) < DUPLICATE_WINDOW,
            None => false,
        }
    }

    /// Mark `key` as accepted now.
    ///
    /// Call this only once the submission has been persisted.
    pub fn record(&self, key: &str) {
        let now = self.clock.now();
        self.lock().insert(key.to_owned(), now);
    }

    /// The number of keys currently remembered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no keys are currently remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.recent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A [Clock] that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub(crate) fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
