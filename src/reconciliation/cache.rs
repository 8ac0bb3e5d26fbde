//! Short-lived cache of exception reports.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::ExceptionSet;

use super::engine::ExceptionFilter;

type CacheKey = (NaiveDate, ExceptionFilter);

#[derive(Debug)]
struct Cached {
    computed_at: Instant,
    set: ExceptionSet,
}

#[derive(Debug, Default)]
struct Entries {
    /// Bumped by every `clear`; a compute that straddles a bump is discarded.
    generation: u64,
    reports: HashMap<CacheKey, Cached>,
}

/// Caches computed exception sets per `(date, filter)` for a fixed TTL.
///
/// A zero TTL disables caching. Callers clear the cache whenever the ledger
/// changes.
#[derive(Debug)]
pub struct ExceptionCache {
    ttl: Duration,
    entries: Mutex<Entries>,
}

impl ExceptionCache {
    /// Creates a cache holding reports for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Returns the configured lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a fresh cached report, if any.
    pub fn get(&self, date: NaiveDate, filter: &ExceptionFilter) -> Option<ExceptionSet> {
        let mut entries = self.lock();
        let key = (date, *filter);
        match entries.reports.get(&key) {
            Some(cached) if cached.computed_at.elapsed() < self.ttl => Some(cached.set.clone()),
            Some(_) => {
                entries.reports.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a report, dropping any that have expired.
    pub fn insert(&self, date: NaiveDate, filter: &ExceptionFilter, set: ExceptionSet) {
        let mut entries = self.lock();
        self.store(&mut entries, date, filter, set);
    }

    fn store(
        &self,
        entries: &mut Entries,
        date: NaiveDate,
        filter: &ExceptionFilter,
        set: ExceptionSet,
    ) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        entries
            .reports
            .retain(|_, cached| cached.computed_at.elapsed() < ttl);
        entries.reports.insert(
            (date, *filter),
            Cached {
                computed_at: Instant::now(),
                set,
            },
        );
    }

    /// Returns the cached report or computes and stores a new one.
    ///
    /// The computed report is returned but not stored if the cache was
    /// cleared while it was being computed.
    pub fn get_or_compute<F>(
        &self,
        date: NaiveDate,
        filter: &ExceptionFilter,
        compute: F,
    ) -> EngineResult<ExceptionSet>
    where
        F: FnOnce() -> EngineResult<ExceptionSet>,
    {
        if let Some(set) = self.get(date, filter) {
            return Ok(set);
        }
        let generation = self.lock().generation;
        let set = compute()?;

        let mut entries = self.lock();
        if entries.generation == generation {
            self.store(&mut entries, date, filter, set.clone());
        }
        Ok(set)
    }

    /// Drops every cached report.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.generation = entries.generation.wrapping_add(1);
        entries.reports.clear();
    }

    /// Returns the number of stored reports, fresh or not.
    pub fn len(&self) -> usize {
        self.lock().reports.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::cell::Cell;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_second_lookup_is_served_from_cache() {
        let cache = ExceptionCache::new(Duration::from_secs(30));
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(ExceptionSet::new(date()))
        };

        cache.get_or_compute(date(), &ExceptionFilter::all(), compute).unwrap();
        cache.get_or_compute(date(), &ExceptionFilter::all(), compute).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_filters_are_cached_separately() {
        let cache = ExceptionCache::new(Duration::from_secs(30));
        cache.insert(date(), &ExceptionFilter::all(), ExceptionSet::new(date()));

        let other = ExceptionFilter::agent(uuid::Uuid::new_v4());
        assert!(cache.get(date(), &other).is_none());
        assert!(cache.get(date(), &ExceptionFilter::all()).is_some());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = ExceptionCache::new(Duration::from_secs(30));
        cache.insert(date(), &ExceptionFilter::all(), ExceptionSet::new(date()));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let cache = ExceptionCache::new(Duration::ZERO);
        cache.insert(date(), &ExceptionFilter::all(), ExceptionSet::new(date()));
        assert!(cache.is_empty());
        assert!(cache.get(date(), &ExceptionFilter::all()).is_none());
    }

    #[test]
    fn test_compute_errors_are_not_cached() {
        let cache = ExceptionCache::new(Duration::from_secs(30));
        let result = cache.get_or_compute(date(), &ExceptionFilter::all(), || {
            Err(EngineError::not_found("Agent", "x"))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_during_compute_discards_result() {
        let cache = ExceptionCache::new(Duration::from_secs(30));
        let set = cache
            .get_or_compute(date(), &ExceptionFilter::all(), || {
                // A punch lands while the report is being built.
                cache.clear();
                Ok(ExceptionSet::new(date()))
            })
            .unwrap();

        assert_eq!(set.date, date());
        assert!(cache.get(date(), &ExceptionFilter::all()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_reports() {
        let cache = ExceptionCache::new(Duration::from_millis(20));
        for offset in 0..5 {
            let day = date() + chrono::Duration::days(offset);
            cache.insert(day, &ExceptionFilter::all(), ExceptionSet::new(day));
        }
        assert_eq!(cache.len(), 5);

        std::thread::sleep(Duration::from_millis(40));
        let later = date() + chrono::Duration::days(30);
        cache.insert(later, &ExceptionFilter::all(), ExceptionSet::new(later));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(later, &ExceptionFilter::all()).is_some());
    }
}
