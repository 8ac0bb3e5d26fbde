//! Application state for the Attendance Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{ConfigLoader, EngineConfig};
use crate::ledger::{Clock, PunchLedger, SystemClock};
use crate::reconciliation::{ExceptionCache, ReconciliationEngine, ReconciliationSettings};
use crate::store::{AgentDirectory, EnrollmentStore, PunchStore, ScheduleStore};
use crate::verification::IdentityVerifier;

struct Services {
    config: EngineConfig,
    verifier: IdentityVerifier,
    ledger: PunchLedger,
    engine: ReconciliationEngine,
    cache: ExceptionCache,
    enrollments: Arc<dyn EnrollmentStore>,
    schedule: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
}

/// Shared application state.
///
/// Holds the verifier, ledger, and reconciliation engine wired to one store,
/// along with the exception cache.
#[derive(Clone)]
pub struct AppState {
    services: Arc<Services>,
}

impl AppState {
    /// Creates application state over `store` using the system clock.
    pub fn new<S>(config: ConfigLoader, store: Arc<S>) -> Self
    where
        S: AgentDirectory + EnrollmentStore + PunchStore + ScheduleStore + 'static,
    {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Creates application state with an explicit clock.
    pub fn with_clock<S>(config: ConfigLoader, store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: AgentDirectory + EnrollmentStore + PunchStore + ScheduleStore + 'static,
    {
        let config = config.into_config();
        let ledger = PunchLedger::new(store.clone(), store.clone(), store.clone(), clock.clone());
        let engine = ReconciliationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            ReconciliationSettings::from(&config),
        );
        let services = Services {
            verifier: IdentityVerifier::new(config.face_match_threshold),
            cache: ExceptionCache::new(Duration::from_secs(config.exception_cache_ttl_seconds)),
            ledger,
            engine,
            enrollments: store.clone(),
            schedule: store,
            clock,
            config,
        };
        Self {
            services: Arc::new(services),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.services.config
    }

    /// Returns the identity verifier.
    pub fn verifier(&self) -> &IdentityVerifier {
        &self.services.verifier
    }

    /// Returns the punch ledger.
    pub fn ledger(&self) -> &PunchLedger {
        &self.services.ledger
    }

    /// Returns the reconciliation engine.
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.services.engine
    }

    /// Returns the exception report cache.
    pub fn cache(&self) -> &ExceptionCache {
        &self.services.cache
    }

    /// Returns the enrollment store.
    pub fn enrollments(&self) -> &dyn EnrollmentStore {
        self.services.enrollments.as_ref()
    }

    /// Returns the schedule store.
    pub fn schedule(&self) -> &dyn ScheduleStore {
        self.services.schedule.as_ref()
    }

    /// Returns the current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.services.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FixedClock;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_state_uses_injected_clock() {
        let config = ConfigLoader::from_config(EngineConfig {
            exception_cache_ttl_seconds: 0,
            ..EngineConfig::default()
        })
        .unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 1, 14, 20, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(instant));
        let state = AppState::with_clock(config, Arc::new(InMemoryStore::new()), clock);

        assert_eq!(state.now(), instant);
        assert!(state.cache().ttl().is_zero());
    }
}
