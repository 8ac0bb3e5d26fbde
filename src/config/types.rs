//! Configuration types for the attendance engine.
//!
//! These structures are deserialized from `attendance.yaml` and, for the demo
//! server, from `seed.yaml`.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::models::{Agent, Department, Enrollment, ScheduleEntry};

/// Default face-match confidence required to accept a live descriptor.
pub const DEFAULT_FACE_MATCH_THRESHOLD: f32 = 0.6;

/// Default tolerance below which arrival/departure deltas count as on time.
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 1;

/// Default time after a scheduled start before a missing agent is a no-show.
pub const DEFAULT_NO_SHOW_GRACE_MINUTES: i64 = 15;

/// Default lifetime of a cached exception report.
pub const DEFAULT_EXCEPTION_CACHE_TTL_SECONDS: u64 = 30;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Verification and reconciliation thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Confidence in `(0, 1]` a face match must reach.
    #[serde(default = "default_face_match_threshold")]
    pub face_match_threshold: f32,
    /// Deltas strictly below this many minutes are treated as zero.
    #[serde(default = "default_tolerance_minutes")]
    pub tolerance_minutes: i64,
    /// Minutes after a scheduled start before a no-show is reported.
    #[serde(default = "default_no_show_grace_minutes")]
    pub no_show_grace_minutes: i64,
    /// Lifetime of a cached exception report; zero disables caching.
    #[serde(default = "default_exception_cache_ttl_seconds")]
    pub exception_cache_ttl_seconds: u64,
    /// Offset of the site's wall clock from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_face_match_threshold() -> f32 {
    DEFAULT_FACE_MATCH_THRESHOLD
}

fn default_tolerance_minutes() -> i64 {
    DEFAULT_TOLERANCE_MINUTES
}

fn default_no_show_grace_minutes() -> i64 {
    DEFAULT_NO_SHOW_GRACE_MINUTES
}

fn default_exception_cache_ttl_seconds() -> u64 {
    DEFAULT_EXCEPTION_CACHE_TTL_SECONDS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            face_match_threshold: DEFAULT_FACE_MATCH_THRESHOLD,
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            no_show_grace_minutes: DEFAULT_NO_SHOW_GRACE_MINUTES,
            exception_cache_ttl_seconds: DEFAULT_EXCEPTION_CACHE_TTL_SECONDS,
            utc_offset_minutes: 0,
            server: ServerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Returns the site's UTC offset.
    ///
    /// Falls back to UTC for an out-of-range offset; [`super::ConfigLoader`]
    /// rejects such values at load time.
    pub fn site_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Directory data used to seed the in-memory store of the demo server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    /// Departments.
    #[serde(default)]
    pub departments: Vec<Department>,
    /// Agents.
    #[serde(default)]
    pub agents: Vec<Agent>,
    /// Enrollments.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    /// Schedule entries.
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}
