//! Configuration loading and management for the Attendance Engine.
//!
//! This module loads the engine configuration (face-match threshold,
//! on-time tolerance, no-show grace window, cache lifetime, site UTC offset)
//! from YAML, plus optional seed data for the demo server.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config").unwrap();
//! println!("Grace window: {} min", loader.config().no_show_grace_minutes);
//! ```

mod loader;
mod types;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader};
pub use types::{
    DEFAULT_EXCEPTION_CACHE_TTL_SECONDS, DEFAULT_FACE_MATCH_THRESHOLD,
    DEFAULT_NO_SHOW_GRACE_MINUTES, DEFAULT_TOLERANCE_MINUTES, EngineConfig, SeedData,
    ServerConfig,
};
