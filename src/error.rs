//! Error types for the Attendance Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the punch ledger, identity verifier, and reconciliation
//! engine can report. No error here is process-fatal; each one carries enough
//! detail for the caller to decide whether to retry, switch verification
//! method, or escalate to a supervisor.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AttendanceState, PunchType};

/// The main error type for the Attendance Engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/attendance.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/attendance.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but holds an out-of-range value.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A request field was missing or malformed.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The requested punch would break clock-in/clock-out alternation.
    #[error(
        "Invalid punch sequence for enrollment {enrollment_id}: cannot {requested} while {current_state}"
    )]
    InvalidSequence {
        /// The enrollment whose ledger was checked.
        enrollment_id: Uuid,
        /// The state derived from the neighbouring punch.
        current_state: AttendanceState,
        /// The punch type that was requested.
        requested: PunchType,
    },

    /// The agent behind the enrollment is no longer active.
    #[error("Agent account {agent_id} is inactive")]
    AccountInactive {
        /// The inactive agent.
        agent_id: Uuid,
    },

    /// Identity evidence was supplied but did not verify.
    #[error("Identity verification failed: {message}")]
    VerificationFailed {
        /// A description of the failure.
        message: String,
    },

    /// Face verification was attempted without a stored reference descriptor.
    #[error("Enrollment {enrollment_id} has no reference face descriptor")]
    NoReferenceDescriptor {
        /// The enrollment lacking a descriptor.
        enrollment_id: Uuid,
    },

    /// The supplied PIN did not match the stored hash.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Live and reference descriptors have different lengths.
    #[error("Descriptor dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the stored reference descriptor.
        expected: usize,
        /// Length of the live descriptor.
        actual: usize,
    },

    /// An enrollment, punch, agent or department does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// A concurrent punch for the same enrollment won the race.
    #[error("Concurrent punch detected for enrollment {enrollment_id}; retry the request")]
    StateConflict {
        /// The contended enrollment.
        enrollment_id: Uuid,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },
}

/// Coarse classification of [`EngineError`] used by callers to pick a
/// recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input; report and do not retry.
    Validation,
    /// Alternation violated; needs a human correction.
    Sequence,
    /// Face/PIN mismatch; retry with the other method or re-capture.
    Verification,
    /// Unknown enrollment, punch, agent or department.
    NotFound,
    /// Lost a concurrent punch race; retry once after a short delay.
    StateConflict,
    /// Engine configuration problem.
    Configuration,
    /// Backing store failure.
    Storage,
}

impl EngineError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => ErrorKind::Configuration,
            EngineError::Validation { .. }
            | EngineError::DimensionMismatch { .. }
            | EngineError::AccountInactive { .. } => ErrorKind::Validation,
            EngineError::InvalidSequence { .. } => ErrorKind::Sequence,
            EngineError::VerificationFailed { .. }
            | EngineError::NoReferenceDescriptor { .. }
            | EngineError::InvalidCredential => ErrorKind::Verification,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::StateConflict { .. } => ErrorKind::StateConflict,
            EngineError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Returns true when the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StateConflict
    }

    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
