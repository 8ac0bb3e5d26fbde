//! Punch model and related types.
//!
//! A punch is a single clock-in or clock-out event in an enrollment's ledger,
//! together with the identity and location evidence captured at the kiosk and
//! the audit trail of any administrative correction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of attendance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchType {
    /// Start of a worked interval.
    ClockIn,
    /// End of a worked interval.
    ClockOut,
}

impl PunchType {
    /// Returns the punch type that must follow this one.
    pub fn counterpart(self) -> PunchType {
        match self {
            PunchType::ClockIn => PunchType::ClockOut,
            PunchType::ClockOut => PunchType::ClockIn,
        }
    }
}

impl std::fmt::Display for PunchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PunchType::ClockIn => write!(f, "CLOCK_IN"),
            PunchType::ClockOut => write!(f, "CLOCK_OUT"),
        }
    }
}

/// Whether an agent is currently clocked in, derived from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    /// Not clocked in. Initial state, and the state after a clock-out.
    Out,
    /// Clocked in.
    In,
}

impl AttendanceState {
    /// Derives the state implied by the most recent punch, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::{AttendanceState, PunchType};
    ///
    /// assert_eq!(AttendanceState::after(None), AttendanceState::Out);
    /// assert_eq!(AttendanceState::after(Some(PunchType::ClockIn)), AttendanceState::In);
    /// assert_eq!(AttendanceState::after(Some(PunchType::ClockOut)), AttendanceState::Out);
    /// ```
    pub fn after(last: Option<PunchType>) -> AttendanceState {
        match last {
            Some(PunchType::ClockIn) => AttendanceState::In,
            Some(PunchType::ClockOut) | None => AttendanceState::Out,
        }
    }
}

impl std::fmt::Display for AttendanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceState::Out => write!(f, "OUT"),
            AttendanceState::In => write!(f, "IN"),
        }
    }
}

/// How the agent's identity was established for a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Live face descriptor matched the reference descriptor.
    Face,
    /// PIN matched, or the punch was entered by an administrator.
    PinFallback,
}

/// Advisory geolocation captured by the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Reported accuracy radius in metres.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl Location {
    /// Returns true if the coordinates are finite and within WGS84 bounds.
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.accuracy.is_none_or(|a| a.is_finite() && a >= 0.0)
    }
}

/// Request details kept on a punch for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// The kiosk's user-agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// The client address as reported by the proxy.
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// A single clock-in or clock-out event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Punch {
    /// Unique identifier for the punch.
    pub id: Uuid,
    /// The enrollment whose ledger this punch belongs to.
    pub enrollment_id: Uuid,
    /// Clock-in or clock-out.
    pub punch_type: PunchType,
    /// When the punch took effect (server clock, or admin-supplied for manual entries).
    pub punch_time: DateTime<Utc>,
    /// How identity was established.
    pub verification_method: VerificationMethod,
    /// Face match confidence, present only for face-verified punches.
    #[serde(default)]
    pub face_confidence: Option<f32>,
    /// Latitude at punch time, if captured.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude at punch time, if captured.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Location accuracy in metres, if captured.
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// True only for punches created through the manual-entry path.
    #[serde(default)]
    pub is_manual: bool,
    /// Justification recorded with a manual entry or correction.
    #[serde(default)]
    pub manual_note: Option<String>,
    /// The administrator who last edited or created this punch.
    #[serde(default)]
    pub edited_by_id: Option<Uuid>,
    /// When the punch was last edited.
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    /// The system-recorded time before the first edit.
    #[serde(default)]
    pub original_punch_time: Option<DateTime<Utc>>,
    /// Kiosk user-agent, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Kiosk address, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Punch {
    /// Returns the location captured with the punch, if complete.
    pub fn location(&self) -> Option<Location> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
                accuracy: self.accuracy,
            }),
            _ => None,
        }
    }

    /// Returns true if an administrator has changed the punch time.
    pub fn was_edited(&self) -> bool {
        self.original_punch_time.is_some()
    }
}
