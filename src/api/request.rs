//! Request types for the Attendance Engine API.
//!
//! JSON bodies and query strings accepted by the HTTP endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ManualPunch;
use crate::models::{Location, PunchType};
use crate::reconciliation::ExceptionFilter;
use crate::verification::Credential;

/// Request body for `POST /punches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchRequest {
    /// The enrollment punching.
    pub enrollment_id: Uuid,
    /// Clock-in or clock-out.
    pub punch_type: PunchType,
    /// Face descriptor or PIN.
    pub credential: Credential,
    /// Advisory location from the kiosk.
    #[serde(default)]
    pub location: Option<Location>,
}

/// Request body for `PATCH /punches/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPunchRequest {
    /// The corrected time.
    pub punch_time: DateTime<Utc>,
    /// Why the punch was changed.
    pub note: String,
    /// The administrator making the change.
    pub editor_id: Uuid,
}

/// Request body for `POST /punches/manual`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualPunchRequest {
    /// The enrollment the punch belongs to.
    pub enrollment_id: Uuid,
    /// Clock-in or clock-out.
    pub punch_type: PunchType,
    /// When the punch takes effect.
    pub punch_time: DateTime<Utc>,
    /// Why the punch was entered by hand.
    pub note: String,
    /// The administrator entering the punch.
    pub editor_id: Uuid,
}

impl From<ManualPunchRequest> for ManualPunch {
    fn from(req: ManualPunchRequest) -> Self {
        ManualPunch {
            enrollment_id: req.enrollment_id,
            punch_type: req.punch_type,
            punch_time: req.punch_time,
            note: req.note,
            editor_id: req.editor_id,
        }
    }
}

/// Request body for `PUT /enrollments/:id/descriptor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorRequest {
    /// The newly captured reference descriptor.
    pub descriptor: Vec<f32>,
}

/// Query string for `GET /schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleQuery {
    /// The day to list.
    pub date: NaiveDate,
    /// Restrict to one agent.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
}

/// Query string for `GET /punches`.
#[derive(Debug, Clone, Deserialize)]
pub struct PunchQuery {
    /// List one enrollment's full ledger.
    #[serde(default)]
    pub enrollment_id: Option<Uuid>,
    /// Range start, inclusive.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Range end, exclusive.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// Query string for `GET /exceptions` and `GET /summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    /// The day to reconcile.
    pub date: NaiveDate,
    /// Restrict to one agent.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    /// Restrict to one department.
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

impl ReportQuery {
    /// The filter portion of the query.
    pub fn filter(&self) -> ExceptionFilter {
        ExceptionFilter {
            agent_id: self.agent_id,
            department_id: self.department_id,
        }
    }
}

/// Query string for `DELETE /punches/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePunchQuery {
    /// The administrator deleting the punch.
    pub editor_id: Uuid,
}
