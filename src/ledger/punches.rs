//! The punch ledger.
//!
//! Accepts kiosk punches, administrator corrections, and manual entries for
//! each enrollment while keeping the clock-in/clock-out alternation intact.
//! Writes for one enrollment are serialized; writes for different
//! enrollments never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AgentStatus, AttendanceState, Enrollment, Location, Punch, PunchType, RequestMetadata,
    VerificationMethod,
};
use crate::store::{AgentDirectory, EnrollmentStore, PunchStore};
use crate::verification::VerificationResult;

use super::clock::Clock;
use super::state::transition;

/// A kiosk punch request, after identity verification.
#[derive(Debug, Clone)]
pub struct RecordPunch {
    /// The enrollment punching.
    pub enrollment_id: Uuid,
    /// Clock-in or clock-out.
    pub punch_type: PunchType,
    /// The verifier's verdict.
    pub evidence: VerificationResult,
    /// Advisory location, if the kiosk captured one.
    pub location: Option<Location>,
    /// Audit metadata from the request.
    pub metadata: RequestMetadata,
}

/// An administrator correction of an existing punch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchEdit {
    /// The punch to correct.
    pub punch_id: Uuid,
    /// The corrected time.
    pub new_time: DateTime<Utc>,
    /// Justification; required.
    pub note: String,
    /// The administrator making the change.
    pub editor_id: Uuid,
}

/// An administrator-entered punch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPunch {
    /// The enrollment the punch belongs to.
    pub enrollment_id: Uuid,
    /// Clock-in or clock-out.
    pub punch_type: PunchType,
    /// When the punch should take effect.
    pub punch_time: DateTime<Utc>,
    /// Justification; required.
    pub note: String,
    /// The administrator entering the punch.
    pub editor_id: Uuid,
}

/// The per-enrollment punch ledger.
pub struct PunchLedger {
    agents: Arc<dyn AgentDirectory>,
    enrollments: Arc<dyn EnrollmentStore>,
    punches: Arc<dyn PunchStore>,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for PunchLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PunchLedger").finish_non_exhaustive()
    }
}

fn require_note(note: &str) -> EngineResult<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(
            "note",
            "a note is required for manual changes",
        ));
    }
    Ok(trimmed.to_string())
}

impl PunchLedger {
    /// Creates a ledger over the given stores and clock.
    pub fn new(
        agents: Arc<dyn AgentDirectory>,
        enrollments: Arc<dyn EnrollmentStore>,
        punches: Arc<dyn PunchStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            agents,
            enrollments,
            punches,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, enrollment_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(enrollment_id).or_default().clone()
    }

    fn enrollment(&self, enrollment_id: Uuid) -> EngineResult<Enrollment> {
        self.enrollments
            .get_enrollment(enrollment_id)?
            .ok_or_else(|| EngineError::not_found("Enrollment", enrollment_id))
    }

    fn ensure_active(&self, enrollment: &Enrollment) -> EngineResult<()> {
        let agent = self
            .agents
            .get_agent(enrollment.agent_id)?
            .ok_or_else(|| EngineError::not_found("Agent", enrollment.agent_id))?;
        if !agent.is_active {
            warn!(agent_id = %agent.id, "Punch rejected for inactive agent");
            return Err(EngineError::AccountInactive { agent_id: agent.id });
        }
        Ok(())
    }

    /// Records a kiosk punch at the server's current time.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown enrollment or agent.
    /// - `AccountInactive` if the agent is inactive.
    /// - `VerificationFailed` if the evidence was not accepted.
    /// - `InvalidSequence` if the punch does not follow the latest punch.
    /// - `StateConflict` if another writer appended first.
    pub fn record_punch(&self, request: RecordPunch) -> EngineResult<Punch> {
        let enrollment = self.enrollment(request.enrollment_id)?;
        self.ensure_active(&enrollment)?;

        if !request.evidence.success {
            warn!(
                enrollment_id = %enrollment.id,
                method = ?request.evidence.method,
                confidence = ?request.evidence.confidence,
                "Punch rejected: identity not verified"
            );
            return Err(EngineError::VerificationFailed {
                message: match request.evidence.confidence {
                    Some(confidence) => format!(
                        "face match confidence {:.3} is below the acceptance threshold",
                        confidence
                    ),
                    None => "identity evidence was not accepted".to_string(),
                },
            });
        }

        let location = request.location.filter(|location| {
            let plausible = location.is_plausible();
            if !plausible {
                warn!(
                    enrollment_id = %enrollment.id,
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "Discarding implausible punch location"
                );
            }
            plausible
        });

        let lock = self.lock_for(enrollment.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let latest = self.punches.latest_for_enrollment(enrollment.id)?;
        let current_state = AttendanceState::after(latest.as_ref().map(|p| p.punch_type));
        if transition(current_state, request.punch_type).is_none() {
            warn!(
                enrollment_id = %enrollment.id,
                current_state = %current_state,
                requested = %request.punch_type,
                "Punch rejected: invalid sequence"
            );
            return Err(EngineError::InvalidSequence {
                enrollment_id: enrollment.id,
                current_state,
                requested: request.punch_type,
            });
        }

        let now = self.clock.now();
        if let Some(latest) = &latest {
            if latest.punch_time > now {
                return Err(EngineError::validation(
                    "punch_time",
                    format!(
                        "latest punch at {} is later than the server time {}",
                        latest.punch_time, now
                    ),
                ));
            }
        }

        let (face_confidence, verification_method) = match request.evidence.method {
            VerificationMethod::Face => (request.evidence.confidence, VerificationMethod::Face),
            VerificationMethod::PinFallback => (None, VerificationMethod::PinFallback),
        };

        let punch = Punch {
            id: Uuid::new_v4(),
            enrollment_id: enrollment.id,
            punch_type: request.punch_type,
            punch_time: now,
            verification_method,
            face_confidence,
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
            accuracy: location.and_then(|l| l.accuracy),
            is_manual: false,
            manual_note: None,
            edited_by_id: None,
            edited_at: None,
            original_punch_time: None,
            user_agent: request.metadata.user_agent,
            ip_address: request.metadata.ip_address,
            created_at: now,
        };

        let saved = self
            .punches
            .append(punch, latest.as_ref().map(|p| p.id))?;
        info!(
            enrollment_id = %saved.enrollment_id,
            punch_id = %saved.id,
            punch_type = %saved.punch_type,
            method = ?saved.verification_method,
            "Punch recorded"
        );
        Ok(saved)
    }

    /// Corrects the time of an existing punch.
    ///
    /// The first edit preserves the system-recorded time in
    /// `original_punch_time`; later edits leave it untouched. `is_manual` is
    /// not changed, so corrected kiosk punches remain kiosk punches.
    pub fn edit_punch(&self, edit: PunchEdit) -> EngineResult<Punch> {
        let note = require_note(&edit.note)?;
        let now = self.clock.now();
        if edit.new_time > now {
            return Err(EngineError::validation(
                "new_time",
                "corrected time cannot be in the future",
            ));
        }

        let existing = self
            .punches
            .get_punch(edit.punch_id)?
            .ok_or_else(|| EngineError::not_found("Punch", edit.punch_id))?;

        let lock = self.lock_for(existing.enrollment_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut punch = self
            .punches
            .get_punch(edit.punch_id)?
            .ok_or_else(|| EngineError::not_found("Punch", edit.punch_id))?;

        if punch.original_punch_time.is_none() {
            punch.original_punch_time = Some(punch.punch_time);
        }
        let previous_time = punch.punch_time;
        punch.punch_time = edit.new_time;
        punch.manual_note = Some(note);
        punch.edited_by_id = Some(edit.editor_id);
        punch.edited_at = Some(now);

        let saved = self.punches.update(punch)?;
        info!(
            punch_id = %saved.id,
            editor_id = %edit.editor_id,
            previous_time = %previous_time,
            new_time = %saved.punch_time,
            "Punch edited"
        );
        Ok(saved)
    }

    /// Inserts an administrator-entered punch at `punch_time`.
    ///
    /// Identity verification is bypassed, but the punch must alternate with
    /// both its predecessor and its successor by time.
    pub fn create_manual_punch(&self, manual: ManualPunch) -> EngineResult<Punch> {
        let note = require_note(&manual.note)?;
        let enrollment = self.enrollment(manual.enrollment_id)?;
        let now = self.clock.now();
        if manual.punch_time > now {
            return Err(EngineError::validation(
                "punch_time",
                "manual punches cannot be in the future",
            ));
        }

        let lock = self.lock_for(enrollment.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let ledger = self.punches.list_for_enrollment(enrollment.id)?;
        let split = ledger.partition_point(|p| p.punch_time <= manual.punch_time);
        let predecessor = split.checked_sub(1).map(|i| &ledger[i]);
        let successor = ledger.get(split);

        let before = AttendanceState::after(predecessor.map(|p| p.punch_type));
        let after =
            transition(before, manual.punch_type).ok_or(EngineError::InvalidSequence {
                enrollment_id: enrollment.id,
                current_state: before,
                requested: manual.punch_type,
            })?;
        if let Some(next) = successor {
            if transition(after, next.punch_type).is_none() {
                warn!(
                    enrollment_id = %enrollment.id,
                    successor_id = %next.id,
                    successor_type = %next.punch_type,
                    "Manual punch would break alternation with the following punch"
                );
                return Err(EngineError::InvalidSequence {
                    enrollment_id: enrollment.id,
                    current_state: after,
                    requested: next.punch_type,
                });
            }
        }

        let punch = Punch {
            id: Uuid::new_v4(),
            enrollment_id: enrollment.id,
            punch_type: manual.punch_type,
            punch_time: manual.punch_time,
            verification_method: VerificationMethod::PinFallback,
            face_confidence: None,
            latitude: None,
            longitude: None,
            accuracy: None,
            is_manual: true,
            manual_note: Some(note),
            edited_by_id: Some(manual.editor_id),
            edited_at: Some(now),
            original_punch_time: None,
            user_agent: None,
            ip_address: None,
            created_at: now,
        };

        let saved = self.punches.insert(punch)?;
        info!(
            enrollment_id = %saved.enrollment_id,
            punch_id = %saved.id,
            punch_type = %saved.punch_type,
            editor_id = %manual.editor_id,
            "Manual punch created"
        );
        Ok(saved)
    }

    /// Hard-deletes an erroneous manual punch. Kiosk punches cannot be deleted.
    pub fn delete_manual_punch(&self, punch_id: Uuid, editor_id: Uuid) -> EngineResult<Punch> {
        let existing = self
            .punches
            .get_punch(punch_id)?
            .ok_or_else(|| EngineError::not_found("Punch", punch_id))?;
        if !existing.is_manual {
            return Err(EngineError::validation(
                "punch_id",
                "only manually entered punches can be deleted",
            ));
        }

        let lock = self.lock_for(existing.enrollment_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let deleted = self.punches.delete(punch_id)?;
        info!(
            punch_id = %deleted.id,
            enrollment_id = %deleted.enrollment_id,
            editor_id = %editor_id,
            "Manual punch deleted"
        );
        Ok(deleted)
    }

    /// Returns the full ledger of an enrollment in time order.
    pub fn punches_for_enrollment(&self, enrollment_id: Uuid) -> EngineResult<Vec<Punch>> {
        self.enrollment(enrollment_id)?;
        self.punches.list_for_enrollment(enrollment_id)
    }

    /// Returns every punch with `from <= punch_time < to`.
    pub fn punches_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<Punch>> {
        if to <= from {
            return Err(EngineError::validation("to", "must be after 'from'"));
        }
        self.punches.list_between(from, to)
    }

    /// Derives an enrollment's current state from its latest punch.
    pub fn current_state(
        &self,
        enrollment_id: Uuid,
    ) -> EngineResult<(AttendanceState, Option<Punch>)> {
        let latest = self.punches.latest_for_enrollment(enrollment_id)?;
        Ok((
            AttendanceState::after(latest.as_ref().map(|p| p.punch_type)),
            latest,
        ))
    }

    /// Returns the live status of every enrolled agent, derived on read.
    pub fn status_board(&self) -> EngineResult<Vec<AgentStatus>> {
        let mut board = Vec::new();
        for agent in self.agents.list_agents()? {
            let Some(enrollment) = self.enrollments.enrollment_for_agent(agent.id)? else {
                continue;
            };
            let (state, latest) = self.current_state(enrollment.id)?;
            board.push(AgentStatus {
                agent: agent.as_ref_label(),
                enrollment_id: enrollment.id,
                state,
                since: latest.map(|p| p.punch_time),
            });
        }
        board.sort_by(|a, b| {
            a.agent
                .name
                .cmp(&b.agent.name)
                .then(a.agent.agent_id.cmp(&b.agent.agent_id))
        });
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FixedClock;
    use crate::models::Agent;
    use crate::store::InMemoryStore;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        ledger: PunchLedger,
        agent_id: Uuid,
        enrollment_id: Uuid,
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let agent_id = Uuid::new_v4();
        let enrollment_id = Uuid::new_v4();
        store
            .create_agent(Agent {
                id: agent_id,
                employee_id: "E-100".to_string(),
                name: "Priya Raman".to_string(),
                department_id: None,
                is_active: true,
            })
            .unwrap();
        store
            .create_enrollment(Enrollment {
                id: enrollment_id,
                agent_id,
                reference_descriptor: None,
                pin_hash: String::new(),
                reference_photo_url: None,
            })
            .unwrap();
        let clock = Arc::new(FixedClock::new(at(9, 0)));
        let ledger = PunchLedger::new(store.clone(), store.clone(), store.clone(), clock.clone());
        Fixture {
            store,
            clock,
            ledger,
            agent_id,
            enrollment_id,
        }
    }

    fn kiosk(enrollment_id: Uuid, punch_type: PunchType) -> RecordPunch {
        RecordPunch {
            enrollment_id,
            punch_type,
            evidence: VerificationResult::pin_verified(),
            location: None,
            metadata: RequestMetadata::default(),
        }
    }

    fn manual(enrollment_id: Uuid, punch_type: PunchType, time: DateTime<Utc>) -> ManualPunch {
        ManualPunch {
            enrollment_id,
            punch_type,
            punch_time: time,
            note: "forgot to punch".to_string(),
            editor_id: Uuid::new_v4(),
        }
    }

    // ==========================================================================
    // Kiosk punches
    // ==========================================================================

    #[test]
    fn test_first_punch_must_be_clock_in() {
        let f = fixture();
        let result = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockOut));

        match result {
            Err(EngineError::InvalidSequence {
                current_state,
                requested,
                ..
            }) => {
                assert_eq!(current_state, AttendanceState::Out);
                assert_eq!(requested, PunchType::ClockOut);
            }
            other => panic!("Expected InvalidSequence, got {:?}", other),
        }
    }

    #[test]
    fn test_clock_in_twice_is_rejected() {
        let f = fixture();
        f.ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        f.clock.advance(Duration::minutes(5));

        let second = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn));
        assert!(matches!(second, Err(EngineError::InvalidSequence { .. })));
        assert_eq!(
            f.store.list_for_enrollment(f.enrollment_id).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_punch_uses_server_clock_and_evidence() {
        let f = fixture();
        f.clock.set(at(9, 12));
        let punch = f
            .ledger
            .record_punch(RecordPunch {
                evidence: VerificationResult {
                    method: VerificationMethod::Face,
                    success: true,
                    confidence: Some(0.87),
                },
                location: Some(Location {
                    latitude: -33.86,
                    longitude: 151.21,
                    accuracy: Some(15.0),
                }),
                metadata: RequestMetadata {
                    user_agent: Some("kiosk/1.0".to_string()),
                    ip_address: Some("10.0.0.7".to_string()),
                },
                ..kiosk(f.enrollment_id, PunchType::ClockIn)
            })
            .unwrap();

        assert_eq!(punch.punch_time, at(9, 12));
        assert_eq!(punch.verification_method, VerificationMethod::Face);
        assert_eq!(punch.face_confidence, Some(0.87));
        assert_eq!(punch.latitude, Some(-33.86));
        assert_eq!(punch.accuracy, Some(15.0));
        assert_eq!(punch.user_agent.as_deref(), Some("kiosk/1.0"));
        assert!(!punch.is_manual);
    }

    #[test]
    fn test_implausible_location_is_dropped_not_rejected() {
        let f = fixture();
        let punch = f
            .ledger
            .record_punch(RecordPunch {
                location: Some(Location {
                    latitude: 200.0,
                    longitude: 10.0,
                    accuracy: None,
                }),
                ..kiosk(f.enrollment_id, PunchType::ClockIn)
            })
            .unwrap();
        assert_eq!(punch.location(), None);
    }

    #[test]
    fn test_failed_verification_is_rejected() {
        let f = fixture();
        let result = f.ledger.record_punch(RecordPunch {
            evidence: VerificationResult {
                method: VerificationMethod::Face,
                success: false,
                confidence: Some(0.31),
            },
            ..kiosk(f.enrollment_id, PunchType::ClockIn)
        });
        assert!(matches!(
            result,
            Err(EngineError::VerificationFailed { .. })
        ));
    }

    #[test]
    fn test_inactive_agent_is_rejected() {
        let f = fixture();
        let mut agent = f.store.get_agent(f.agent_id).unwrap().unwrap();
        agent.is_active = false;
        f.store.update_agent(agent).unwrap();

        let result = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn));
        assert!(matches!(result, Err(EngineError::AccountInactive { .. })));
    }

    #[test]
    fn test_unknown_enrollment() {
        let f = fixture();
        let result = f.ledger.record_punch(kiosk(Uuid::new_v4(), PunchType::ClockIn));
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_status_is_derived_from_latest_punch() {
        let f = fixture();
        assert_eq!(
            f.ledger.current_state(f.enrollment_id).unwrap().0,
            AttendanceState::Out
        );

        f.ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        let board = f.ledger.status_board().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].state, AttendanceState::In);
        assert_eq!(board[0].since, Some(at(9, 0)));

        f.clock.set(at(17, 0));
        f.ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockOut))
            .unwrap();
        assert_eq!(
            f.ledger.current_state(f.enrollment_id).unwrap().0,
            AttendanceState::Out
        );
    }

    #[test]
    fn test_concurrent_clock_ins_only_one_succeeds() {
        let f = fixture();
        let ledger = Arc::new(f.ledger);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                let enrollment_id = f.enrollment_id;
                std::thread::spawn(move || {
                    ledger
                        .record_punch(kiosk(enrollment_id, PunchType::ClockIn))
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(
            f.store.list_for_enrollment(f.enrollment_id).unwrap().len(),
            1
        );
    }

    // ==========================================================================
    // Edits
    // ==========================================================================

    #[test]
    fn test_edit_preserves_first_original_time() {
        let f = fixture();
        let punch = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        f.clock.set(at(12, 0));
        let editor_id = Uuid::new_v4();

        let first = f
            .ledger
            .edit_punch(PunchEdit {
                punch_id: punch.id,
                new_time: at(8, 55),
                note: "kiosk was offline".to_string(),
                editor_id,
            })
            .unwrap();
        assert_eq!(first.original_punch_time, Some(at(9, 0)));

        let second = f
            .ledger
            .edit_punch(PunchEdit {
                punch_id: punch.id,
                new_time: at(8, 50),
                note: "second correction".to_string(),
                editor_id,
            })
            .unwrap();

        assert_eq!(second.punch_time, at(8, 50));
        assert_eq!(second.original_punch_time, Some(at(9, 0)));
        assert_eq!(second.edited_by_id, Some(editor_id));
        assert_eq!(second.edited_at, Some(at(12, 0)));
        assert_eq!(second.manual_note.as_deref(), Some("second correction"));
        assert!(!second.is_manual);
    }

    #[test]
    fn test_edit_requires_note() {
        let f = fixture();
        let punch = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();

        let result = f.ledger.edit_punch(PunchEdit {
            punch_id: punch.id,
            new_time: at(8, 55),
            note: "   ".to_string(),
            editor_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_edit_unknown_punch() {
        let f = fixture();
        let result = f.ledger.edit_punch(PunchEdit {
            punch_id: Uuid::new_v4(),
            new_time: at(8, 55),
            note: "fix".to_string(),
            editor_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_edit_into_future_is_rejected() {
        let f = fixture();
        let punch = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        let result = f.ledger.edit_punch(PunchEdit {
            punch_id: punch.id,
            new_time: at(10, 0),
            note: "fix".to_string(),
            editor_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    // ==========================================================================
    // Manual entries
    // ==========================================================================

    #[test]
    fn test_manual_punch_fills_missing_clock_out() {
        let f = fixture();
        f.ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        f.clock.set(at(18, 0));

        let punch = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockOut, at(17, 0)))
            .unwrap();

        assert!(punch.is_manual);
        assert_eq!(punch.verification_method, VerificationMethod::PinFallback);
        assert_eq!(punch.face_confidence, None);
        assert_eq!(punch.manual_note.as_deref(), Some("forgot to punch"));
        assert_eq!(punch.original_punch_time, None);
    }

    #[test]
    fn test_manual_punch_between_neighbours() {
        let f = fixture();
        f.clock.set(at(20, 0));
        // IN 09:00 and OUT 17:00 entered by hand.
        for (punch_type, time) in [
            (PunchType::ClockIn, at(9, 0)),
            (PunchType::ClockOut, at(17, 0)),
        ] {
            f.ledger
                .create_manual_punch(manual(f.enrollment_id, punch_type, time))
                .unwrap();
        }

        // A clock-in between IN 09:00 and OUT 17:00 breaks alternation.
        let inside = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockIn, at(13, 0)));
        assert!(matches!(inside, Err(EngineError::InvalidSequence { .. })));

        // So does a clock-out, because its successor is also a clock-out.
        let out = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockOut, at(12, 0)));
        assert!(matches!(out, Err(EngineError::InvalidSequence { .. })));

        // After the last clock-out a clock-in is fine.
        f.ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockIn, at(18, 0)))
            .unwrap();
    }

    #[test]
    fn test_manual_punch_before_first_punch_must_be_clock_in() {
        let f = fixture();
        f.clock.set(at(12, 0));
        f.ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockOut, at(11, 0)))
            .unwrap_err();

        f.ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();

        // A clock-in at 08:00 would be followed by the kiosk clock-in at 12:00.
        let early = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockIn, at(8, 0)));
        assert!(matches!(early, Err(EngineError::InvalidSequence { .. })));
    }

    #[test]
    fn test_manual_punch_in_future_is_rejected() {
        let f = fixture();
        let result = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockIn, at(10, 0)));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_delete_only_manual_punches() {
        let f = fixture();
        let kiosk_punch = f
            .ledger
            .record_punch(kiosk(f.enrollment_id, PunchType::ClockIn))
            .unwrap();
        f.clock.set(at(18, 0));
        let manual_punch = f
            .ledger
            .create_manual_punch(manual(f.enrollment_id, PunchType::ClockOut, at(17, 0)))
            .unwrap();

        let editor_id = Uuid::new_v4();
        assert!(matches!(
            f.ledger.delete_manual_punch(kiosk_punch.id, editor_id),
            Err(EngineError::Validation { .. })
        ));

        let deleted = f
            .ledger
            .delete_manual_punch(manual_punch.id, editor_id)
            .unwrap();
        assert_eq!(deleted.id, manual_punch.id);
        assert_eq!(
            f.ledger
                .punches_for_enrollment(f.enrollment_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_punches_between_requires_ordered_range() {
        let f = fixture();
        assert!(f.ledger.punches_between(at(10, 0), at(9, 0)).is_err());
        assert!(f.ledger.punches_between(at(0, 0), at(23, 0)).unwrap().is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn punch_type() -> impl Strategy<Value = PunchType> {
            prop_oneof![Just(PunchType::ClockIn), Just(PunchType::ClockOut)]
        }

        proptest! {
            #[test]
            fn accepted_punches_always_alternate(
                requests in prop::collection::vec(punch_type(), 1..30)
            ) {
                let f = fixture();
                for punch_type in requests {
                    f.clock.advance(Duration::minutes(1));
                    let _ = f.ledger.record_punch(kiosk(f.enrollment_id, punch_type));
                }

                let ledger = f.store.list_for_enrollment(f.enrollment_id).unwrap();
                let mut state = AttendanceState::Out;
                for punch in &ledger {
                    state = transition(state, punch.punch_type)
                        .expect("ledger must alternate");
                }
                let (derived, _) = f.ledger.current_state(f.enrollment_id).unwrap();
                prop_assert_eq!(derived, state);
            }
        }
    }
}
