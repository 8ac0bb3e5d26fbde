//! Identity verification for kiosk punches.
//!
//! The verifier decides whether a live face descriptor or a PIN belongs to an
//! enrollment. It has no side effects; the ledger records the resulting
//! evidence on the punch.

mod face;
mod pin;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Enrollment, VerificationMethod};

pub use face::{confidence_from_distance, euclidean_distance};
pub use pin::{MAX_PIN_LENGTH, MIN_PIN_LENGTH, hash_pin, validate_pin, verify_pin};

/// Evidence presented at the kiosk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Credential {
    /// A live face descriptor from the kiosk camera.
    Face {
        /// The live descriptor.
        descriptor: Vec<f32>,
    },
    /// A PIN typed on the kiosk keypad.
    Pin {
        /// The PIN as entered.
        pin: String,
    },
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// The method used.
    pub method: VerificationMethod,
    /// Whether the evidence was accepted.
    pub success: bool,
    /// Face match confidence, for face attempts only.
    pub confidence: Option<f32>,
}

impl VerificationResult {
    /// A successful PIN verification.
    pub fn pin_verified() -> Self {
        Self {
            method: VerificationMethod::PinFallback,
            success: true,
            confidence: None,
        }
    }
}

/// Compares kiosk evidence against an enrollment.
#[derive(Debug, Clone, Copy)]
pub struct IdentityVerifier {
    face_match_threshold: f32,
}

impl IdentityVerifier {
    /// Creates a verifier accepting face matches at or above `face_match_threshold`.
    pub fn new(face_match_threshold: f32) -> Self {
        Self {
            face_match_threshold,
        }
    }

    /// Returns the configured face-match threshold.
    pub fn face_match_threshold(&self) -> f32 {
        self.face_match_threshold
    }

    /// Verifies `credential` against `enrollment`.
    ///
    /// A face attempt always yields a result carrying its confidence, with
    /// `success` reflecting the threshold. A PIN attempt either succeeds or
    /// fails with [`EngineError::InvalidCredential`].
    ///
    /// # Errors
    ///
    /// - [`EngineError::NoReferenceDescriptor`] for a face attempt against an
    ///   enrollment without a descriptor. The caller should fall back to PIN.
    /// - [`EngineError::DimensionMismatch`] if descriptor lengths differ.
    /// - [`EngineError::InvalidCredential`] for a wrong PIN.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::Enrollment;
    /// use attendance_engine::verification::{Credential, IdentityVerifier};
    /// use uuid::Uuid;
    ///
    /// let enrollment = Enrollment {
    ///     id: Uuid::new_v4(),
    ///     agent_id: Uuid::new_v4(),
    ///     reference_descriptor: Some(vec![0.1, 0.2, 0.3]),
    ///     pin_hash: String::new(),
    ///     reference_photo_url: None,
    /// };
    /// let verifier = IdentityVerifier::new(0.6);
    /// let result = verifier
    ///     .verify(&enrollment, &Credential::Face { descriptor: vec![0.1, 0.2, 0.35] })
    ///     .unwrap();
    /// assert!(result.success);
    /// ```
    pub fn verify(
        &self,
        enrollment: &Enrollment,
        credential: &Credential,
    ) -> EngineResult<VerificationResult> {
        match credential {
            Credential::Face { descriptor } => self.verify_face(enrollment, descriptor),
            Credential::Pin { pin } => {
                verify_pin(&enrollment.pin_hash, pin)?;
                debug!(enrollment_id = %enrollment.id, "PIN verified");
                Ok(VerificationResult::pin_verified())
            }
        }
    }

    fn verify_face(
        &self,
        enrollment: &Enrollment,
        live: &[f32],
    ) -> EngineResult<VerificationResult> {
        let reference = enrollment
            .reference_descriptor
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(EngineError::NoReferenceDescriptor {
                enrollment_id: enrollment.id,
            })?;

        let distance = euclidean_distance(reference, live)?;
        let confidence = confidence_from_distance(distance);
        let success = confidence >= self.face_match_threshold;
        debug!(
            enrollment_id = %enrollment.id,
            distance,
            confidence,
            success,
            "Face descriptor compared"
        );

        Ok(VerificationResult {
            method: VerificationMethod::Face,
            success,
            confidence: Some(confidence),
        })
    }
}
