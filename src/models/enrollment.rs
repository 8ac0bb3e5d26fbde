//! Enrollment model.
//!
//! An enrollment holds the identity evidence an agent registered with the
//! kiosk. It is created by the admin enrollment flow; the engine only replaces
//! the descriptor when a supervisor re-captures it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity evidence registered for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier for the enrollment.
    pub id: Uuid,
    /// The agent this enrollment belongs to (one-to-one).
    pub agent_id: Uuid,
    /// Reference face descriptor, absent until a face has been captured.
    #[serde(default)]
    pub reference_descriptor: Option<Vec<f32>>,
    /// Salted PIN hash, see [`crate::verification::hash_pin`].
    pub pin_hash: String,
    /// URL of the reference photo shown to supervisors.
    #[serde(default)]
    pub reference_photo_url: Option<String>,
}

impl Enrollment {
    /// Returns true if a reference face descriptor has been captured.
    pub fn has_face(&self) -> bool {
        self.reference_descriptor
            .as_ref()
            .is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_face() {
        let mut enrollment = Enrollment {
            id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            reference_descriptor: None,
            pin_hash: String::new(),
            reference_photo_url: None,
        };
        assert!(!enrollment.has_face());

        enrollment.reference_descriptor = Some(vec![]);
        assert!(!enrollment.has_face());

        enrollment.reference_descriptor = Some(vec![0.1, 0.2]);
        assert!(enrollment.has_face());
    }
}
