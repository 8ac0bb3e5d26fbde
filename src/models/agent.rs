//! Agent and department models.
//!
//! Agents are owned by the employee-management subsystem. The engine only
//! reads them, to check that an account is active and to label exceptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AttendanceState;

/// A support agent who works scheduled shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier for the agent.
    pub id: Uuid,
    /// The employer-issued employee number.
    pub employee_id: String,
    /// Display name, used to order exception lists.
    pub name: String,
    /// The department the agent belongs to, if any.
    #[serde(default)]
    pub department_id: Option<Uuid>,
    /// Inactive agents cannot punch.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Agent {
    /// Returns the identity block embedded in exceptions.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::Agent;
    /// use uuid::Uuid;
    ///
    /// let agent = Agent {
    ///     id: Uuid::nil(),
    ///     employee_id: "E-100".to_string(),
    ///     name: "Ada Lovelace".to_string(),
    ///     department_id: None,
    ///     is_active: true,
    /// };
    /// assert_eq!(agent.as_ref_label().employee_id, "E-100");
    /// ```
    pub fn as_ref_label(&self) -> AgentRef {
        AgentRef {
            agent_id: self.id,
            employee_id: self.employee_id.clone(),
            name: self.name.clone(),
        }
    }
}

/// A department grouping agents, used only as a reconciliation filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Unique identifier for the department.
    pub id: Uuid,
    /// Department name.
    pub name: String,
}

/// The agent identity carried by every exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    /// The agent's identifier.
    pub agent_id: Uuid,
    /// The agent's employee number.
    pub employee_id: String,
    /// The agent's display name.
    pub name: String,
}

/// Live clocked-in/out status for the supervisor dashboard.
///
/// Always derived from the ledger's most recent punch on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    /// The agent this status describes.
    pub agent: AgentRef,
    /// The enrollment whose ledger was read.
    pub enrollment_id: Uuid,
    /// Current state derived from the last punch.
    pub state: AttendanceState,
    /// Time of the punch that put the agent into this state.
    pub since: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_agent_defaults_to_active() {
        let json = r#"{
            "id": "6f1c2c1e-8f7a-4d7e-9d4b-4f6b1f0a2c11",
            "employee_id": "E-100",
            "name": "Ada Lovelace"
        }"#;

        let agent: Agent = serde_json::from_str(json).unwrap();
        assert!(agent.is_active);
        assert_eq!(agent.department_id, None);
    }

    #[test]
    fn test_agent_ref_copies_identity() {
        let agent = Agent {
            id: Uuid::new_v4(),
            employee_id: "E-200".to_string(),
            name: "Grace Hopper".to_string(),
            department_id: Some(Uuid::new_v4()),
            is_active: false,
        };

        let label = agent.as_ref_label();
        assert_eq!(label.agent_id, agent.id);
        assert_eq!(label.name, "Grace Hopper");
    }
}
