//! Wire-shaped platform types and resource state classification.
//!
//! These mirror what the platform reports, flattened to the fields the
//! lifecycle actually reads. A real [`crate::ClusterApi`] implementation
//! deserializes platform responses into them.

use serde::{Deserialize, Serialize};

/// One service as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub name: String,
    /// Raw lifecycle status string. Partial responses may omit it.
    pub status: Option<String>,
    pub running_count: u32,
    pub desired_count: u32,
}

/// One entry of a describe response's failures list ("MISSING" etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub arn: String,
    pub reason: String,
}

/// Response to a service describe call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeServices {
    pub services: Vec<ServiceDescription>,
    pub failures: Vec<ServiceFailure>,
}

impl DescribeServices {
    /// The description for `name`, if the platform returned one.
    pub fn named(&self, name: &str) -> Option<&ServiceDescription> {
        self.services.iter().find(|s| s.name == name)
    }

    /// The failure reason for `name`, if it appears in the failures list.
    /// Failure entries carry the full resource ARN, so match by suffix.
    pub fn failure_reason(&self, name: &str) -> Option<&str> {
        self.failures
            .iter()
            .find(|f| f.arn == name || f.arn.ends_with(name))
            .map(|f| f.reason.as_str())
    }
}

/// One task as reported by the platform, flattened to its status and
/// attached network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    pub arn: String,
    pub last_status: String,
    pub interface_id: Option<String>,
}

/// Payload for creating a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub task_definition: String,
    pub desired_count: u32,
    /// User the environment is provisioned for; tagged onto the service.
    pub requested_by: String,
}

// ── Resource state ──────────────────────────────────────────────────

/// Classification of a named remote resource at one instant.
///
/// Always derived fresh from a describe response; never cached across
/// calls, because the remote resource changes underneath us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// No resource with the name, or nothing usable reported for it.
    Absent,
    /// Serving traffic and owning its name.
    Active,
    /// Asynchronously deleting. Still owns its name.
    Draining,
    /// Any other reported status (INACTIVE etc.). Does not own the name.
    Other,
}

impl ResourceState {
    /// Classify a raw status string. A missing status means the response
    /// carried nothing usable for the name, which reads as absent.
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            None => ResourceState::Absent,
            Some("ACTIVE") => ResourceState::Active,
            Some("DRAINING") => ResourceState::Draining,
            Some(_) => ResourceState::Other,
        }
    }

    /// Whether a resource in this state still owns its name, i.e. the
    /// platform would reject creating a service under the same name.
    pub fn blocks_creation(self) -> bool {
        matches!(self, ResourceState::Active | ResourceState::Draining)
    }
}
