//! Outcome record for one provisioning run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Final outcome of a provisioning or teardown run.
///
/// Built exactly once, after the run finishes. `address` can be `None`
/// even on success when the platform exposes no public endpoint for the
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Whether the environment came up healthy.
    pub success: bool,
    /// Public address serving traffic, when one was resolved.
    pub address: Option<String>,
    /// Remote service name the run operated on.
    pub service_name: String,
    /// Description of the first fatal step. `None` on success.
    pub error: Option<String>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl DeploymentResult {
    /// Successful run, optionally with a resolved public address.
    pub fn ok(service_name: impl Into<String>, address: Option<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            address,
            service_name: service_name.into(),
            error: None,
            elapsed,
        }
    }

    /// Failed run carrying the reason the pipeline stopped.
    pub fn failed(
        service_name: impl Into<String>,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            address: None,
            service_name: service_name.into(),
            error: Some(error.into()),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_carries_address_and_no_error() {
        let result = DeploymentResult::ok(
            "pr-1234-abc123f-service",
            Some("54.123.45.67".to_string()),
            Duration::from_secs(90),
        );
        assert!(result.success);
        assert_eq!(result.address.as_deref(), Some("54.123.45.67"));
        assert_eq!(result.error, None);
    }

    #[test]
    fn failed_carries_error_and_no_address() {
        let result = DeploymentResult::failed(
            "pr-1234-abc123f-service",
            "service creation rejected",
            Duration::from_secs(12),
        );
        assert!(!result.success);
        assert_eq!(result.address, None);
        assert_eq!(result.error.as_deref(), Some("service creation rejected"));
    }

    #[test]
    fn serializes_for_ci_consumers() {
        let result = DeploymentResult::ok(
            "pr-1234-abc123f-service",
            Some("54.123.45.67".to_string()),
            Duration::from_secs(1),
        );
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("54.123.45.67"));

        let back: DeploymentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
