//! Failure taxonomy for lifecycle runs.

use std::time::Duration;

use greenroom_platform::PlatformError;
use thiserror::Error;

/// Why a provisioning run stopped.
///
/// Internal plumbing: the controller folds these into
/// [`greenroom_core::DeploymentResult`] at its boundary, so expected
/// remote failures never escape `create_environment` as `Err`. The
/// display strings are what operators read in the result, which is why
/// a deploy rejection and a failed health check are distinct variants.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The old service never finished draining. Creating the new one
    /// now would be rejected as non-idempotent, so the run stops here.
    #[error("timed out waiting for deletion of {service} after {waited:?}")]
    DeletionTimeout { service: String, waited: Duration },

    #[error("task definition rejected: {0}")]
    TaskDefinition(PlatformError),

    #[error("service creation rejected: {0}")]
    Create(PlatformError),

    #[error("deploy rejected: {0}")]
    Deploy(PlatformError),

    #[error("service {0} did not reach a stable state")]
    Stability(String),

    #[error("{service} deployed but failed health checks after {attempts} attempts")]
    Unhealthy { service: String, attempts: u32 },
}
