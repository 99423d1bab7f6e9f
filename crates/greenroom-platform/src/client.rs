//! The cluster API trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::api::{DescribeServices, ServiceSpec, TaskDescription};
use crate::error::PlatformResult;

/// Narrow interface onto the remote container platform.
///
/// Implementations own cluster identity, region, and credentials; none
/// of that leaks into lifecycle logic. Shared as `Arc<dyn ClusterApi>`,
/// so every method takes `&self`.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Describe services matching the given name.
    async fn describe_services(&self, name: &str) -> PlatformResult<DescribeServices>;

    /// Register a task definition for `image` and return its handle.
    async fn register_task_definition(
        &self,
        image: &str,
        feature_flags: &[String],
    ) -> PlatformResult<String>;

    /// Create a service. The platform rejects names still owned by an
    /// existing service, including one that is draining.
    async fn create_service(&self, spec: &ServiceSpec) -> PlatformResult<()>;

    /// Point an existing service at a task definition (deploy).
    async fn update_service(&self, name: &str, task_definition: &str) -> PlatformResult<()>;

    /// Force-delete a service. Deletion completes asynchronously; the
    /// name stays owned until the service finishes draining.
    async fn delete_service(&self, name: &str) -> PlatformResult<()>;

    /// Platform-side stability wait. `Ok(false)` when the deadline
    /// passed without the service settling.
    async fn wait_for_stability(&self, name: &str, timeout: Duration) -> PlatformResult<bool>;

    /// Handles of the tasks currently associated with a service.
    async fn list_tasks(&self, service: &str) -> PlatformResult<Vec<String>>;

    /// Describe one task.
    async fn describe_task(&self, task_arn: &str) -> PlatformResult<TaskDescription>;

    /// Public IP attached to a network interface, when one exists.
    async fn interface_public_ip(&self, interface_id: &str) -> PlatformResult<Option<String>>;
}
