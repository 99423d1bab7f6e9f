//! Read-side cluster queries with fail-open degradation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::ResourceState;
use crate::client::ClusterApi;

/// Read-only view of the cluster.
///
/// All methods are infallible by construction: any platform error
/// degrades to the pessimistic-for-reads answer (absent, no address)
/// with a logged warning. A flaky control plane therefore cannot wedge
/// a waiting loop, at the cost of occasionally reading a live service
/// as gone.
#[derive(Clone)]
pub struct ServiceQuery {
    api: Arc<dyn ClusterApi>,
}

impl ServiceQuery {
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Self { api }
    }

    /// Classify the current state of the named service.
    ///
    /// One fresh describe per call. A describe error reads as
    /// [`ResourceState::Absent`]; so does a response that lists the name
    /// under failures, omits it, or omits its status.
    pub async fn resource_state(&self, name: &str) -> ResourceState {
        let described = match self.api.describe_services(name).await {
            Ok(d) => d,
            Err(error) => {
                warn!(
                    service = %name,
                    %error,
                    "describe failed; treating service as absent (fail-open)"
                );
                return ResourceState::Absent;
            }
        };

        if let Some(reason) = described.failure_reason(name) {
            debug!(service = %name, %reason, "platform lists service under failures");
        }

        match described.named(name) {
            None => ResourceState::Absent,
            Some(svc) => {
                let state = ResourceState::from_status(svc.status.as_deref());
                debug!(
                    service = %name,
                    ?state,
                    status = ?svc.status,
                    running = svc.running_count,
                    "classified service"
                );
                state
            }
        }
    }

    /// Whether a resource in any lifecycle state still owns the name.
    /// This is the probe to use before creating a service: a draining
    /// resource would still collide.
    pub async fn exists_any_state(&self, name: &str) -> bool {
        self.resource_state(name).await.blocks_creation()
    }

    /// Whether an ACTIVE resource owns the name. Misses draining ones.
    pub async fn exists_active(&self, name: &str) -> bool {
        self.resource_state(name).await == ResourceState::Active
    }

    /// Resolve the public address of the service's first task.
    ///
    /// Walks task, network interface, public IP. Every miss or platform
    /// error returns `None`.
    pub async fn resolve_address(&self, name: &str) -> Option<String> {
        let tasks = match self.api.list_tasks(name).await {
            Ok(t) => t,
            Err(error) => {
                warn!(service = %name, %error, "task listing failed");
                return None;
            }
        };
        let Some(task_arn) = tasks.first() else {
            debug!(service = %name, "no tasks running");
            return None;
        };

        let task = match self.api.describe_task(task_arn).await {
            Ok(t) => t,
            Err(error) => {
                warn!(service = %name, task = %task_arn, %error, "task describe failed");
                return None;
            }
        };
        let Some(interface_id) = task.interface_id else {
            debug!(service = %name, task = %task_arn, "task has no network interface");
            return None;
        };

        match self.api.interface_public_ip(&interface_id).await {
            Ok(Some(ip)) => {
                debug!(service = %name, address = %ip, "resolved public address");
                Some(ip)
            }
            Ok(None) => {
                debug!(service = %name, interface = %interface_id, "interface has no public ip");
                None
            }
            Err(error) => {
                warn!(service = %name, interface = %interface_id, %error, "interface lookup failed");
                None
            }
        }
    }
}
