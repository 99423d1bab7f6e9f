//! The environment lifecycle controller.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use greenroom_core::{DeploymentResult, EnvironmentKey, GreenroomConfig, KeyError};
use greenroom_platform::{ClusterApi, ServiceQuery, ServiceSpec};

use crate::error::DeployError;
use crate::health::HealthVerifier;
use crate::waiter::wait_for_absence;

/// Drives one preview environment through provisioning or teardown.
///
/// The remote service is named, shared, and mutates asynchronously, so
/// the controller's real job is deciding *when* the platform may be
/// asked to create: whatever currently owns the name must be deleted
/// and fully drained first. Nothing observed about the resource is ever
/// trusted across a step boundary; every decision re-queries.
pub struct EnvironmentController {
    api: Arc<dyn ClusterApi>,
    query: ServiceQuery,
    health: HealthVerifier,
    config: GreenroomConfig,
}

impl EnvironmentController {
    pub fn new(api: Arc<dyn ClusterApi>, config: GreenroomConfig) -> Self {
        let query = ServiceQuery::new(api.clone());
        let health = HealthVerifier::new(query.clone(), &config.health, config.app_port);
        Self {
            api,
            query,
            health,
            config,
        }
    }

    /// Provision the environment for one review and commit.
    ///
    /// Remote failures never surface as `Err`: they come back inside the
    /// [`DeploymentResult`], with the first fatal step described in its
    /// `error` field. The only `Err` is an invalid key, which is caller
    /// misuse rather than an environment outcome.
    pub async fn create_environment(
        &self,
        review_number: u32,
        commit: &str,
        requested_by: &str,
        force: bool,
    ) -> Result<DeploymentResult, KeyError> {
        let key = EnvironmentKey::new(review_number, commit)?;
        let service = key.service_name();
        let started = Instant::now();
        info!(%service, requested_by, force, "provisioning preview environment");

        let result = match self.provision(&key, &service, requested_by, force).await {
            Ok(address) => {
                info!(%service, address = ?address, "environment ready");
                DeploymentResult::ok(&service, address, started.elapsed())
            }
            Err(failure) => {
                error!(%service, %failure, "environment provisioning failed");
                DeploymentResult::failed(&service, failure.to_string(), started.elapsed())
            }
        };
        Ok(result)
    }

    /// Tear the environment down. `Ok(true)` when the name is free
    /// afterwards, including when nothing existed to begin with.
    pub async fn destroy_environment(
        &self,
        review_number: u32,
        commit: &str,
    ) -> Result<bool, KeyError> {
        let key = EnvironmentKey::new(review_number, commit)?;
        let service = key.service_name();

        if !self.query.exists_any_state(&service).await {
            info!(%service, "no environment to tear down");
            return Ok(true);
        }

        info!(%service, "tearing down preview environment");
        if let Err(e) = self.api.delete_service(&service).await {
            warn!(%service, error = %e, "delete request failed; relying on the deletion wait");
        }
        let outcome = wait_for_absence(
            &self.query,
            &service,
            self.config.deletion.poll_interval(),
            self.config.deletion.timeout(),
        )
        .await;
        Ok(outcome.terminal)
    }

    async fn provision(
        &self,
        key: &EnvironmentKey,
        service: &str,
        requested_by: &str,
        force: bool,
    ) -> Result<Option<String>, DeployError> {
        let image = format!("{}:{}", self.config.image_repository, key.image_tag());
        let task_definition = self
            .api
            .register_task_definition(&image, &self.config.feature_flags)
            .await
            .map_err(DeployError::TaskDefinition)?;
        debug!(%service, %task_definition, "task definition registered");

        let blocked = if force {
            // Force replace: any resource still owning the name counts,
            // draining ones included.
            let present = self.query.exists_any_state(service).await;
            info!(%service, present, "force replace requested; probed name in any state");
            present
        } else {
            let state = self.query.resource_state(service).await;
            debug!(%service, ?state, "existing service classified");
            state.blocks_creation()
        };

        if blocked {
            self.remove_existing(service).await?;
        }

        let spec = ServiceSpec {
            name: service.to_string(),
            task_definition: task_definition.clone(),
            desired_count: 1,
            requested_by: requested_by.to_string(),
        };
        self.api
            .create_service(&spec)
            .await
            .map_err(DeployError::Create)?;
        info!(%service, "service created");

        self.api
            .update_service(service, &task_definition)
            .await
            .map_err(DeployError::Deploy)?;
        debug!(%service, "deploy submitted");

        let stable = self
            .api
            .wait_for_stability(service, self.config.stability_timeout())
            .await
            .unwrap_or_else(|e| {
                warn!(%service, error = %e, "stability wait errored");
                false
            });
        if !stable {
            return Err(DeployError::Stability(service.to_string()));
        }
        info!(%service, "service reports stable");

        let max_attempts = self.config.health.max_attempts;
        if !self.health.check(service, max_attempts).await {
            return Err(DeployError::Unhealthy {
                service: service.to_string(),
                attempts: max_attempts,
            });
        }

        // Resolved again after health so the result carries the address
        // traffic is actually served on.
        let address = self.query.resolve_address(service).await;
        if address.is_none() {
            warn!(%service, "environment healthy but no public address resolved");
        }
        Ok(address)
    }

    /// Delete whatever owns the name, then wait for the name to free up.
    ///
    /// A rejected delete is logged and left to the wait to arbitrate: if
    /// the service disappears anyway the run proceeds, and if it does
    /// not, the deadline stops the run before create can be rejected.
    async fn remove_existing(&self, service: &str) -> Result<(), DeployError> {
        info!(%service, "existing service blocks creation; deleting");
        if let Err(e) = self.api.delete_service(service).await {
            warn!(%service, error = %e, "delete request failed; relying on the deletion wait");
        }

        let outcome = wait_for_absence(
            &self.query,
            service,
            self.config.deletion.poll_interval(),
            self.config.deletion.timeout(),
        )
        .await;
        if !outcome.terminal {
            return Err(DeployError::DeletionTimeout {
                service: service.to_string(),
                waited: outcome.elapsed,
            });
        }
        Ok(())
    }
}
