//! In-memory cluster for tests and local simulation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{
    DescribeServices, ServiceDescription, ServiceFailure, ServiceSpec, TaskDescription,
};
use crate::client::ClusterApi;
use crate::error::{PlatformError, PlatformResult};

/// Record of one cluster call, for order and count assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    DescribeServices { name: String },
    RegisterTaskDefinition { image: String, feature_flags: Vec<String> },
    CreateService { name: String, task_definition: String },
    UpdateService { name: String, task_definition: String },
    DeleteService { name: String },
    WaitForStability { name: String },
    ListTasks { service: String },
    DescribeTask { arn: String },
    InterfacePublicIp { interface_id: String },
}

impl FakeCall {
    /// Operation name. These are the keys failure injection uses.
    pub fn op(&self) -> &'static str {
        match self {
            FakeCall::DescribeServices { .. } => "describe_services",
            FakeCall::RegisterTaskDefinition { .. } => "register_task_definition",
            FakeCall::CreateService { .. } => "create_service",
            FakeCall::UpdateService { .. } => "update_service",
            FakeCall::DeleteService { .. } => "delete_service",
            FakeCall::WaitForStability { .. } => "wait_for_stability",
            FakeCall::ListTasks { .. } => "list_tasks",
            FakeCall::DescribeTask { .. } => "describe_task",
            FakeCall::InterfacePublicIp { .. } => "interface_public_ip",
        }
    }
}

#[derive(Debug, Clone)]
struct LiveService {
    status: String,
    /// Describes left that still see DRAINING before the name frees up.
    remaining_drain: u32,
}

#[derive(Debug)]
struct FakeState {
    services: HashMap<String, LiveService>,
    scripted_describes: VecDeque<DescribeServices>,
    tasks: HashMap<String, Vec<String>>,
    task_details: HashMap<String, TaskDescription>,
    interface_ips: HashMap<String, Option<String>>,
    registered: Vec<String>,
    calls: Vec<FakeCall>,
    failures: HashMap<&'static str, PlatformError>,
    drain_ticks: u32,
    stable: bool,
    reject_create_while_present: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            services: HashMap::new(),
            scripted_describes: VecDeque::new(),
            tasks: HashMap::new(),
            task_details: HashMap::new(),
            interface_ips: HashMap::new(),
            registered: Vec::new(),
            calls: Vec::new(),
            failures: HashMap::new(),
            drain_ticks: 0,
            stable: true,
            reject_create_while_present: false,
        }
    }
}

/// In-memory [`ClusterApi`] with an operation journal.
///
/// Create inserts an ACTIVE service. Delete marks it DRAINING for a
/// configurable number of subsequent describes (`drain_ticks`, default 0:
/// gone on the next describe), after which the name frees up. A scripted
/// describe queue, while non-empty, overrides the live map so tests can
/// pin exact observation sequences. Failures are injected per operation
/// name and returned until cleared.
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an ACTIVE service, as if created by an earlier run.
    pub fn seed_active(&self, name: &str) {
        self.state.lock().expect("lock").services.insert(
            name.to_string(),
            LiveService {
                status: "ACTIVE".to_string(),
                remaining_drain: 0,
            },
        );
    }

    /// Seed a DRAINING service that stays DRAINING for `draining_checks`
    /// more describes before the name frees up. `u32::MAX` drains
    /// effectively forever.
    pub fn seed_draining(&self, name: &str, draining_checks: u32) {
        self.state.lock().expect("lock").services.insert(
            name.to_string(),
            LiveService {
                status: "DRAINING".to_string(),
                remaining_drain: draining_checks,
            },
        );
    }

    /// How many describes report DRAINING after a delete (default 0).
    pub fn set_drain_ticks(&self, ticks: u32) {
        self.state.lock().expect("lock").drain_ticks = ticks;
    }

    /// Queue a canned describe response. Queued responses take precedence
    /// over the live service map until drained.
    pub fn script_describe(&self, response: DescribeServices) {
        self.state
            .lock()
            .expect("lock")
            .scripted_describes
            .push_back(response);
    }

    /// Make `op` fail with `error` until cleared. Failed calls are still
    /// journaled.
    pub fn inject_failure(&self, op: &'static str, error: PlatformError) {
        self.state.lock().expect("lock").failures.insert(op, error);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().expect("lock").failures.clear();
    }

    /// Reject creates for names that are still present, mirroring the
    /// platform's "Creation of service was not idempotent." rejection.
    pub fn reject_create_while_present(&self, reject: bool) {
        self.state.lock().expect("lock").reject_create_while_present = reject;
    }

    /// Outcome of stability waits (default: stable).
    pub fn set_stable(&self, stable: bool) {
        self.state.lock().expect("lock").stable = stable;
    }

    /// Wire a running task with a public IP onto a service, so address
    /// resolution can walk the full task, interface, IP chain.
    pub fn with_running_task(&self, service: &str, ip: &str) {
        self.wire_task(service, Some(ip));
    }

    /// Wire a running task whose interface has no public IP.
    pub fn with_private_task(&self, service: &str) {
        self.wire_task(service, None);
    }

    fn wire_task(&self, service: &str, ip: Option<&str>) {
        let mut state = self.state.lock().expect("lock");
        let arn = format!("arn:fake:task/{service}/1");
        let interface_id = format!("eni-{service}");
        state.tasks.insert(service.to_string(), vec![arn.clone()]);
        state.task_details.insert(
            arn.clone(),
            TaskDescription {
                arn,
                last_status: "RUNNING".to_string(),
                interface_id: Some(interface_id.clone()),
            },
        );
        state
            .interface_ips
            .insert(interface_id, ip.map(str::to_string));
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().expect("lock").calls.clone()
    }

    /// Recorded operation names, in order.
    pub fn call_ops(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .expect("lock")
            .calls
            .iter()
            .map(FakeCall::op)
            .collect()
    }

    /// Number of recorded calls for one operation.
    pub fn call_count(&self, op: &str) -> usize {
        self.state
            .lock()
            .expect("lock")
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    /// Clears the journal.
    pub fn clear_calls(&self) {
        self.state.lock().expect("lock").calls.clear();
    }

    /// Raw status of a live service, for test inspection.
    pub fn service_status(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .expect("lock")
            .services
            .get(name)
            .map(|s| s.status.clone())
    }

    /// Journal the call, then fail it if a failure is injected for its op.
    fn begin(&self, call: FakeCall) -> PlatformResult<()> {
        let mut state = self.state.lock().expect("lock");
        let op = call.op();
        state.calls.push(call);
        match state.failures.get(op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn present_response(name: &str, status: &str, running: u32) -> DescribeServices {
    DescribeServices {
        services: vec![ServiceDescription {
            name: name.to_string(),
            status: Some(status.to_string()),
            running_count: running,
            desired_count: 1,
        }],
        failures: vec![],
    }
}

fn missing_response(name: &str) -> DescribeServices {
    DescribeServices {
        services: vec![],
        failures: vec![ServiceFailure {
            arn: format!("arn:fake:service/{name}"),
            reason: "MISSING".to_string(),
        }],
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn describe_services(&self, name: &str) -> PlatformResult<DescribeServices> {
        self.begin(FakeCall::DescribeServices {
            name: name.to_string(),
        })?;
        let mut state = self.state.lock().expect("lock");

        if let Some(scripted) = state.scripted_describes.pop_front() {
            return Ok(scripted);
        }

        let live = state
            .services
            .get(name)
            .map(|s| (s.status.clone(), s.remaining_drain));
        let response = match live {
            None => missing_response(name),
            Some((status, remaining)) if status == "DRAINING" => {
                if remaining == 0 {
                    state.services.remove(name);
                    missing_response(name)
                } else {
                    if let Some(svc) = state.services.get_mut(name) {
                        svc.remaining_drain = remaining - 1;
                    }
                    present_response(name, "DRAINING", 0)
                }
            }
            Some((status, _)) => present_response(name, &status, 1),
        };
        Ok(response)
    }

    async fn register_task_definition(
        &self,
        image: &str,
        feature_flags: &[String],
    ) -> PlatformResult<String> {
        self.begin(FakeCall::RegisterTaskDefinition {
            image: image.to_string(),
            feature_flags: feature_flags.to_vec(),
        })?;
        let mut state = self.state.lock().expect("lock");
        let revision = state.registered.len() + 1;
        let arn = format!("arn:fake:task-definition/{image}:{revision}");
        state.registered.push(arn.clone());
        Ok(arn)
    }

    async fn create_service(&self, spec: &ServiceSpec) -> PlatformResult<()> {
        self.begin(FakeCall::CreateService {
            name: spec.name.clone(),
            task_definition: spec.task_definition.clone(),
        })?;
        let mut state = self.state.lock().expect("lock");
        if state.reject_create_while_present && state.services.contains_key(&spec.name) {
            return Err(PlatformError::InvalidParameter(
                "Creation of service was not idempotent.".to_string(),
            ));
        }
        state.services.insert(
            spec.name.clone(),
            LiveService {
                status: "ACTIVE".to_string(),
                remaining_drain: 0,
            },
        );
        Ok(())
    }

    async fn update_service(&self, name: &str, task_definition: &str) -> PlatformResult<()> {
        self.begin(FakeCall::UpdateService {
            name: name.to_string(),
            task_definition: task_definition.to_string(),
        })?;
        let state = self.state.lock().expect("lock");
        if !state.services.contains_key(name) {
            return Err(PlatformError::NotFound(format!("service {name}")));
        }
        Ok(())
    }

    async fn delete_service(&self, name: &str) -> PlatformResult<()> {
        self.begin(FakeCall::DeleteService {
            name: name.to_string(),
        })?;
        let mut state = self.state.lock().expect("lock");
        let drain_ticks = state.drain_ticks;
        match state.services.get_mut(name) {
            Some(svc) => {
                svc.status = "DRAINING".to_string();
                svc.remaining_drain = drain_ticks;
                Ok(())
            }
            None => Err(PlatformError::NotFound(format!("service {name}"))),
        }
    }

    async fn wait_for_stability(&self, name: &str, _timeout: Duration) -> PlatformResult<bool> {
        self.begin(FakeCall::WaitForStability {
            name: name.to_string(),
        })?;
        Ok(self.state.lock().expect("lock").stable)
    }

    async fn list_tasks(&self, service: &str) -> PlatformResult<Vec<String>> {
        self.begin(FakeCall::ListTasks {
            service: service.to_string(),
        })?;
        let state = self.state.lock().expect("lock");
        Ok(state.tasks.get(service).cloned().unwrap_or_default())
    }

    async fn describe_task(&self, task_arn: &str) -> PlatformResult<TaskDescription> {
        self.begin(FakeCall::DescribeTask {
            arn: task_arn.to_string(),
        })?;
        let state = self.state.lock().expect("lock");
        state
            .task_details
            .get(task_arn)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("task {task_arn}")))
    }

    async fn interface_public_ip(&self, interface_id: &str) -> PlatformResult<Option<String>> {
        self.begin(FakeCall::InterfacePublicIp {
            interface_id: interface_id.to_string(),
        })?;
        let state = self.state.lock().expect("lock");
        Ok(state.interface_ips.get(interface_id).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = "pr-1234-abc123f-service";

    fn spec(name: &str) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            task_definition: "arn:fake:task-definition/app:1".to_string(),
            desired_count: 1,
            requested_by: "reviewer".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_describe_reports_active() {
        let fake = FakeCluster::new();
        fake.create_service(&spec(SERVICE)).await.unwrap();

        let described = fake.describe_services(SERVICE).await.unwrap();
        let svc = described.named(SERVICE).unwrap();
        assert_eq!(svc.status.as_deref(), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn delete_drains_for_configured_ticks() {
        let fake = FakeCluster::new();
        fake.set_drain_ticks(1);
        fake.create_service(&spec(SERVICE)).await.unwrap();
        fake.delete_service(SERVICE).await.unwrap();

        let first = fake.describe_services(SERVICE).await.unwrap();
        assert_eq!(
            first.named(SERVICE).unwrap().status.as_deref(),
            Some("DRAINING")
        );

        let second = fake.describe_services(SERVICE).await.unwrap();
        assert!(second.named(SERVICE).is_none());
        assert_eq!(second.failure_reason(SERVICE), Some("MISSING"));
    }

    #[tokio::test]
    async fn delete_with_zero_ticks_frees_name_on_next_describe() {
        let fake = FakeCluster::new();
        fake.create_service(&spec(SERVICE)).await.unwrap();
        fake.delete_service(SERVICE).await.unwrap();

        let described = fake.describe_services(SERVICE).await.unwrap();
        assert!(described.named(SERVICE).is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_service_is_not_found() {
        let fake = FakeCluster::new();
        let err = fake.delete_service(SERVICE).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_while_present_can_be_rejected() {
        let fake = FakeCluster::new();
        fake.reject_create_while_present(true);
        fake.set_drain_ticks(u32::MAX);
        fake.create_service(&spec(SERVICE)).await.unwrap();
        fake.delete_service(SERVICE).await.unwrap();

        // Still draining, so the name is still owned.
        let err = fake.create_service(&spec(SERVICE)).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidParameter(_)));
        assert!(err.to_string().contains("not idempotent"));
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_journaled() {
        let fake = FakeCluster::new();
        fake.inject_failure(
            "describe_services",
            PlatformError::AccessDenied("nope".to_string()),
        );

        let err = fake.describe_services(SERVICE).await.unwrap_err();
        assert!(matches!(err, PlatformError::AccessDenied(_)));
        assert_eq!(fake.call_count("describe_services"), 1);

        fake.clear_failures();
        assert!(fake.describe_services(SERVICE).await.is_ok());
    }

    #[tokio::test]
    async fn scripted_describes_override_live_map() {
        let fake = FakeCluster::new();
        fake.seed_active(SERVICE);
        fake.script_describe(missing_response(SERVICE));

        let first = fake.describe_services(SERVICE).await.unwrap();
        assert!(first.named(SERVICE).is_none());

        // Queue drained; live map answers again.
        let second = fake.describe_services(SERVICE).await.unwrap();
        assert!(second.named(SERVICE).is_some());
    }

    #[tokio::test]
    async fn journal_preserves_order_and_arguments() {
        let fake = FakeCluster::new();
        let handle = fake
            .register_task_definition("preview-apps:pr-1234-abc123f", &[])
            .await
            .unwrap();
        fake.create_service(&spec(SERVICE)).await.unwrap();
        fake.update_service(SERVICE, &handle).await.unwrap();

        assert_eq!(
            fake.call_ops(),
            vec!["register_task_definition", "create_service", "update_service"]
        );
        match &fake.calls()[2] {
            FakeCall::UpdateService {
                name,
                task_definition,
            } => {
                assert_eq!(name, SERVICE);
                assert_eq!(task_definition, &handle);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn registered_definitions_get_distinct_revisions() {
        let fake = FakeCluster::new();
        let first = fake
            .register_task_definition("preview-apps:pr-1-aaaa111", &[])
            .await
            .unwrap();
        let second = fake
            .register_task_definition("preview-apps:pr-1-bbbb222", &[])
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn task_wiring_resolves_to_ip() {
        let fake = FakeCluster::new();
        fake.with_running_task(SERVICE, "54.123.45.67");

        let tasks = fake.list_tasks(SERVICE).await.unwrap();
        let task = fake.describe_task(&tasks[0]).await.unwrap();
        let ip = fake
            .interface_public_ip(task.interface_id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(ip.as_deref(), Some("54.123.45.67"));
    }
}
