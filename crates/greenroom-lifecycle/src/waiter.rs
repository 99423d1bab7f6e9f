//! Deletion wait: poll until a service name frees up.

use std::time::Duration;

use tracing::{debug, info, warn};

use greenroom_platform::{ResourceState, ServiceQuery};

use crate::poll::{PollOutcome, poll_until};

/// Poll until no resource owns `name`, checking every `interval` and
/// giving up after `timeout`.
///
/// Deletion on the platform is asynchronous: the delete call returns
/// while the old service drains, and the name stays owned until the
/// drain finishes. Creating before that point is a guaranteed rejection,
/// so callers replace a service with delete, this wait, then create.
///
/// The first check happens immediately; a name that is already free
/// costs one describe and zero sleeps. Reads inherit the query's
/// fail-open behavior: a describe error counts as absent, and the
/// degradation has already been logged where it happened.
pub async fn wait_for_absence(
    query: &ServiceQuery,
    name: &str,
    interval: Duration,
    timeout: Duration,
) -> PollOutcome {
    debug!(service = %name, ?interval, ?timeout, "waiting for service deletion to complete");

    let query = query.clone();
    let service = name.to_string();
    let outcome = poll_until(
        move || {
            let query = query.clone();
            let service = service.clone();
            async move { query.resource_state(&service).await == ResourceState::Absent }
        },
        interval,
        timeout,
    )
    .await;

    if outcome.terminal {
        info!(
            service = %name,
            attempts = outcome.attempts,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "service fully deleted"
        );
    } else {
        warn!(
            service = %name,
            attempts = outcome.attempts,
            "service still present at deletion deadline"
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use greenroom_platform::{FakeCluster, PlatformError};

    const SERVICE: &str = "pr-1234-abc123f-service";

    fn query(fake: &FakeCluster) -> ServiceQuery {
        ServiceQuery::new(Arc::new(fake.clone()))
    }

    #[tokio::test]
    async fn already_absent_is_one_check_and_no_sleep() {
        let fake = FakeCluster::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            wait_for_absence(
                &query(&fake),
                SERVICE,
                Duration::from_secs(3600),
                Duration::from_secs(7200),
            ),
        )
        .await
        .expect("no sleep should happen");

        assert!(outcome.terminal);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(fake.call_count("describe_services"), 1);
    }

    #[tokio::test]
    async fn draining_twice_then_absent_stops_at_third_check() {
        let fake = FakeCluster::new();
        fake.seed_draining(SERVICE, 2);

        let outcome = wait_for_absence(
            &query(&fake),
            SERVICE,
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;

        assert!(outcome.terminal);
        assert_eq!(outcome.attempts, 3);
        // No fourth describe after the name frees up.
        assert_eq!(fake.call_count("describe_services"), 3);
    }

    #[tokio::test]
    async fn persistent_draining_exhausts_the_deadline() {
        let fake = FakeCluster::new();
        fake.seed_draining(SERVICE, u32::MAX);

        // floor(35 / 10) + 1 = 4 checks.
        let outcome = wait_for_absence(
            &query(&fake),
            SERVICE,
            Duration::from_millis(10),
            Duration::from_millis(35),
        )
        .await;

        assert!(!outcome.terminal);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(fake.call_count("describe_services"), 4);
    }

    #[tokio::test]
    async fn describe_errors_read_as_deleted() {
        let fake = FakeCluster::new();
        fake.seed_active(SERVICE);
        fake.inject_failure(
            "describe_services",
            PlatformError::Internal("control plane flake".to_string()),
        );

        let outcome = wait_for_absence(
            &query(&fake),
            SERVICE,
            Duration::from_millis(1),
            Duration::from_millis(50),
        )
        .await;

        // Fail-open: the wait terminates rather than wedging.
        assert!(outcome.terminal);
        assert_eq!(outcome.attempts, 1);
    }
}
