//! Shared polling loop for lifecycle waits.
//!
//! Deletion waits and health verification are the same shape: check now,
//! and if the world is not ready, sleep a fixed delay and check again,
//! up to a budget. Attempt counts are derived from the cadence rather
//! than measured wall clock, so tests can assert exact counts.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::sleep;

/// Outcome of one bounded polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Whether the condition turned true within the budget.
    pub terminal: bool,
    /// Checks performed, including the final one.
    pub attempts: u32,
    /// Wall-clock time the loop ran.
    pub elapsed: Duration,
}

/// Run `check` up to `max_checks` times with `delay` between checks.
///
/// The first check happens immediately. A true check returns at once
/// with no trailing sleep, so the loop sleeps exactly `attempts - 1`
/// times. A zero budget is clamped to one check.
///
/// The predicate is infallible; remote errors are the predicate's
/// problem to absorb. A panicking predicate unwinds straight through.
pub async fn poll_attempts<F, Fut>(mut check: F, delay: Duration, max_checks: u32) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    let max_checks = max_checks.max(1);
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if check().await {
            return PollOutcome {
                terminal: true,
                attempts,
                elapsed: started.elapsed(),
            };
        }
        if attempts >= max_checks {
            return PollOutcome {
                terminal: false,
                attempts,
                elapsed: started.elapsed(),
            };
        }
        sleep(delay).await;
    }
}

/// Poll `check` at a fixed `interval` until `timeout` would be exceeded.
///
/// The budget is `floor(timeout / interval) + 1` checks: the immediate
/// first check plus one per full interval. A one-minute timeout at a 5s
/// cadence is 13 checks.
pub async fn poll_until<F, Fut>(check: F, interval: Duration, timeout: Duration) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_attempts(check, interval, checks_within(interval, timeout)).await
}

/// `floor(timeout / interval) + 1`, clamped to at least one check.
fn checks_within(interval: Duration, timeout: Duration) -> u32 {
    if interval.is_zero() {
        return 1;
    }
    let intervals = timeout.as_micros() / interval.as_micros();
    u32::try_from(intervals)
        .map(|n| n.saturating_add(1))
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counting predicate that turns true on the nth check.
    fn counted_check(
        calls: &Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::future::Ready<bool> {
        let calls = calls.clone();
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(n >= succeed_on)
        }
    }

    #[tokio::test]
    async fn immediate_success_is_one_check_and_no_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        // An hour-long delay would trip the outer timeout if slept even once.
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            poll_attempts(counted_check(&calls, 1), Duration::from_secs(3600), 10),
        )
        .await
        .expect("no sleep should happen");

        assert!(outcome.terminal);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_on_third_check_stops_there() {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome =
            poll_attempts(counted_check(&calls, 3), Duration::from_millis(1), 10).await;

        assert!(outcome.terminal);
        assert_eq!(outcome.attempts, 3);
        // No fourth check after success.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_reports_every_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome =
            poll_attempts(counted_check(&calls, u32::MAX), Duration::from_millis(1), 4).await;

        assert!(!outcome.terminal);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_budget_still_checks_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome =
            poll_attempts(counted_check(&calls, u32::MAX), Duration::from_millis(1), 0).await;

        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.terminal);
    }

    #[tokio::test]
    async fn poll_until_derives_budget_from_cadence() {
        let calls = Arc::new(AtomicU32::new(0));
        // 10ms timeout at 3ms cadence: floor(10/3) + 1 = 4 checks.
        let outcome = poll_until(
            counted_check(&calls, u32::MAX),
            Duration::from_millis(3),
            Duration::from_millis(10),
        )
        .await;

        assert!(!outcome.terminal);
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test]
    #[should_panic(expected = "predicate blew up")]
    async fn panicking_predicate_unwinds_through() {
        poll_attempts(
            || async { panic!("predicate blew up") },
            Duration::from_millis(1),
            3,
        )
        .await;
    }

    #[test]
    fn check_budget_arithmetic() {
        assert_eq!(
            checks_within(Duration::from_secs(5), Duration::from_secs(60)),
            13
        );
        assert_eq!(
            checks_within(Duration::from_secs(5), Duration::from_secs(0)),
            1
        );
        // Interval longer than the timeout still gets the immediate check.
        assert_eq!(
            checks_within(Duration::from_secs(10), Duration::from_secs(5)),
            1
        );
        assert_eq!(checks_within(Duration::ZERO, Duration::from_secs(5)), 1);
    }
}
