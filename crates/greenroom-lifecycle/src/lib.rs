//! greenroom-lifecycle: drives a preview environment from request to
//! serving traffic.
//!
//! # Architecture
//!
//! ```text
//!   create_environment(review, commit, requested_by, force)
//!        │
//!        ├─ register task definition
//!        ├─ classify existing service        (ServiceQuery, fail-open)
//!        ├─ blocked? delete + wait_for_absence   (waiter, bounded poll)
//!        │      └─ deadline hit → stop, create is never attempted
//!        ├─ create + deploy
//!        ├─ wait_for_stability               (platform-side)
//!        ├─ HealthVerifier::check            (HTTP probe + retries)
//!        └─ resolve_address → DeploymentResult
//! ```
//!
//! The remote resource is named, shared, and changes asynchronously, so
//! the controller never trusts a previous observation: every decision
//! point re-queries. Both waiting subsystems (deletion, health) run on
//! one polling loop, [`poll::poll_attempts`], with an immediate first
//! check and a fixed delay between checks.
//!
//! Expected remote failures never escape as `Err`: they are folded into
//! [`greenroom_core::DeploymentResult`]. The only `Err` out of the
//! controller is an invalid environment key.

pub mod controller;
pub mod error;
pub mod health;
pub mod poll;
pub mod waiter;

pub use controller::EnvironmentController;
pub use error::DeployError;
pub use health::HealthVerifier;
pub use poll::{PollOutcome, poll_attempts, poll_until};
pub use waiter::wait_for_absence;
