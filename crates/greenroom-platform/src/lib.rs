//! greenroom-platform: the seam between lifecycle logic and the remote
//! container platform.
//!
//! The lifecycle controller never talks to a platform SDK directly. It
//! sees [`ClusterApi`], a narrow async trait covering exactly the calls
//! provisioning needs; implementations own cluster identity, region, and
//! credentials. [`ServiceQuery`] builds the read side on top of the trait
//! and deliberately fails open: a describe error reads as "absent"
//! (always logged), so a flaky control plane can never wedge a deletion
//! wait.
//!
//! [`FakeCluster`] is the in-memory implementation used by tests and
//! local simulation. It journals every call so tests can assert order
//! and exact counts.

pub mod api;
pub mod client;
pub mod error;
pub mod fake;
pub mod query;

pub use api::{
    DescribeServices, ResourceState, ServiceDescription, ServiceFailure, ServiceSpec,
    TaskDescription,
};
pub use client::ClusterApi;
pub use error::{PlatformError, PlatformResult};
pub use fake::{FakeCall, FakeCluster};
pub use query::ServiceQuery;
