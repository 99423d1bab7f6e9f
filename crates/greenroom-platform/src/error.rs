//! Error taxonomy for remote platform operations.

use thiserror::Error;

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors the remote container platform can return.
///
/// Every variant is an expected remote condition, not a defect.
/// [`crate::ServiceQuery`] degrades all of them on the read side; they
/// surface as run failures only from mutating calls (create, deploy).
///
/// `Clone` because [`crate::FakeCluster`] hands out stored copies when
/// a failure is injected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("platform internal error: {0}")]
    Internal(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}
