//! greenroom-core: shared types for preview environment provisioning.
//!
//! A preview environment is keyed by the review number and short commit id
//! of the change under review. This crate owns that identity
//! ([`EnvironmentKey`]), the settings file ([`GreenroomConfig`]), and the
//! outcome record ([`DeploymentResult`]) each provisioning run reports.
//!
//! Everything here is plain data. The platform seam and the lifecycle
//! controller that drive these types live in `greenroom-platform` and
//! `greenroom-lifecycle`.

pub mod config;
pub mod key;
pub mod result;

pub use config::{DeletionSettings, GreenroomConfig, HealthSettings};
pub use key::{EnvironmentKey, KeyError, SHORT_COMMIT_LEN};
pub use result::DeploymentResult;
