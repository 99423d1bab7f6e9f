//! Environment identity derived from a review number and commit id.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many characters of the commit id participate in resource names.
pub const SHORT_COMMIT_LEN: usize = 7;

/// Errors from environment key validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("review number must be positive")]
    ZeroReviewNumber,

    #[error("commit id is empty")]
    EmptyCommit,

    #[error("commit id has non-hex character {0:?}")]
    NonHexCommit(char),
}

/// Identity of one preview environment.
///
/// The (review number, short commit) pair is what every remote resource
/// name derives from. A new push to the same review yields a different
/// key, so the environment for the previous commit is replaced instead
/// of reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentKey {
    review_number: u32,
    short_commit: String,
}

impl EnvironmentKey {
    /// Validate and normalize a review number and commit id.
    ///
    /// The commit is lowercased and truncated to [`SHORT_COMMIT_LEN`]
    /// characters; shorter commit ids are kept whole. Non-hex commit
    /// ids and a zero review number are rejected.
    pub fn new(review_number: u32, commit: &str) -> Result<Self, KeyError> {
        if review_number == 0 {
            return Err(KeyError::ZeroReviewNumber);
        }
        let commit = commit.trim();
        if commit.is_empty() {
            return Err(KeyError::EmptyCommit);
        }
        if let Some(bad) = commit.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(KeyError::NonHexCommit(bad));
        }
        let short_commit = commit[..commit.len().min(SHORT_COMMIT_LEN)].to_ascii_lowercase();
        Ok(Self {
            review_number,
            short_commit,
        })
    }

    /// Review (pull request) number this environment belongs to.
    pub fn review_number(&self) -> u32 {
        self.review_number
    }

    /// Normalized short commit id.
    pub fn short_commit(&self) -> &str {
        &self.short_commit
    }

    /// Name every remote resource for this environment carries.
    pub fn service_name(&self) -> String {
        format!("pr-{}-{}-service", self.review_number, self.short_commit)
    }

    /// Tag the environment's container image is published under.
    pub fn image_tag(&self) -> String {
        format!("pr-{}-{}", self.review_number, self.short_commit)
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pr-{}-{}", self.review_number, self.short_commit)
    }
}
