//! Cloud client error types

use thiserror::Error;

/// Errors returned by a [`CloudResourceClient`](crate::CloudResourceClient).
///
/// The variants follow the teardown error taxonomy: transient conditions are
/// retried, shape mismatches move on to the next fallback technique,
/// not-found is treated as success and everything else is a permanent
/// failure for the resource in question.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Request shape rejected: {0}")]
    ShapeMismatch(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid resource ID: {0}")]
    InvalidResourceId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Resource is already gone; removal is idempotent so callers treat this as success.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    /// Worth retrying the same call after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CloudError::Conflict(_) | CloudError::Throttled(_) | CloudError::Timeout(_)
        )
    }

    /// The primary technique's call shape was rejected.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, CloudError::ShapeMismatch(_))
    }

    /// No alternate technique can fix this, so neither retry nor fallback applies.
    pub fn is_permanent(&self) -> bool {
        matches!(self, CloudError::PermissionDenied(_) | CloudError::Cancelled)
    }

    /// Conflict responses get special treatment on the final group delete.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CloudError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
