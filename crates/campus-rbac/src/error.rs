//! Error types for permission checks
//!
//! A denial is a terminal answer, never retried. Failures to load grants are
//! reported separately so callers never mistake an unreachable store for a
//! denial.

use thiserror::Error;

/// The subject holds no permission matching the requested action and resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{subject}` is not authorized to perform `{action}` on `{resource}`")]
pub struct PermissionDenied {
    /// Display name of the acting subject
    pub subject: String,

    /// Requested action
    pub action: String,

    /// Requested resource
    pub resource: String,
}

impl PermissionDenied {
    /// Build a denial for the given request.
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
        }
    }
}

/// Permission engine error types.
#[derive(Debug, Error)]
pub enum RbacError {
    /// The subject may not perform the action
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// Grants could not be loaded
    #[error("Failed to load grants: {0}")]
    Source(String),
}

/// Result type for permission engine operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Check if this error is a permission denial.
    pub fn is_denied(&self) -> bool {
        matches!(self, RbacError::PermissionDenied(_))
    }
}
