//! Error types for organization operations
//!
//! Permission denials and missing records are always surfaced to the caller.
//! Membership mutations additionally have a soft failure channel
//! ([`crate::membership::MembershipOutcome::Rejected`]) that is never an `Err`.

use campus_rbac::{PermissionDenied, RbacError};
use thiserror::Error;

/// Store-level failures raised by a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("Unique constraint violated on {entity}.{field}: {value}")]
    UniqueViolation {
        /// Table name
        entity: &'static str,
        /// Constrained column(s)
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// A referenced row does not exist
    #[error("No {entity} found with {key}")]
    NotFound {
        /// Table name
        entity: &'static str,
        /// Lookup key description
        key: String,
    },

    /// A row is still referenced, or references a row that does not exist
    #[error("Foreign key violated on {entity}: {detail}")]
    ForeignKeyViolation {
        /// Table name
        entity: &'static str,
        /// Description of the dangling reference
        detail: String,
    },

    /// The unit of work was already committed
    #[error("Unit of work is already finished")]
    Finished,

    /// Backend failure
    #[error("Store error: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Check if this error is a uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Request-layer endpoints, used to reproduce the per-route status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /organizations`
    List,
    /// `POST /organizations`
    Create,
    /// `GET /organizations/{slug}`
    Get,
    /// `GET /organizations/{slug}/status`
    GetStatus,
    /// `PUT /organizations/{slug}`
    Update,
    /// `DELETE /organizations/{slug}`
    Delete,
    /// `GET /organizations/{slug}/{onyen}/authleader`
    IsLeader,
    /// `GET /organizations/{slug}/members`
    Members,
    /// `POST /organizations/{slug}/add_membership/{onyen}`
    AddMembership,
    /// `DELETE /organizations/{slug}/remove_membership/{onyen}`
    RemoveMembership,
}

/// Organization core error types.
#[derive(Debug, Error)]
pub enum OrgError {
    /// The subject may not perform the action
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// The referenced slug, id, or onyen does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with an invariant of existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure
    #[error(transparent)]
    Store(StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for organization operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl From<StoreError> for OrgError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => OrgError::NotFound(err.to_string()),
            other => OrgError::Store(other),
        }
    }
}

impl From<RbacError> for OrgError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::PermissionDenied(denied) => OrgError::PermissionDenied(denied),
            RbacError::Source(msg) => OrgError::Store(StoreError::Internal(msg)),
        }
    }
}

impl OrgError {
    /// Build a not-found error for an organization slug.
    pub fn organization_not_found(slug: &str) -> Self {
        OrgError::NotFound(format!("No organization found with matching slug: {slug}"))
    }

    /// Check if this error is a permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, OrgError::PermissionDenied(_))
    }

    /// Check if this error is a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrgError::NotFound(_))
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            OrgError::Store(StoreError::Internal(_) | StoreError::Finished) | OrgError::Config(_)
        )
    }

    /// Get the HTTP status code for this error, independent of the route.
    pub fn status_code(&self) -> u16 {
        match self {
            OrgError::PermissionDenied(_) => 403,
            OrgError::NotFound(_) => 404,
            OrgError::Conflict(_) => 409,
            OrgError::Store(StoreError::UniqueViolation { .. }) => 409,
            OrgError::Store(_) | OrgError::Config(_) => 500,
        }
    }

    /// Get the HTTP status code the request layer returns on `endpoint`.
    ///
    /// Permission denials are always 403. Membership mutation routes report
    /// every other failure as 405; create and update report unanticipated
    /// failures as 422.
    pub fn status_code_for(&self, endpoint: Endpoint) -> u16 {
        if self.is_permission_denied() {
            return 403;
        }
        match endpoint {
            Endpoint::AddMembership | Endpoint::RemoveMembership => 405,
            Endpoint::Create | Endpoint::Update => {
                if self.is_not_found() {
                    404
                } else {
                    422
                }
            }
            Endpoint::Get | Endpoint::GetStatus | Endpoint::Delete | Endpoint::IsLeader => 404,
            Endpoint::List | Endpoint::Members => self.status_code(),
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::PermissionDenied(_) => "PERMISSION_DENIED",
            OrgError::NotFound(_) => "NOT_FOUND",
            OrgError::Conflict(_) => "CONFLICT",
            OrgError::Store(StoreError::UniqueViolation { .. }) => "UNIQUE_VIOLATION",
            OrgError::Store(_) => "STORE_ERROR",
            OrgError::Config(_) => "CONFIG_ERROR",
        }
    }
}
