//! # Permission Engine
//!
//! Decides whether a subject may perform an action on a resource. The engine
//! is storage-agnostic: grants are read through [`GrantSource`], which the
//! organization store implements on its unit of work so that checks see the
//! same transactional view as the writes they guard.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{PermissionDenied, RbacResult};
use crate::permissions::{Permission, PermissionSet};

/// The acting user whose permissions are evaluated.
pub trait Subject {
    /// Numeric identifier used to look up role assignments.
    fn subject_id(&self) -> i64;

    /// Human-readable name used in denial messages and logs.
    fn subject_name(&self) -> String;
}

/// Source of the permissions granted to a subject.
#[async_trait]
pub trait GrantSource: Send {
    /// Every permission attached to every role assigned to `subject_id`.
    async fn grants_for(&mut self, subject_id: i64) -> RbacResult<Vec<Permission>>;
}

/// Evaluates `(subject, action, resource)` requests against stored grants.
///
/// `enforce` succeeds exactly when `check` returns `true`.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use campus_rbac::{GrantSource, Permission, PermissionEngine, RbacResult, Subject};
///
/// struct Leader;
///
/// impl Subject for Leader {
///     fn subject_id(&self) -> i64 { 3 }
///     fn subject_name(&self) -> String { "leaderlee".into() }
/// }
///
/// struct Grants(Vec<Permission>);
///
/// #[async_trait]
/// impl GrantSource for Grants {
///     async fn grants_for(&mut self, _subject_id: i64) -> RbacResult<Vec<Permission>> {
///         Ok(self.0.clone())
///     }
/// }
///
/// # async fn run() -> RbacResult<()> {
/// let engine = PermissionEngine::new();
/// let mut grants = Grants(vec![Permission::new("organization.update", "organization/cssg")]);
///
/// engine.enforce(&mut grants, &Leader, "organization.update", "organization/cssg").await?;
/// assert!(!engine.check(&mut grants, &Leader, "organization.update", "organization/acm").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEngine;

impl PermissionEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    /// Load the subject's grants into a [`PermissionSet`].
    pub async fn grants<G, S>(&self, source: &mut G, subject: &S) -> RbacResult<PermissionSet>
    where
        G: GrantSource + ?Sized,
        S: Subject + ?Sized,
    {
        Ok(source
            .grants_for(subject.subject_id())
            .await?
            .into_iter()
            .collect())
    }

    /// Answer whether the subject may perform `action` on `resource`.
    ///
    /// Used where a denial is a valid business answer rather than an abort.
    pub async fn check<G, S>(
        &self,
        source: &mut G,
        subject: &S,
        action: &str,
        resource: &str,
    ) -> RbacResult<bool>
    where
        G: GrantSource + ?Sized,
        S: Subject + ?Sized,
    {
        let grants = self.grants(source, subject).await?;
        let allowed = Self::evaluate(&grants, action, resource);
        debug!(
            subject = %subject.subject_name(),
            action,
            resource,
            allowed,
            root = grants.has_root(),
            "permission check"
        );
        Ok(allowed)
    }

    /// Fail with [`PermissionDenied`] unless the subject may perform `action` on `resource`.
    pub async fn enforce<G, S>(
        &self,
        source: &mut G,
        subject: &S,
        action: &str,
        resource: &str,
    ) -> RbacResult<()>
    where
        G: GrantSource + ?Sized,
        S: Subject + ?Sized,
    {
        if self.check(source, subject, action, resource).await? {
            return Ok(());
        }

        let subject_name = subject.subject_name();
        info!(subject = %subject_name, action, resource, "permission denied");
        Err(PermissionDenied::new(subject_name, action, resource).into())
    }

    /// Pure evaluation over an already loaded permission set.
    pub fn evaluate(grants: &PermissionSet, action: &str, resource: &str) -> bool {
        grants.allows(action, resource)
    }
}
