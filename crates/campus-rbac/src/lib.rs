//! # Campus RBAC (Role-Based Access Control)
//!
//! This crate provides the permission engine for campus organization records.
//!
//! ## Overview
//!
//! The campus-rbac crate handles:
//! - **Actions**: Dotted operation names (`organization.update`)
//! - **Resources**: `/`-separated resource paths (`organization/acm`)
//! - **Permissions**: Action pattern + resource pattern, owned by one role
//! - **Roles**: Named bundles of permissions, assigned to users
//! - **Engine**: `enforce` / `check` over a subject's grants
//!
//! ## Architecture
//!
//! ```text
//! User ─→ RoleAssignment ─→ Role ─→ Permission(action, resource)
//!
//! Examples:
//!   (*, *)                                        - root, matches everything
//!   (organization.update, organization/acm)       - update acm only
//!   (coworking.reservation.*, *)                  - every reservation action
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use campus_rbac::{Permission, PermissionSet, ResourcePath, Action};
//!
//! let set: PermissionSet = vec![
//!     Permission::new("organization.update", "organization/acm"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let acm = ResourcePath::organization("acm");
//! let cssg = ResourcePath::organization("cssg");
//! assert!(set.allows(Action::OrganizationUpdate.as_str(), acm.as_str()));
//! assert!(!set.allows(Action::OrganizationUpdate.as_str(), cssg.as_str()));
//! ```
//!
//! ## Integration with campus-org
//!
//! The organization crate implements [`GrantSource`] on its unit of work and
//! [`Subject`] on its user record, and calls the engine before every write.

pub mod actions;
pub mod engine;
pub mod error;
pub mod permissions;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use actions::Action;
pub use engine::{GrantSource, PermissionEngine, Subject};
pub use error::{PermissionDenied, RbacError, RbacResult};
pub use permissions::{Permission, PermissionSet, WILDCARD};
pub use resources::ResourcePath;
pub use roles::{Role, RoleAssignment, ROOT_ROLE};
