//! # Campus Organization Core
//!
//! This crate manages student organization records, their membership, and the
//! member roles that membership implies.
//!
//! ## Overview
//!
//! The campus-org crate handles:
//! - **Organizations**: Create, read, update, and delete organization records
//! - **Memberships**: User-organization pairs kept in step with member roles
//! - **Roles**: Role/permission storage and member role provisioning
//! - **Users**: Resolving login handles into user records
//! - **Unit of work**: The transactional handle every operation runs inside
//!
//! ## Architecture
//!
//! ```text
//! caller ─ begin() ─→ UnitOfWork ─┬─ OrganizationService
//!                                 ├─ MembershipCoordinator
//!                                 ├─ RoleService
//!                                 └─ UserDirectory
//!                                       │
//!                     PermissionEngine ─┘ (grants read through the same unit)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use campus_org::{MemoryStore, Organization, OrganizationService, Store, UserDirectory};
//!
//! # async fn run() -> campus_org::OrgResult<()> {
//! let store = MemoryStore::new();
//! let organizations = OrganizationService::default();
//!
//! let mut uow = store.begin().await?;
//! let root = UserDirectory::new()
//!     .get_by_onyen(uow.as_mut(), &Default::default(), "root")
//!     .await?;
//! organizations
//!     .create(uow.as_mut(), &root, Organization::new("CS+Social Good", "CSSG", "cssg"))
//!     .await?;
//! uow.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Member role resolution and provisioning are read from [`CoreConfig`],
//! usually loaded with [`CoreConfig::from_env`].

pub mod error;
pub mod memory;
pub mod membership;
pub mod organization;
pub mod roles;
pub mod service;
pub mod settings;
pub mod store;
pub mod user;

// Re-export main types for convenience
pub use error::{Endpoint, OrgError, OrgResult, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use membership::{MembershipCoordinator, MembershipOutcome, RejectReason};
pub use organization::{Article, Event, Organization, OrganizationDetails, Visibility};
pub use roles::RoleService;
pub use service::OrganizationService;
pub use settings::{CoreConfig, MemberRolePolicy, MemberRoleSettings, UnmappedSlug};
pub use store::{Savepoint, Store, UnitOfWork};
pub use user::{User, UserDirectory};
