//! Settings for the organization core
//!
//! This module provides the configuration injected into the services. Its
//! main job is the member role policy: which role a user receives when they
//! join an organization, and what happens for organizations without one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{OrgError, OrgResult};

/// Environment variable holding the JSON configuration.
pub const CONFIG_ENV: &str = "CAMPUS_CORE_CONFIG";

/// Top-level configuration of the organization core.
///
/// # Examples
///
/// ```
/// use campus_org::settings::CoreConfig;
///
/// let config = CoreConfig::default();
/// assert_eq!(config.member_roles.role_for("cssg").as_deref(), Some("cssg_members"));
/// assert_eq!(config.member_roles.role_for("hacknc"), None);
/// assert!(!config.provision_member_roles);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    /// How organizations map to member roles
    #[serde(default)]
    pub member_roles: MemberRoleSettings,

    /// Create the member role (with its default grants) when an organization
    /// is created, if the policy names one for the new slug
    #[serde(default)]
    pub provision_member_roles: bool,
}

impl CoreConfig {
    /// Parse the configuration from a JSON document.
    pub fn from_json_str(json: &str) -> OrgResult<Self> {
        serde_json::from_str(json).map_err(|e| OrgError::Config(e.to_string()))
    }

    /// Read the configuration from [`CONFIG_ENV`], falling back to defaults
    /// when the variable is unset.
    pub fn from_env() -> OrgResult<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(json) => Self::from_json_str(&json),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(OrgError::Config(format!("{CONFIG_ENV}: {e}"))),
        }
    }
}

/// How a slug resolves to a member role name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRolePolicy {
    /// Only the slugs listed in `roles` have a member role
    #[default]
    Explicit,

    /// Every slug has the member role `{slug}{suffix}`; `roles` entries override
    Convention,
}

/// What a membership mutation does for a slug without a member role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedSlug {
    /// The mutation is rejected (soft failure) with no write
    #[default]
    Reject,

    /// The membership pair is recorded without any role grant
    MembershipOnly,
}

/// Member role settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRoleSettings {
    /// Resolution policy
    #[serde(default)]
    pub policy: MemberRolePolicy,

    /// Explicit slug to role name mapping
    #[serde(default = "default_member_roles")]
    pub roles: BTreeMap<String, String>,

    /// Suffix appended to the slug under the convention policy
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Behavior for slugs that resolve to no role
    #[serde(default)]
    pub unmapped: UnmappedSlug,
}

fn default_member_roles() -> BTreeMap<String, String> {
    [("cssg", "cssg_members"), ("acm", "acm_members")]
        .into_iter()
        .map(|(slug, role)| (slug.to_string(), role.to_string()))
        .collect()
}

fn default_suffix() -> String {
    "_members".to_string()
}

impl Default for MemberRoleSettings {
    fn default() -> Self {
        Self {
            policy: MemberRolePolicy::default(),
            roles: default_member_roles(),
            suffix: default_suffix(),
            unmapped: UnmappedSlug::default(),
        }
    }
}

impl MemberRoleSettings {
    /// Settings that derive `{slug}_members` for every organization.
    pub fn convention() -> Self {
        Self {
            policy: MemberRolePolicy::Convention,
            roles: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Resolve the member role name for `slug`, if any.
    pub fn role_for(&self, slug: &str) -> Option<String> {
        if let Some(role) = self.roles.get(slug) {
            return Some(role.clone());
        }
        match self.policy {
            MemberRolePolicy::Explicit => None,
            MemberRolePolicy::Convention => Some(format!("{slug}{}", self.suffix)),
        }
    }
}
