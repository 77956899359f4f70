//! Organization domain models
//!
//! This module provides the Organization record and the child records it
//! owns. Organizations are keyed externally by their slug; the numeric id is
//! assigned by the store and never taken from the client on create.

use serde::{Deserialize, Serialize};

/// Whether an organization accepts members openly, on request, or not at all.
///
/// # Examples
///
/// ```
/// use campus_org::Visibility;
///
/// assert_eq!(Visibility::parse("request"), Some(Visibility::Request));
/// assert_eq!(Visibility::default(), Visibility::Open);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone may join
    #[default]
    Open,

    /// Joining requires a leader's approval
    Request,

    /// Not accepting members
    Closed,
}

impl Visibility {
    /// Get string representation of the visibility mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Request => "request",
            Self::Closed => "closed",
        }
    }

    /// Parse visibility from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "request" => Some(Self::Request),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student organization.
///
/// Display fields are opaque strings with no cross-field invariants.
///
/// # Examples
///
/// ```
/// use campus_org::Organization;
///
/// let org = Organization::new("CS+Social Good", "CSSG", "cssg");
/// assert_eq!(org.id, 0);
/// assert!(!org.application_required);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Organization {
    /// Store-assigned identifier (0 until persisted)
    #[serde(default)]
    pub id: i64,

    /// Display name
    pub name: String,

    /// Short name
    pub shorthand: String,

    /// Unique external key
    pub slug: String,

    /// Logo URL
    #[serde(default)]
    pub logo: String,

    /// One-line description
    #[serde(default)]
    pub short_description: String,

    /// Full description
    #[serde(default)]
    pub long_description: String,

    /// Website URL
    #[serde(default)]
    pub website: String,

    /// Contact email
    #[serde(default)]
    pub email: String,

    /// Instagram handle
    #[serde(default)]
    pub instagram: String,

    /// LinkedIn handle
    #[serde(default)]
    pub linked_in: String,

    /// YouTube handle
    #[serde(default)]
    pub youtube: String,

    /// Heel Life handle
    #[serde(default)]
    pub heel_life: String,

    /// Membership visibility mode
    #[serde(default)]
    pub public: Visibility,

    /// Whether joining requires an application
    #[serde(default)]
    pub application_required: bool,
}

impl Organization {
    /// Creates an unpersisted organization with empty display fields.
    pub fn new(name: impl Into<String>, shorthand: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shorthand: shorthand.into(),
            slug: slug.into(),
            ..Default::default()
        }
    }

    /// Set the visibility mode.
    pub fn with_visibility(mut self, public: Visibility) -> Self {
        self.public = public;
        self
    }

    /// Require an application to join.
    pub fn with_application_required(mut self, required: bool) -> Self {
        self.application_required = required;
        self
    }

    /// Whether the record has been assigned an id by the store.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Overwrite every mutable field with the values of `incoming`.
    ///
    /// The id is kept; everything else, including the slug, is replaced.
    pub fn replace_fields(&mut self, incoming: &Organization) {
        let id = self.id;
        *self = incoming.clone();
        self.id = id;
    }
}

/// An event hosted by an organization. Deleted with its organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: i64,

    /// Owning organization
    pub organization_id: i64,

    /// Event name
    pub name: String,
}

impl Event {
    /// Creates an unpersisted event owned by `organization_id`.
    pub fn new(organization_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            organization_id,
            name: name.into(),
        }
    }
}

/// An article published by an organization. Deleted with its organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: i64,

    /// Owning organization
    pub organization_id: i64,

    /// Article title
    pub title: String,
}

impl Article {
    /// Creates an unpersisted article owned by `organization_id`.
    pub fn new(organization_id: i64, title: impl Into<String>) -> Self {
        Self {
            id: 0,
            organization_id,
            title: title.into(),
        }
    }
}

/// An organization together with the events it hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationDetails {
    /// The organization record
    #[serde(flatten)]
    pub organization: Organization,

    /// Events owned by the organization
    pub events: Vec<Event>,
}
