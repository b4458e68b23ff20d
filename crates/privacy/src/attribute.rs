//! Privacy attribute records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a protected resource.
///
/// Resources are opaque: a post, a community, a reply. The store never
/// inspects them beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub Uuid);

impl ResourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A named capability guarding a resource (e.g. "read", "reply").
///
/// Identified by `(resource, name)`. The attribute itself carries no
/// values; acceptance is decided by the [`AttributeValue`] rows under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyAttribute {
    pub id: Uuid,
    pub resource: ResourceId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl PrivacyAttribute {
    pub fn new(resource: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// One accepted relation name under a privacy attribute.
///
/// An attribute with values `{"member", "collaborator"}` is satisfied by
/// either name. Values form a set; duplicates are stored but harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: Uuid,
    pub attribute: Uuid,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl AttributeValue {
    pub fn new(attribute: Uuid, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            attribute,
            value: value.into(),
            created_at: Utc::now(),
        }
    }
}
