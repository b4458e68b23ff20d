//! Relation-type and membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a principal.
///
/// Principals are opaque: a user, a community, or anything else that can
/// own relation types or be granted one. Callers are trusted to supply
/// valid identifiers; the registry never authenticates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A named category of relationship an owner can grant to other principals.
///
/// Identified by `(owner, name)`, unique per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationType {
    pub id: Uuid,
    pub owner: PrincipalId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl RelationType {
    pub fn new(owner: PrincipalId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// One grant of a relation type to a target principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub relation_type: Uuid,
    pub target: PrincipalId,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(relation_type: Uuid, target: PrincipalId) -> Self {
        Self {
            id: Uuid::new_v4(),
            relation_type,
            target,
            created_at: Utc::now(),
        }
    }
}
