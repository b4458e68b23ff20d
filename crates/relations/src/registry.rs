//! SQLite relation registry implementation.

use crate::{Error, Membership, PrincipalId, RelationType, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed store of relation types and membership edges.
pub struct RelationRegistry {
    conn: Connection,
}

impl RelationRegistry {
    /// Open or create a registry at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let registry = Self { conn };
        registry.init_schema()?;
        Ok(registry)
    }

    /// Create an in-memory registry (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let registry = Self { conn };
        registry.init_schema()?;
        Ok(registry)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS relation_types (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_relation_types_owner_name
                ON relation_types(owner, name);
            CREATE TABLE IF NOT EXISTS memberships (
                id TEXT PRIMARY KEY,
                relation_type TEXT NOT NULL,
                target TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_memberships_type
                ON memberships(relation_type, target);
            "#,
        )?;
        Ok(())
    }

    /// Define a new relation type for `owner`.
    ///
    /// Fails with [`Error::Conflict`] if the owner already has a relation
    /// with this name. Different owners can reuse the same name freely.
    pub fn define(&self, owner: PrincipalId, name: &str) -> Result<RelationType> {
        let relation = RelationType::new(owner, name);
        let result = self.conn.execute(
            "INSERT INTO relation_types (id, owner, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                relation.id.to_string(),
                relation.owner.to_string(),
                relation.name,
                relation.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => {
                tracing::debug!(owner = %owner, name, "relation defined");
                Ok(relation)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::Conflict {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a relation type.
    ///
    /// Removes the type row only. Existing membership edges are left in
    /// place but stop resolving, since every lookup goes through the
    /// `(owner, name)` pair first. Deleting an undefined type is a no-op.
    pub fn delete(&self, owner: PrincipalId, name: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM relation_types WHERE owner = ?1 AND name = ?2",
            params![owner.to_string(), name],
        )?;
        tracing::debug!(owner = %owner, name, "relation deleted");
        Ok(())
    }

    /// Grant `target` the relation `name` defined by `owner`.
    ///
    /// Fails with [`Error::NotFound`] if the relation is undefined. There is
    /// no uniqueness check on edges: relating the same target twice stores
    /// two edges, which query paths collapse into one name.
    pub fn relate(&self, owner: PrincipalId, name: &str, target: PrincipalId) -> Result<()> {
        let relation_type = self.resolve(owner, name)?;
        let edge = Membership::new(relation_type, target);
        self.conn.execute(
            "INSERT INTO memberships (id, relation_type, target, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                edge.id.to_string(),
                edge.relation_type.to_string(),
                edge.target.to_string(),
                edge.created_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(owner = %owner, name, target = %target, "related");
        Ok(())
    }

    /// Revoke the relation `name` from `target`.
    ///
    /// Fails with [`Error::NotFound`] if the relation is undefined. Deletion
    /// is best-effort: all matching edges are removed (including duplicates),
    /// and removing a grant that was never made is not an error.
    pub fn unrelate(&self, owner: PrincipalId, name: &str, target: PrincipalId) -> Result<()> {
        let relation_type = self.resolve(owner, name)?;
        self.conn.execute(
            "DELETE FROM memberships WHERE relation_type = ?1 AND target = ?2",
            params![relation_type.to_string(), target.to_string()],
        )?;
        tracing::debug!(owner = %owner, name, target = %target, "unrelated");
        Ok(())
    }

    /// The set of relation names linking `owner` to `target`.
    ///
    /// This is the candidate set fed into privacy checks. Duplicate edges
    /// collapse here, and edges whose relation type was deleted never
    /// appear, because the name resolution joins through the type row.
    pub fn names_between(&self, owner: PrincipalId, target: PrincipalId) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT rt.name FROM relation_types rt
             JOIN memberships m ON m.relation_type = rt.id
             WHERE rt.owner = ?1 AND m.target = ?2",
        )?;
        let names = stmt
            .query_map(params![owner.to_string(), target.to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(names)
    }

    /// List all relation types defined by `owner`, oldest first.
    pub fn list_types(&self, owner: PrincipalId) -> Result<Vec<RelationType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, name, created_at FROM relation_types
             WHERE owner = ?1 ORDER BY created_at",
        )?;
        let types = stmt
            .query_map([owner.to_string()], |row| {
                let id: String = row.get(0)?;
                let owner: String = row.get(1)?;
                let name: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, owner, name, created_at))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, owner, name, created_at)| {
                Some(RelationType {
                    id: id.parse().ok()?,
                    owner: owner.parse().ok()?,
                    name,
                    created_at: created_at.parse().ok()?,
                })
            })
            .collect();
        Ok(types)
    }

    /// List the principals granted the relation `name`, oldest grant first.
    ///
    /// Fails with [`Error::NotFound`] if the relation is undefined. A target
    /// related more than once appears once.
    pub fn list_members(&self, owner: PrincipalId, name: &str) -> Result<Vec<PrincipalId>> {
        let relation_type = self.resolve(owner, name)?;
        let mut stmt = self.conn.prepare(
            "SELECT target, MIN(created_at) FROM memberships
             WHERE relation_type = ?1 GROUP BY target ORDER BY MIN(created_at)",
        )?;
        let members = stmt
            .query_map([relation_type.to_string()], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|target| target.parse().ok())
            .collect();
        Ok(members)
    }

    /// All membership edges under a relation type, by type id.
    ///
    /// Keyed on the parent id so orphaned edges remain reachable after the
    /// type row is deleted.
    pub fn memberships_of(&self, relation_type: Uuid) -> Result<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, relation_type, target, created_at FROM memberships
             WHERE relation_type = ?1 ORDER BY created_at",
        )?;
        let edges = stmt
            .query_map([relation_type.to_string()], |row| {
                let id: String = row.get(0)?;
                let relation_type: String = row.get(1)?;
                let target: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, relation_type, target, created_at))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, relation_type, target, created_at)| {
                Some(Membership {
                    id: id.parse().ok()?,
                    relation_type: relation_type.parse().ok()?,
                    target: target.parse().ok()?,
                    created_at: created_at.parse().ok()?,
                })
            })
            .collect();
        Ok(edges)
    }

    fn resolve(&self, owner: PrincipalId, name: &str) -> Result<Uuid> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM relation_types WHERE owner = ?1 AND name = ?2",
                params![owner.to_string(), name],
                |row| row.get(0),
            )
            .optional()?;
        id.and_then(|s| s.parse().ok()).ok_or(Error::NotFound {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_rejects_duplicate_name() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();

        registry.define(owner, "member").unwrap();
        let err = registry.define(owner, "member").unwrap_err();
        assert!(matches!(err, Error::Conflict { name } if name == "member"));
    }

    #[test]
    fn same_name_under_different_owners() {
        let registry = RelationRegistry::in_memory().unwrap();
        let a = PrincipalId::new();
        let b = PrincipalId::new();

        registry.define(a, "member").unwrap();
        registry.define(b, "member").unwrap();

        assert_eq!(registry.list_types(a).unwrap().len(), 1);
        assert_eq!(registry.list_types(b).unwrap().len(), 1);
    }

    #[test]
    fn relate_then_query() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        registry.define(owner, "member").unwrap();
        registry.relate(owner, "member", target).unwrap();

        let names = registry.names_between(owner, target).unwrap();
        assert!(names.contains("member"));

        registry.unrelate(owner, "member", target).unwrap();
        let names = registry.names_between(owner, target).unwrap();
        assert!(!names.contains("member"));
    }

    #[test]
    fn relate_requires_defined_relation() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        let err = registry.relate(owner, "member", target).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn unrelate_without_grant_is_noop() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        registry.define(owner, "member").unwrap();
        registry.unrelate(owner, "member", target).unwrap();
    }

    #[test]
    fn duplicate_edges_collapse_in_queries() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        let relation = registry.define(owner, "member").unwrap();
        registry.relate(owner, "member", target).unwrap();
        registry.relate(owner, "member", target).unwrap();

        // Two edges stored, one name reported.
        assert_eq!(registry.memberships_of(relation.id).unwrap().len(), 2);
        let names = registry.names_between(owner, target).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(registry.list_members(owner, "member").unwrap(), vec![target]);

        // Unrelate removes every matching edge, duplicates included.
        registry.unrelate(owner, "member", target).unwrap();
        assert!(registry.memberships_of(relation.id).unwrap().is_empty());
    }

    #[test]
    fn multiple_relations_between_same_pair() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        registry.define(owner, "member").unwrap();
        registry.define(owner, "collaborator").unwrap();
        registry.relate(owner, "member", target).unwrap();
        registry.relate(owner, "collaborator", target).unwrap();

        let names = registry.names_between(owner, target).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("member"));
        assert!(names.contains("collaborator"));
    }

    #[test]
    fn delete_does_not_cascade_to_edges() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let target = PrincipalId::new();

        let relation = registry.define(owner, "member").unwrap();
        registry.relate(owner, "member", target).unwrap();
        registry.delete(owner, "member").unwrap();

        // The orphaned edge is still on disk, reachable by parent id...
        assert_eq!(registry.memberships_of(relation.id).unwrap().len(), 1);

        // ...but no longer resolves through any name lookup.
        assert!(registry.names_between(owner, target).unwrap().is_empty());
        assert!(matches!(
            registry.relate(owner, "member", target).unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            registry.list_members(owner, "member").unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn list_types_scoped_to_owner() {
        let registry = RelationRegistry::in_memory().unwrap();
        let owner = PrincipalId::new();
        let other = PrincipalId::new();

        registry.define(owner, "member").unwrap();
        registry.define(owner, "collaborator").unwrap();
        registry.define(other, "guest").unwrap();

        let types = registry.list_types(owner).unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(types.len(), 2);
        assert!(names.contains(&"member"));
        assert!(names.contains(&"collaborator"));
    }
}
