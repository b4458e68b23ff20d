//! SQLite policy store implementation.

use crate::{AttributeValue, Error, PrivacyAttribute, ResourceId, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed store of privacy attributes and their accepted values.
pub struct PolicyStore {
    conn: Connection,
}

impl PolicyStore {
    /// Open or create a policy store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory policy store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS privacy_attributes (
                id TEXT PRIMARY KEY,
                resource TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_privacy_attributes_resource_name
                ON privacy_attributes(resource, name);
            CREATE TABLE IF NOT EXISTS attribute_values (
                id TEXT PRIMARY KEY,
                attribute TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_attribute_values_attribute
                ON attribute_values(attribute);
            "#,
        )?;
        Ok(())
    }

    /// Create a privacy attribute on a resource.
    ///
    /// Fails with [`Error::Conflict`] if the resource already has an
    /// attribute with this name.
    pub fn create_attribute(&self, resource: ResourceId, name: &str) -> Result<PrivacyAttribute> {
        let attribute = PrivacyAttribute::new(resource, name);
        let result = self.conn.execute(
            "INSERT INTO privacy_attributes (id, resource, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                attribute.id.to_string(),
                attribute.resource.to_string(),
                attribute.name,
                attribute.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => {
                tracing::debug!(resource = %resource, name, "attribute created");
                Ok(attribute)
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

    /// Delete a privacy attribute.
    ///
    /// Removes the attribute row only. Its value rows are left in place but
    /// stop resolving; subsequent checks on the name fall back to the
    /// default-allow path. Deleting an undefined attribute is a no-op.
    pub fn delete_attribute(&self, resource: ResourceId, name: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM privacy_attributes WHERE resource = ?1 AND name = ?2",
            params![resource.to_string(), name],
        )?;
        tracing::debug!(resource = %resource, name, "attribute deleted");
        Ok(())
    }

    /// Add `value` to the attribute's accepted set.
    ///
    /// Fails with [`Error::NotFound`] if the attribute does not exist.
    /// Assigning the same value twice is harmless; acceptance is evaluated
    /// as a set.
    pub fn assign_value(&self, resource: ResourceId, name: &str, value: &str) -> Result<()> {
        let attribute = self.resolve(resource, name)?;
        let row = AttributeValue::new(attribute, value);
        self.conn.execute(
            "INSERT INTO attribute_values (id, attribute, value, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                row.id.to_string(),
                row.attribute.to_string(),
                row.value,
                row.created_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(resource = %resource, name, value, "value assigned");
        Ok(())
    }

    /// Remove `value` from the attribute's accepted set.
    ///
    /// Fails with [`Error::NotFound`] if the attribute does not exist.
    /// Removal is best-effort: all matching rows go, and removing a value
    /// that was never assigned is not an error.
    pub fn remove_value(&self, resource: ResourceId, name: &str, value: &str) -> Result<()> {
        let attribute = self.resolve(resource, name)?;
        self.conn.execute(
            "DELETE FROM attribute_values WHERE attribute = ?1 AND value = ?2",
            params![attribute.to_string(), value],
        )?;
        tracing::debug!(resource = %resource, name, value, "value removed");
        Ok(())
    }

    /// The accepted value set of an attribute (strict path).
    ///
    /// Fails with [`Error::NotFound`] if the attribute does not exist —
    /// unlike the satisfaction checks, which treat a missing attribute as
    /// default-allow.
    pub fn accepted_values(&self, resource: ResourceId, name: &str) -> Result<HashSet<String>> {
        let attribute = self.resolve(resource, name)?;
        self.values_set(attribute)
    }

    /// List all privacy attributes on a resource, oldest first.
    pub fn list_attributes(&self, resource: ResourceId) -> Result<Vec<PrivacyAttribute>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, resource, name, created_at FROM privacy_attributes
             WHERE resource = ?1 ORDER BY created_at",
        )?;
        let attributes = stmt
            .query_map([resource.to_string()], |row| {
                let id: String = row.get(0)?;
                let resource: String = row.get(1)?;
                let name: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, resource, name, created_at))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, resource, name, created_at)| {
                Some(PrivacyAttribute {
                    id: id.parse().ok()?,
                    resource: resource.parse().ok()?,
                    name,
                    created_at: created_at.parse().ok()?,
                })
            })
            .collect();
        Ok(attributes)
    }

    /// All value rows under an attribute, by attribute id.
    ///
    /// Keyed on the parent id so orphaned rows remain reachable after the
    /// attribute row is deleted.
    pub fn values_of(&self, attribute: Uuid) -> Result<Vec<AttributeValue>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, attribute, value, created_at FROM attribute_values
             WHERE attribute = ?1 ORDER BY created_at",
        )?;
        let values = stmt
            .query_map([attribute.to_string()], |row| {
                let id: String = row.get(0)?;
                let attribute: String = row.get(1)?;
                let value: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok((id, attribute, value, created_at))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, attribute, value, created_at)| {
                Some(AttributeValue {
                    id: id.parse().ok()?,
                    attribute: attribute.parse().ok()?,
                    value,
                    created_at: created_at.parse().ok()?,
                })
            })
            .collect();
        Ok(values)
    }

    /// Whether any candidate value satisfies the attribute.
    ///
    /// **Fail-open**: a resource with no attribute named `name` has no
    /// policy for that capability, and the check passes unconditionally —
    /// "no policy defined" means "public". Call sites rely on this; an
    /// unguarded resource must stay reachable. When the attribute exists,
    /// the check passes iff the candidate set intersects the accepted set
    /// (any one name suffices).
    pub fn is_satisfied_by(
        &self,
        resource: ResourceId,
        name: &str,
        candidates: &HashSet<String>,
    ) -> Result<bool> {
        let Some(attribute) = self.lookup(resource, name)? else {
            tracing::debug!(resource = %resource, name, "no attribute, default-allow");
            return Ok(true);
        };
        let accepted = self.values_set(attribute)?;
        Ok(!accepted.is_disjoint(candidates))
    }

    /// Assert that some candidate value satisfies the attribute.
    ///
    /// Same predicate as [`is_satisfied_by`](Self::is_satisfied_by),
    /// fail-open included; fails with [`Error::Unsatisfied`] when the
    /// attribute exists and no candidate is accepted.
    pub fn assert_satisfied_by(
        &self,
        resource: ResourceId,
        name: &str,
        candidates: &HashSet<String>,
    ) -> Result<()> {
        if self.is_satisfied_by(resource, name, candidates)? {
            Ok(())
        } else {
            Err(Error::Unsatisfied {
                attribute: name.to_string(),
                candidates: candidates.iter().cloned().collect(),
            })
        }
    }

    fn values_set(&self, attribute: Uuid) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM attribute_values WHERE attribute = ?1")?;
        let values = stmt
            .query_map([attribute.to_string()], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(values)
    }

    fn lookup(&self, resource: ResourceId, name: &str) -> Result<Option<Uuid>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM privacy_attributes WHERE resource = ?1 AND name = ?2",
                params![resource.to_string(), name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.and_then(|s| s.parse().ok()))
    }

    fn resolve(&self, resource: ResourceId, name: &str) -> Result<Uuid> {
        self.lookup(resource, name)?.ok_or(Error::NotFound {
            name: name.to_string(),
        })
    }
}
