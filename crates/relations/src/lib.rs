//! SQLite-backed registry of named relations between principals.
//!
//! Every principal can define its own relation *types* ("member",
//! "collaborator", ...) and grant them to other principals. A grant is a
//! *membership* edge from a relation type to a target. The registry answers
//! one core question: which relation names link an owner to a given target?
//! That answer is the candidate set fed into privacy-policy checks.
//!
//! # Core Concepts
//!
//! ## RelationRegistry
//!
//! The [`RelationRegistry`] is the persistence interface. It wraps a SQLite
//! database holding two tables — relation types and membership edges — and
//! provides the define/relate/unrelate/query operations.
//!
//! ## RelationType
//!
//! A [`RelationType`] is identified by `(owner, name)`; defining the same
//! name twice under one owner fails with [`Error::Conflict`]. Two different
//! owners can each define `"member"` independently.
//!
//! ## Membership
//!
//! A [`Membership`] is one grant of a relation type to a target principal.
//! Edges are not unique: relating the same target twice stores two edges,
//! and queries treat the result as a set. Deleting a relation type does
//! *not* delete its edges — orphaned edges simply stop resolving, because
//! every lookup goes through the `(owner, name)` pair first.
//!
//! # Example
//!
//! ```no_run
//! use relations::{PrincipalId, RelationRegistry};
//!
//! let registry = RelationRegistry::open("kith.db")?;
//!
//! let alice = PrincipalId::new();
//! let bob = PrincipalId::new();
//!
//! registry.define(alice, "member")?;
//! registry.relate(alice, "member", bob)?;
//!
//! let names = registry.names_between(alice, bob)?;
//! assert!(names.contains("member"));
//! # Ok::<(), relations::Error>(())
//! ```

mod error;
mod record;
mod registry;

pub use error::{Error, Result};
pub use record::{Membership, PrincipalId, RelationType};
pub use registry::RelationRegistry;
