//! Relation-based access decisions.
//!
//! This crate joins the two stores into one question: may this principal
//! exercise this capability on this resource? The [`AccessEngine`] looks
//! up the relation names linking the resource's owner to the principal,
//! then asks the resource's privacy policy whether any of them is
//! accepted. It keeps no state of its own.
//!
//! # Example
//!
//! ```no_run
//! use access::AccessEngine;
//! use privacy::{PolicyStore, ResourceId};
//! use relations::{PrincipalId, RelationRegistry};
//!
//! let registry = RelationRegistry::in_memory()?;
//! let policies = PolicyStore::in_memory()?;
//! let engine = AccessEngine::new(&registry, &policies);
//!
//! let owner = PrincipalId::new();
//! let reader = PrincipalId::new();
//! let post = ResourceId::new();
//!
//! registry.define(owner, "friend")?;
//! policies.create_attribute(post, "read")?;
//! policies.assign_value(post, "read", "friend")?;
//!
//! assert!(!engine.is_allowed(owner, post, reader, "read")?);
//! registry.relate(owner, "friend", reader)?;
//! assert!(engine.is_allowed(owner, post, reader, "read")?);
//! # Ok::<(), access::Error>(())
//! ```

mod engine;
mod error;

pub use engine::{AccessEngine, OwnerResolver};
pub use error::{Error, Result};
