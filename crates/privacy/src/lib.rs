//! SQLite-backed privacy policies for arbitrary resources.
//!
//! A resource owner attaches named *privacy attributes* to a resource, one
//! per guarded capability ("read", "reply", "delete", ...). Each attribute
//! carries a set of accepted relation names; a request satisfies the
//! attribute when any relation it holds is in that set.
//!
//! # Fail-open default
//!
//! The satisfaction checks ([`PolicyStore::is_satisfied_by`] and
//! [`PolicyStore::assert_satisfied_by`]) treat a resource with **no**
//! attribute for the requested capability as unguarded: the check passes
//! without consulting anything else. This is the intended "no policy
//! defined means public" semantic, not error suppression. Code that needs
//! to distinguish "unguarded" from "accepts these values" must use the
//! strict query path, [`PolicyStore::accepted_values`], which fails with
//! [`Error::NotFound`] instead.

mod attribute;
mod error;
mod store;

pub use attribute::{AttributeValue, PrivacyAttribute, ResourceId};
pub use error::{Error, Result};
pub use store::PolicyStore;
