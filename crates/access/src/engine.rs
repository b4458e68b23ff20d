//! Access decisions over relations and privacy policies.

use crate::{Error, Result};
use privacy::{PolicyStore, ResourceId};
use relations::{PrincipalId, RelationRegistry, RelationType};

/// Resolves a resource to its owning principal.
///
/// Owner resolution belongs to whatever stores the resource (a post's
/// author, a community's creator), so call sites inject it. Implemented
/// for plain closures.
pub trait OwnerResolver {
    fn owner_of(&self, resource: ResourceId) -> Option<PrincipalId>;
}

impl<F> OwnerResolver for F
where
    F: Fn(ResourceId) -> Option<PrincipalId>,
{
    fn owner_of(&self, resource: ResourceId) -> Option<PrincipalId> {
        self(resource)
    }
}

/// Stateless coordinator joining the relation registry and the policy
/// store into a single access decision.
///
/// The engine holds no data of its own; every check is two lookups. It is
/// generic over what "owner", "resource", and "capability" mean — the same
/// procedure guards reading a community, replying to a post, or anything
/// else a call site cares to protect.
pub struct AccessEngine<'a> {
    relations: &'a RelationRegistry,
    policies: &'a PolicyStore,
}

impl<'a> AccessEngine<'a> {
    pub fn new(relations: &'a RelationRegistry, policies: &'a PolicyStore) -> Self {
        Self {
            relations,
            policies,
        }
    }

    /// Check that `principal` may exercise `capability` on `resource`.
    ///
    /// The candidate set is the relation names `owner` has granted
    /// `principal`; the resource's policy must accept one of them. Fails
    /// with [`Error::Forbidden`] when the policy exists and rejects every
    /// candidate. A resource with no policy for the capability passes
    /// (the store's default-allow path). Lookup failures propagate
    /// unchanged — an unresolved relation or attribute is a caller bug,
    /// not a denial.
    pub fn check_capability(
        &self,
        owner: PrincipalId,
        resource: ResourceId,
        principal: PrincipalId,
        capability: &str,
    ) -> Result<()> {
        let names = self.relations.names_between(owner, principal)?;
        match self.policies.assert_satisfied_by(resource, capability, &names) {
            Ok(()) => {
                tracing::debug!(principal = %principal, resource = %resource, capability, "allowed");
                Ok(())
            }
            Err(err @ privacy::Error::Unsatisfied { .. }) => {
                tracing::debug!(principal = %principal, resource = %resource, capability, "denied");
                Err(Error::Forbidden(err))
            }
            Err(err) => Err(Error::Privacy(err)),
        }
    }

    /// Non-asserting form of [`check_capability`](Self::check_capability).
    pub fn is_allowed(
        &self,
        owner: PrincipalId,
        resource: ResourceId,
        principal: PrincipalId,
        capability: &str,
    ) -> Result<bool> {
        let names = self.relations.names_between(owner, principal)?;
        self.policies
            .is_satisfied_by(resource, capability, &names)
            .map_err(Error::Privacy)
    }

    /// Check a capability, resolving the resource's owner first.
    ///
    /// Fails with [`Error::UnknownResource`] when the resolver cannot name
    /// an owner.
    pub fn check_resource(
        &self,
        resolver: &impl OwnerResolver,
        resource: ResourceId,
        principal: PrincipalId,
        capability: &str,
    ) -> Result<()> {
        let owner = resolver
            .owner_of(resource)
            .ok_or(Error::UnknownResource(resource))?;
        self.check_capability(owner, resource, principal, capability)
    }

    /// Make a resource private in one step.
    ///
    /// Defines `relation` with the resource's own id acting as the owning
    /// principal, then guards each capability with an attribute accepting
    /// only that relation. This is the standard bootstrap for resources
    /// that manage their own membership, e.g. a private community guarding
    /// "read" and "post" behind "member". Grant access afterwards with
    /// [`RelationRegistry::relate`] under the returned relation type.
    pub fn protect(
        &self,
        resource: ResourceId,
        relation: &str,
        capabilities: &[&str],
    ) -> Result<RelationType> {
        let owner = PrincipalId(resource.0);
        let relation_type = self.relations.define(owner, relation)?;
        for capability in capabilities {
            self.policies.create_attribute(resource, capability)?;
            self.policies.assign_value(resource, capability, relation)?;
        }
        tracing::debug!(resource = %resource, relation, ?capabilities, "resource protected");
        Ok(relation_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> (RelationRegistry, PolicyStore) {
        (
            RelationRegistry::in_memory().unwrap(),
            PolicyStore::in_memory().unwrap(),
        )
    }

    #[test]
    fn relation_grants_capability() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let owner = PrincipalId::new();
        let reader = PrincipalId::new();
        let resource = ResourceId::new();

        registry.define(owner, "member").unwrap();
        policies.create_attribute(resource, "read").unwrap();
        policies.assign_value(resource, "read", "member").unwrap();

        // Not yet related: denied.
        let err = engine
            .check_capability(owner, resource, reader, "read")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
        assert!(!engine.is_allowed(owner, resource, reader, "read").unwrap());

        // Related: allowed.
        registry.relate(owner, "member", reader).unwrap();
        engine
            .check_capability(owner, resource, reader, "read")
            .unwrap();
        assert!(engine.is_allowed(owner, resource, reader, "read").unwrap());

        // Revoked: denied again.
        registry.unrelate(owner, "member", reader).unwrap();
        let err = engine
            .check_capability(owner, resource, reader, "read")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn unguarded_capability_is_allowed() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let owner = PrincipalId::new();
        let stranger = PrincipalId::new();
        let resource = ResourceId::new();

        // No attribute on the resource at all: anyone passes.
        engine
            .check_capability(owner, resource, stranger, "read")
            .unwrap();
    }

    #[test]
    fn capabilities_are_independent() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let owner = PrincipalId::new();
        let viewer = PrincipalId::new();
        let resource = ResourceId::new();

        registry.define(owner, "viewer").unwrap();
        registry.relate(owner, "viewer", viewer).unwrap();
        policies.create_attribute(resource, "read").unwrap();
        policies.assign_value(resource, "read", "viewer").unwrap();
        policies.create_attribute(resource, "reply").unwrap();
        policies.assign_value(resource, "reply", "collaborator").unwrap();

        engine
            .check_capability(owner, resource, viewer, "read")
            .unwrap();
        let err = engine
            .check_capability(owner, resource, viewer, "reply")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn resolver_failure_is_not_a_denial() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let resource = ResourceId::new();
        let principal = PrincipalId::new();
        let resolver = |_: ResourceId| -> Option<PrincipalId> { None };

        let err = engine
            .check_resource(&resolver, resource, principal, "read")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownResource(r) if r == resource));
    }

    #[test]
    fn check_resource_uses_resolved_owner() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let author = PrincipalId::new();
        let reader = PrincipalId::new();
        let post = ResourceId::new();

        registry.define(author, "friend").unwrap();
        registry.relate(author, "friend", reader).unwrap();
        policies.create_attribute(post, "readReplies").unwrap();
        policies.assign_value(post, "readReplies", "friend").unwrap();

        let resolver = move |r: ResourceId| (r == post).then_some(author);
        engine
            .check_resource(&resolver, post, reader, "readReplies")
            .unwrap();

        let stranger = PrincipalId::new();
        let err = engine
            .check_resource(&resolver, post, stranger, "readReplies")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn protect_bootstraps_a_private_resource() {
        let (registry, policies) = stores();
        let engine = AccessEngine::new(&registry, &policies);

        let community = ResourceId::new();
        let member = PrincipalId::new();
        let community_owner = PrincipalId(community.0);

        engine
            .protect(community, "member", &["read", "post"])
            .unwrap();

        // The community id itself owns the relation; outsiders are shut out
        // of both guarded capabilities.
        let err = engine
            .check_capability(community_owner, community, member, "read")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        // Joining grants everything the relation guards.
        registry.relate(community_owner, "member", member).unwrap();
        engine
            .check_capability(community_owner, community, member, "read")
            .unwrap();
        engine
            .check_capability(community_owner, community, member, "post")
            .unwrap();
    }
}
