use privacy::ResourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The principal's relations to the owner do not satisfy the
    /// resource's policy for the requested capability.
    #[error("forbidden: {0}")]
    Forbidden(#[source] privacy::Error),

    /// The injected resolver knows no owner for the resource.
    #[error("no known owner for resource {0}")]
    UnknownResource(ResourceId),

    #[error(transparent)]
    Relations(#[from] relations::Error),

    /// A policy-store failure other than an unsatisfied check; the
    /// decision paths map [`privacy::Error::Unsatisfied`] to
    /// [`Error::Forbidden`] before this conversion applies.
    #[error(transparent)]
    Privacy(#[from] privacy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
