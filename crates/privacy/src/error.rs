use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("attribute '{name}' already exists on this resource")]
    Conflict { name: String },

    #[error("attribute not found: {name}")]
    NotFound { name: String },

    /// The attribute exists and none of the candidate values are accepted.
    #[error("'{attribute}' is not satisfied by {candidates:?}")]
    Unsatisfied {
        attribute: String,
        candidates: Vec<String>,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
