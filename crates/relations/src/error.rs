use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("relation '{name}' is already defined for this owner")]
    Conflict { name: String },

    #[error("relation not found: {name}")]
    NotFound { name: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
