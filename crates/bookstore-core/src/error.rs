//! Error types for catalog access, validation, and search.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The underlying store failed or is unreachable. Distinct from an
    /// empty result set, which is a normal search outcome.
    #[error("catalog unavailable: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A book draft failed its precondition check before insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}
