use stratum_cache::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The origin has no such object, or it could not be transferred.
    ///
    /// Absence and transport failure are deliberately one condition; retry
    /// policy belongs to the caller.
    #[error("object not found: {name} ({reason})")]
    NotFound { name: String, reason: String },

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl FetchError {
    pub(crate) fn not_found(name: &str, reason: impl ToString) -> Self {
        Self::NotFound {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the absent-or-unreachable condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
