/// Errors from object cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key is empty, absolute, or escapes the cache root.
    #[error("invalid cache key: {0:?}")]
    InvalidKey(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
