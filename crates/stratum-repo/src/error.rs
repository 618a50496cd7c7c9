use chrono::{DateTime, Utc};
use stratum_cache::CacheError;
use stratum_catalog::FormatError;
use stratum_crypto::Fingerprint;
use stratum_fetch::FetchError;
use stratum_types::ContentHash;
use thiserror::Error;

/// The trust-chain step that rejected a repository.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("whitelist signature does not match the repository public key")]
    PublicKeyMismatch,

    #[error("whitelist expired at {expires}")]
    WhitelistExpired { expires: DateTime<Utc> },

    #[error("certificate {fingerprint} is not on the whitelist")]
    CertificateNotWhitelisted { fingerprint: Fingerprint },

    #[error("manifest signature does not match the certificate")]
    ManifestSignatureMismatch,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("empty repository source")]
    EmptySource,

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// Absent at the origin, or the transfer failed.
    #[error("object not found: {name} ({reason})")]
    NotFound { name: String, reason: String },

    #[error("verification failed: {0}")]
    VerificationFailed(#[from] VerificationFailure),

    #[error("no nested catalog mounted at {path} in catalog {catalog}")]
    NestedCatalogNotFound { path: String, catalog: ContentHash },

    /// The origin served content that does not hash to the requested object.
    #[error("object {expected} has content hash {actual}")]
    HashMismatch {
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("repository has no history database")]
    HistoryNotFound,

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    /// Returns `true` for the absent-or-unreachable condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<FetchError> for RepoError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NotFound { name, reason } => Self::NotFound { name, reason },
            FetchError::Cache(e) => Self::Cache(e),
            FetchError::Client(msg) => Self::Config(msg),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
