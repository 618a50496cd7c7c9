//! Read-only client for Stratum repositories.
//!
//! This is the main entry point for applications inspecting a repository.
//! A [`Repository`] is opened from a local directory or an `http://`
//! endpoint, optionally verified against the owner's public key, and then
//! used to fetch objects, resolve which catalog owns a path, and walk the
//! nested catalog tree.
//!
//! ```no_run
//! use stratum_repo::{open_repository, RepositoryConfig};
//!
//! # fn main() -> stratum_repo::RepoResult<()> {
//! let config = RepositoryConfig::default()
//!     .with_cache_dir("/var/cache/stratum")
//!     .with_public_key("/etc/stratum/keys/sw.example.org.pub");
//! let repo = open_repository("http://mirror.example.org/stratum/sw.example.org", &config)?;
//! for item in repo.dirents()? {
//!     let (path, entry) = item?;
//!     println!("{path} {}", entry.kind);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod repository;
pub mod trust;
pub mod walk;

#[cfg(test)]
pub(crate) mod fixture;

pub use config::RepositoryConfig;
pub use error::{RepoError, RepoResult, VerificationFailure};
pub use repository::{open_repository, Repository, RepositoryKind};
pub use trust::verify_chain;
pub use walk::{CatalogTreeWalk, DirentWalk};

// Re-export key types
pub use stratum_catalog::{
    Catalog, Certificate, DirectoryEntry, EntryKind, History, Manifest, NestedCatalogRef, Tag,
    Whitelist,
};
pub use stratum_crypto::VerifyingKey;
pub use stratum_fetch::Codec;
pub use stratum_types::{ContentHash, ObjectSuffix};
