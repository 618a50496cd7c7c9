use std::path::{Component, Path};

use crate::error::{CacheError, CacheResult};
use crate::handle::{ObjectReader, StagedObject};

/// Local store for fetched repository objects.
///
/// Keys are relative object paths as the origin names them. All
/// implementations must satisfy these invariants:
/// - `get` only ever returns fully committed content.
/// - `begin` hands out a private staging handle invisible to `get`.
/// - `commit` reveals the staged content atomically. If the key already
///   holds content, the last commit wins and readers of the old content are
///   unaffected.
/// - Dropping a [`StagedObject`] without committing discards it.
pub trait ObjectCache: Send + Sync {
    /// Open previously committed content for `key`.
    ///
    /// Returns `Ok(None)` if nothing is committed under `key`.
    fn get(&self, key: &str) -> CacheResult<Option<ObjectReader>>;

    /// Open a private staging destination for new content under `key`.
    fn begin(&self, key: &str) -> CacheResult<StagedObject>;

    /// Reveal staged content under its key and return a reader positioned at
    /// the start of it.
    fn commit(&self, staged: StagedObject) -> CacheResult<ObjectReader>;

    /// Root directory of a durable cache, if any.
    fn root(&self) -> Option<&Path> {
        None
    }
}

/// Reject keys that are empty, absolute, or contain `..`/`.` components.
pub fn validate_key(key: &str) -> CacheResult<()> {
    let path = Path::new(key);
    if key.is_empty() || path.is_absolute() {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    let all_normal = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_are_valid_keys() {
        assert!(validate_key("data/ab/cdefC").is_ok());
        assert!(validate_key(".published").is_ok());
    }

    #[test]
    fn traversal_is_rejected() {
        for key in ["", "/etc/passwd", "../outside", "data/../../x", "./data/ab/c"] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, CacheError::InvalidKey(_)), "{key}");
        }
    }
}
