use std::io::Write;
use std::path::PathBuf;

use crate::error::CacheResult;
use crate::handle::{ObjectReader, StagedObject};
use crate::traits::{validate_key, ObjectCache};

/// Cache that never hits.
///
/// Every fetched object is staged in an anonymous temp file and handed back
/// unlinked on commit, so nothing outlives the returned reader.
#[derive(Debug, Default)]
pub struct EphemeralCache {
    temp_dir: Option<PathBuf>,
}

impl EphemeralCache {
    /// Stage in the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage in a specific directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }
}

impl ObjectCache for EphemeralCache {
    fn get(&self, _key: &str) -> CacheResult<Option<ObjectReader>> {
        Ok(None)
    }

    fn begin(&self, key: &str) -> CacheResult<StagedObject> {
        validate_key(key)?;
        let file = match &self.temp_dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        Ok(StagedObject::new(key, file))
    }

    fn commit(&self, staged: StagedObject) -> CacheResult<ObjectReader> {
        let (_, mut file) = staged.into_parts();
        file.flush()?;
        let reader = ObjectReader::new(file.into_file(), None)?;
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn get_never_hits() {
        let cache = EphemeralCache::new();
        let mut staged = cache.begin("data/ab/cdef").unwrap();
        staged.write_all(b"payload").unwrap();
        cache.commit(staged).unwrap();
        assert!(cache.get("data/ab/cdef").unwrap().is_none());
    }

    #[test]
    fn commit_returns_staged_bytes() {
        let cache = EphemeralCache::new();
        let mut staged = cache.begin(".published").unwrap();
        staged.write_all(b"manifest bytes").unwrap();
        assert_eq!(staged.bytes_written(), 14);
        let mut reader = cache.commit(staged).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "manifest bytes");
        assert!(reader.path().is_none());
    }

    #[test]
    fn committed_content_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EphemeralCache::in_dir(dir.path());
        let mut staged = cache.begin("data/00/11").unwrap();
        staged.write_all(b"x").unwrap();
        let reader = cache.commit(staged).unwrap();
        assert_eq!(reader.into_bytes().unwrap(), b"x");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn dropped_stage_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EphemeralCache::in_dir(dir.path());
        {
            let mut staged = cache.begin("data/00/11").unwrap();
            staged.write_all(b"partial").unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_key_rejected() {
        let cache = EphemeralCache::new();
        assert!(cache.begin("../escape").is_err());
    }
}
