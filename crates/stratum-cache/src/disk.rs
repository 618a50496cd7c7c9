use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stratum_types::{names, shard_directories, DATA_DIR};
use tracing::debug;

use crate::error::CacheResult;
use crate::handle::{ObjectReader, StagedObject};
use crate::traits::{validate_key, ObjectCache};

/// Name of the staging directory under `data/`.
const STAGING_DIR: &str = "txn";

/// Durable, sharded on-disk object cache.
///
/// Layout under the root:
///
/// ```text
/// data/00 … data/ff   committed content objects, by first two hash chars
/// data/txn            private staging files
/// .published, …       endpoint metadata (purged on open)
/// ```
///
/// Several processes may share one root: content only becomes visible by
/// rename from `data/txn`, and every writer of a key writes the same bytes.
#[derive(Debug)]
pub struct DiskCache {
    root: PathBuf,
    staging: PathBuf,
}

impl DiskCache {
    /// Open (or create) a cache rooted at `root`.
    ///
    /// Creates the 256 shard directories and the staging directory, then
    /// deletes endpoint metadata left over from a previous session.
    pub fn open(root: impl AsRef<Path>) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        let staging = root.join(DATA_DIR).join(STAGING_DIR);
        let cache = Self { root, staging };
        cache.create_layout()?;
        cache.purge_metadata()?;
        debug!(root = %cache.root.display(), "opened disk cache");
        Ok(cache)
    }

    /// The cache root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// The staging directory for in-flight writes.
    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    fn create_layout(&self) -> io::Result<()> {
        let data = self.root.join(DATA_DIR);
        fs::create_dir_all(&data)?;
        for shard in shard_directories() {
            ensure_dir(&data.join(shard))?;
        }
        ensure_dir(&self.staging)
    }

    fn purge_metadata(&self) -> io::Result<()> {
        for name in names::METADATA {
            match fs::remove_file(self.root.join(name)) {
                Ok(()) => debug!(name, "purged stale metadata"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> CacheResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

impl ObjectCache for DiskCache {
    fn get(&self, key: &str) -> CacheResult<Option<ObjectReader>> {
        let path = self.path_for(key)?;
        match File::open(&path) {
            Ok(file) if !file.metadata()?.is_file() => Ok(None),
            Ok(file) => {
                debug!(key, "cache hit");
                Ok(Some(ObjectReader::new(file, Some(path))?))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn begin(&self, key: &str) -> CacheResult<StagedObject> {
        validate_key(key)?;
        let file = tempfile::Builder::new()
            .prefix("tmp.")
            .tempfile_in(&self.staging)?;
        Ok(StagedObject::new(key, file))
    }

    fn commit(&self, staged: StagedObject) -> CacheResult<ObjectReader> {
        let dest = self.path_for(staged.key())?;
        let (key, mut file) = staged.into_parts();
        file.flush()?;
        file.as_file().sync_all()?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        // Rename over any existing content; readers holding the old file keep it.
        file.persist(&dest).map_err(|e| e.error)?;
        debug!(key = %key, "committed to disk cache");
        let reader = ObjectReader::new(File::open(&dest)?, Some(dest))?;
        Ok(reader)
    }

    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}
