use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stratum_crypto::VerifyingKey;
use stratum_fetch::Codec;

use crate::error::{RepoError, RepoResult};

/// Directory holding locally hosted repositories, one per subdirectory.
pub const DEFAULT_LOCAL_ROOT: &str = "/srv/stratum";

/// Options for opening a repository.
///
/// Every field is optional in TOML:
///
/// ```toml
/// cache_dir = "/var/cache/stratum"
/// public_key = "/etc/stratum/keys/sw.example.org.pub"
/// local_root = "/srv/stratum"
/// codec = "zlib"
/// timeout_secs = 30
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Durable cache root. Without one, fetched objects live only as long
    /// as their readers.
    pub cache_dir: Option<PathBuf>,
    /// Repository owner's public key; `open_repository` verifies when set.
    pub public_key: Option<PathBuf>,
    /// Where bare repository names are looked up.
    pub local_root: PathBuf,
    /// Compression applied to content objects at the origin.
    pub codec: Codec,
    /// Bound on each remote request.
    pub timeout_secs: Option<u64>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            public_key: None,
            local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            codec: Codec::default(),
            timeout_secs: None,
        }
    }
}

impl RepositoryConfig {
    pub fn from_toml_str(input: &str) -> RepoResult<Self> {
        toml::from_str(input).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> RepoResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_public_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_key = Some(path.into());
        self
    }

    pub fn with_local_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_root = dir.into();
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Read the configured public key, if any.
    pub fn load_public_key(&self) -> RepoResult<Option<VerifyingKey>> {
        self.public_key
            .as_deref()
            .map(|path| {
                VerifyingKey::read_from_file(path).map_err(|e| RepoError::Config(e.to_string()))
            })
            .transpose()
    }
}
