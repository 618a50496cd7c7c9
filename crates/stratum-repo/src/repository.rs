use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use stratum_cache::{DiskCache, EphemeralCache, ObjectCache, ObjectReader};
use stratum_catalog::{
    Catalog, Certificate, DirectoryEntry, FormatError, History, Manifest, NestedCatalogRef,
    Whitelist,
};
use stratum_crypto::VerifyingKey;
use stratum_fetch::{Fetcher, LocalOrigin, Origin, RemoteOrigin};
use stratum_types::{names, object_path, timestamp, ContentHash, ObjectSuffix};
use tracing::{debug, info, warn};

use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};
use crate::trust::verify_chain;
use crate::walk::{CatalogTreeWalk, DirentWalk};

/// Sources starting with this scheme are fetched over HTTP.
const REMOTE_SCHEME: &str = "http://";

/// Role of the server a repository was opened from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    /// The publishing master. Never inferred from the files a repository
    /// serves; callers that know the origin declare it with
    /// [`Repository::with_kind`].
    Stratum0,
    /// A replica; it carries a last-replication marker.
    Stratum1,
    Unknown,
}

impl std::fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stratum0 => write!(f, "stratum0"),
            Self::Stratum1 => write!(f, "stratum1"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An opened repository.
///
/// Holds the parsed manifest and replication state read at open time, and a
/// memo of every catalog opened so far, keyed by content hash. Catalogs are
/// immutable, so the memo never needs invalidating; it grows until entries
/// are released with [`Repository::close_catalog`].
///
/// A repository is unverified until [`Repository::verify`] succeeds.
pub struct Repository {
    endpoint: String,
    fetcher: Fetcher,
    manifest: Manifest,
    kind: RepositoryKind,
    last_replication: DateTime<Utc>,
    replicating_since: Option<DateTime<Utc>>,
    opened: RwLock<HashMap<ContentHash, Arc<Catalog>>>,
}

impl Repository {
    /// Open a repository by URL, directory, or name under the local root.
    ///
    /// `http://` sources are remote. Anything else is a directory if one
    /// exists at that path, otherwise a repository name under
    /// `config.local_root`.
    pub fn open(source: &str, config: &RepositoryConfig) -> RepoResult<Self> {
        if source.is_empty() {
            return Err(RepoError::EmptySource);
        }
        let origin: Box<dyn Origin> = if source.starts_with(REMOTE_SCHEME) {
            Box::new(RemoteOrigin::new(source, config.timeout())?)
        } else {
            Box::new(LocalOrigin::new(locate_local(source, &config.local_root)))
        };
        Self::with_origin(origin, config.cache_dir.as_deref(), config)
    }

    /// Open every repository hosted under `config.local_root`, sorted by
    /// directory name.
    ///
    /// With a durable cache, each repository gets its own subdirectory of
    /// `cache_dir` so endpoint metadata never mixes.
    pub fn open_all_local(config: &RepositoryConfig) -> RepoResult<Vec<Self>> {
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&config.local_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.file_name());
            }
        }
        dirs.sort();

        let mut repos = Vec::with_capacity(dirs.len());
        for name in dirs {
            let origin = Box::new(LocalOrigin::new(config.local_root.join(&name)));
            let cache_dir = config.cache_dir.as_ref().map(|dir| dir.join(&name));
            repos.push(Self::with_origin(origin, cache_dir.as_deref(), config)?);
        }
        Ok(repos)
    }

    fn with_origin(
        origin: Box<dyn Origin>,
        cache_dir: Option<&Path>,
        config: &RepositoryConfig,
    ) -> RepoResult<Self> {
        let cache: Box<dyn ObjectCache> = match cache_dir {
            Some(dir) => Box::new(DiskCache::open(dir)?),
            None => Box::new(EphemeralCache::new()),
        };
        Self::from_fetcher(Fetcher::new(origin, cache).with_codec(config.codec))
    }

    /// Open the repository behind an already-assembled fetcher.
    ///
    /// Fails with [`RepoError::RepositoryNotFound`] when no manifest can be
    /// fetched. Replication markers are read best-effort: an absent marker
    /// leaves the defaults, any other failure is returned.
    pub fn from_fetcher(fetcher: Fetcher) -> RepoResult<Self> {
        let endpoint = fetcher.origin().location();

        let manifest_bytes = match fetcher.retrieve_raw(names::MANIFEST) {
            Ok(reader) => reader.into_bytes()?,
            Err(e) if e.is_not_found() => {
                return Err(RepoError::RepositoryNotFound(format!("{endpoint}: {e}")));
            }
            Err(e) => return Err(e.into()),
        };
        let manifest = Manifest::parse(&manifest_bytes)?;

        let last_replication = read_marker(&fetcher, names::LAST_REPLICATION)?;
        let replicating_since = read_marker(&fetcher, names::REPLICATING)?;
        let kind = match last_replication {
            Some(_) => RepositoryKind::Stratum1,
            None => RepositoryKind::Unknown,
        };

        info!(
            %endpoint,
            name = manifest.repository_name(),
            %kind,
            root = %manifest.root_catalog().short_hex(),
            "opened repository"
        );
        Ok(Self {
            endpoint,
            fetcher,
            manifest,
            kind,
            last_replication: last_replication.unwrap_or_else(timestamp::epoch),
            replicating_since,
            opened: RwLock::new(HashMap::new()),
        })
    }

    // ---- Metadata ----

    /// Where this repository is served from (directory or base URL).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Repository name from the manifest.
    pub fn name(&self) -> &str {
        self.manifest.repository_name()
    }

    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    pub fn has_repository_kind(&self) -> bool {
        self.kind != RepositoryKind::Unknown
    }

    /// Override the kind inferred at open time.
    pub fn with_kind(mut self, kind: RepositoryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Time of the last completed replication; the epoch if never replicated.
    pub fn last_replication(&self) -> DateTime<Utc> {
        self.last_replication
    }

    pub fn is_replicating(&self) -> bool {
        self.replicating_since.is_some()
    }

    pub fn replicating_since(&self) -> Option<DateTime<Utc>> {
        self.replicating_since
    }

    pub fn has_history(&self) -> bool {
        self.manifest.history_database().is_some()
    }

    /// Root of the durable cache, if one is in use.
    pub fn cache_root(&self) -> Option<&Path> {
        self.fetcher.cache_root()
    }

    // ---- Trust chain ----

    /// Verify the trust chain against the owner's public key.
    ///
    /// A failure leaves the repository usable, just unverified.
    pub fn verify(&self, public_key: &VerifyingKey) -> RepoResult<()> {
        self.verify_at(public_key, Utc::now())
    }

    /// [`verify`](Self::verify) with an explicit clock.
    pub fn verify_at(&self, public_key: &VerifyingKey, now: DateTime<Utc>) -> RepoResult<()> {
        let whitelist = self.retrieve_whitelist()?;
        let certificate = self.retrieve_certificate()?;
        match verify_chain(&whitelist, &certificate, &self.manifest, public_key, now) {
            Ok(()) => {
                info!(endpoint = %self.endpoint, "repository verified");
                Ok(())
            }
            Err(failure) => {
                warn!(endpoint = %self.endpoint, %failure, "repository verification failed");
                Err(failure.into())
            }
        }
    }

    /// Fetch and parse the whitelist. Always read from the origin.
    pub fn retrieve_whitelist(&self) -> RepoResult<Whitelist> {
        let bytes = self.fetcher.refresh_raw(names::WHITELIST)?.into_bytes()?;
        Ok(Whitelist::parse(&bytes)?)
    }

    pub fn retrieve_certificate(&self) -> RepoResult<Certificate> {
        let bytes = self.retrieve_verified(self.manifest.certificate(), ObjectSuffix::Certificate)?;
        Ok(Certificate::parse(&bytes)?)
    }

    // ---- Objects ----

    /// Fetch and decompress the object stored under `hash` with `suffix`.
    pub fn retrieve_object(&self, hash: &str, suffix: ObjectSuffix) -> RepoResult<ObjectReader> {
        let path = object_path(hash, suffix.as_str());
        Ok(self.fetcher.retrieve(&path)?)
    }

    /// Fetch the object stored under `hash` and check that its content
    /// hashes back to it.
    fn retrieve_verified(&self, hash: ContentHash, suffix: ObjectSuffix) -> RepoResult<Vec<u8>> {
        let bytes = self.retrieve_object(&hash.to_hex(), suffix)?.into_bytes()?;
        let actual = ContentHash::of(&bytes);
        if actual != hash {
            return Err(RepoError::HashMismatch {
                expected: hash,
                actual,
            });
        }
        Ok(bytes)
    }

    pub fn retrieve_history(&self) -> RepoResult<History> {
        let hash = self
            .manifest
            .history_database()
            .ok_or(RepoError::HistoryNotFound)?;
        let bytes = self.retrieve_verified(hash, ObjectSuffix::History)?;
        Ok(History::parse(&bytes)?)
    }

    // ---- Catalogs ----

    pub fn retrieve_root_catalog(&self) -> RepoResult<Arc<Catalog>> {
        self.retrieve_catalog(self.manifest.root_catalog())
    }

    /// The catalog published under `hash`, parsed at most once.
    pub fn retrieve_catalog(&self, hash: ContentHash) -> RepoResult<Arc<Catalog>> {
        if let Some(catalog) = self.opened.read().expect("catalog memo lock poisoned").get(&hash) {
            return Ok(Arc::clone(catalog));
        }

        let bytes = self.retrieve_verified(hash, ObjectSuffix::Catalog)?;
        let catalog = Arc::new(Catalog::parse(hash, &bytes)?);
        debug!(hash = %hash.short_hex(), prefix = catalog.root_prefix(), "opened catalog");

        let mut opened = self.opened.write().expect("catalog memo lock poisoned");
        Ok(Arc::clone(opened.entry(hash).or_insert(catalog)))
    }

    pub fn retrieve_nested(&self, reference: &NestedCatalogRef) -> RepoResult<Arc<Catalog>> {
        self.retrieve_catalog(reference.hash)
    }

    /// The catalog that owns `path`.
    ///
    /// Starting at the root, descends into the nested catalog whose
    /// mountpoint is the longest prefix of `path` until none covers it.
    pub fn retrieve_catalog_for_path(&self, path: &str) -> RepoResult<Arc<Catalog>> {
        let path = normalize_path(path);
        let mut catalog = self.retrieve_root_catalog()?;
        loop {
            let next = catalog.find_nested_for_path(path).map(|r| r.hash);
            match next {
                Some(hash) => catalog = self.retrieve_catalog(hash)?,
                None => return Ok(catalog),
            }
        }
    }

    /// The directory entry at `path`, from the catalog that owns it.
    pub fn lookup(&self, path: &str) -> RepoResult<Option<DirectoryEntry>> {
        let catalog = self.retrieve_catalog_for_path(path)?;
        Ok(catalog.find_entry(normalize_path(path)).cloned())
    }

    /// Drop `catalog` from the memo. Returns whether it was present.
    pub fn close_catalog(&self, catalog: &Catalog) -> bool {
        let removed = self
            .opened
            .write()
            .expect("catalog memo lock poisoned")
            .remove(&catalog.hash())
            .is_some();
        if removed {
            debug!(hash = %catalog.hash().short_hex(), "closed catalog");
        }
        removed
    }

    /// Number of catalogs currently memoized.
    pub fn opened_catalogs(&self) -> usize {
        self.opened.read().expect("catalog memo lock poisoned").len()
    }

    // ---- Traversal ----

    /// Every directory entry in the namespace, across catalog boundaries.
    pub fn dirents(&self) -> RepoResult<DirentWalk<'_>> {
        Ok(DirentWalk::new(self, self.retrieve_root_catalog()?))
    }

    /// Every directory entry at or below the catalog `start`.
    pub fn dirents_from(&self, start: Arc<Catalog>) -> DirentWalk<'_> {
        DirentWalk::new(self, start)
    }

    /// Every catalog in the tree, parents first.
    pub fn catalogs(&self) -> RepoResult<CatalogTreeWalk<'_>> {
        Ok(CatalogTreeWalk::new(self, self.retrieve_root_catalog()?))
    }

    /// Every catalog at or below `start`, parents first.
    pub fn catalogs_from(&self, start: Arc<Catalog>) -> CatalogTreeWalk<'_> {
        CatalogTreeWalk::new(self, start)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("endpoint", &self.endpoint)
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("opened_catalogs", &self.opened_catalogs())
            .finish()
    }
}

/// Open `source` and, when the configuration names a public key, verify it.
pub fn open_repository(source: &str, config: &RepositoryConfig) -> RepoResult<Repository> {
    let key = config.load_public_key()?;
    let repo = Repository::open(source, config)?;
    if let Some(key) = key {
        repo.verify(&key)?;
    }
    Ok(repo)
}

fn locate_local(source: &str, local_root: &Path) -> PathBuf {
    let direct = PathBuf::from(source);
    if direct.is_dir() {
        direct
    } else {
        local_root.join(source)
    }
}

/// Paths are absolute and never end in `/`; the namespace root is `""`.
fn normalize_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

fn read_marker(fetcher: &Fetcher, name: &str) -> RepoResult<Option<DateTime<Utc>>> {
    match fetcher.retrieve_raw(name) {
        Ok(reader) => {
            let bytes = reader.into_bytes()?;
            let text = String::from_utf8_lossy(&bytes);
            let first = text.lines().next().unwrap_or_default();
            let ts = timestamp::parse_marker(first).map_err(FormatError::from)?;
            Ok(Some(ts))
        }
        Err(e) if e.is_not_found() => {
            debug!(name, "marker absent");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
