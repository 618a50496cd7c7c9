//! Signed repositories on disk, for tests.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use stratum_cache::EphemeralCache;
use stratum_catalog::{
    CatalogDocument, Certificate, DirectoryEntry, History, Manifest, ManifestFields,
    NestedCatalogRef, Whitelist, WhitelistFields,
};
use stratum_crypto::{SigningKey, VerifyingKey};
use stratum_fetch::{Codec, FetchResult, Fetcher, LocalOrigin, Origin};
use stratum_types::{names, ContentHash, ObjectSuffix};
use tempfile::TempDir;

use crate::repository::Repository;

/// Which trust-chain links to break when publishing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Breakage {
    /// Whitelist signed by a key other than the owner's.
    pub foreign_whitelist_key: bool,
    /// Whitelist expired yesterday.
    pub expired: bool,
    /// Whitelist lists some other certificate.
    pub untrusted_certificate: bool,
    /// Manifest signed by a key other than the certificate's.
    pub forged_manifest: bool,
}

/// A repository directory being assembled.
pub(crate) struct Fixture {
    _tmp: Option<TempDir>,
    root: PathBuf,
    name: String,
    owner: SigningKey,
    publisher: SigningKey,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        Self {
            _tmp: Some(tmp),
            ..Self::in_dir(root, name)
        }
    }

    /// Build in `root`, which outlives the fixture.
    pub fn in_dir(root: PathBuf, name: &str) -> Self {
        std::fs::create_dir_all(&root).unwrap();
        Self {
            _tmp: None,
            root,
            name: name.to_string(),
            owner: SigningKey::generate(),
            publisher: SigningKey::generate(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_str(&self) -> &str {
        self.root.to_str().unwrap()
    }

    /// The repository owner's public key.
    pub fn owner_key(&self) -> VerifyingKey {
        self.owner.verifying_key()
    }

    pub fn certificate(&self) -> Certificate {
        Certificate::new(format!("CN={}", self.name), self.publisher.verifying_key())
    }

    /// Compress and store a content object; returns its hash.
    pub fn put_object(&self, data: &[u8], suffix: ObjectSuffix) -> ContentHash {
        let hash = ContentHash::of(data);
        self.put_at(hash, data, suffix);
        hash
    }

    /// Compress and store `data` under `hash`, whatever it hashes to.
    pub fn put_at(&self, hash: ContentHash, data: &[u8], suffix: ObjectSuffix) {
        let path = self.root.join(hash.object_path(suffix));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, Codec::Zlib.compress(data).unwrap()).unwrap();
    }

    pub fn put_catalog(&self, doc: &CatalogDocument) -> ContentHash {
        self.put_object(&doc.encode().unwrap(), ObjectSuffix::Catalog)
    }

    /// Store an uncompressed object at the origin root.
    pub fn put_raw(&self, name: &str, data: &[u8]) {
        std::fs::write(self.root.join(name), data).unwrap();
    }

    /// Publish certificate, whitelist and manifest for `root_catalog`.
    pub fn publish(&self, root_catalog: ContentHash) {
        self.publish_with(root_catalog, Breakage::default(), None);
    }

    pub fn publish_with(
        &self,
        root_catalog: ContentHash,
        breakage: Breakage,
        history: Option<&History>,
    ) {
        let certificate = self.certificate();
        let cert_hash = self.put_object(&certificate.encode().unwrap(), ObjectSuffix::Certificate);
        let history = history.map(|h| self.put_object(&h.encode().unwrap(), ObjectSuffix::History));

        let now = Utc::now();
        let (created, expires) = if breakage.expired {
            (now - Duration::days(31), now - Duration::days(1))
        } else {
            (now - Duration::days(1), now + Duration::days(29))
        };
        let trusted = if breakage.untrusted_certificate {
            Certificate::new("other", SigningKey::generate().verifying_key())
        } else {
            certificate
        };
        let whitelist_key = if breakage.foreign_whitelist_key {
            SigningKey::generate()
        } else {
            SigningKey::from_bytes(*self.owner.as_bytes())
        };
        self.put_raw(
            names::WHITELIST,
            &Whitelist::encode_signed(
                &WhitelistFields {
                    repository_name: self.name.clone(),
                    created,
                    expires,
                    fingerprints: vec![trusted.fingerprint()],
                },
                &whitelist_key,
            ),
        );

        let manifest_key = if breakage.forged_manifest {
            SigningKey::generate()
        } else {
            SigningKey::from_bytes(*self.publisher.as_bytes())
        };
        self.put_raw(
            names::MANIFEST,
            &Manifest::encode_signed(
                &ManifestFields {
                    repository_name: self.name.clone(),
                    root_catalog,
                    certificate: cert_hash,
                    history,
                    revision: Some(1),
                    published: Some(now),
                },
                &manifest_key,
            ),
        );
    }
}

/// Hashes of a two-catalog tree.
pub(crate) struct Tree {
    pub root: ContentHash,
    pub child: ContentHash,
}

/// Root catalog with one nested catalog mounted at `/a/b`.
pub(crate) fn mounted_at_a_b(fx: &Fixture) -> Tree {
    let child = fx.put_catalog(&CatalogDocument {
        root_prefix: "/a/b".into(),
        revision: 3,
        entries: vec![
            DirectoryEntry::directory("/a/b").as_nested_root(),
            DirectoryEntry::file("/a/b/x", ContentHash::of(b"x"), 1),
            DirectoryEntry::symlink("/a/b/y", "x"),
        ],
        nested: vec![],
    });
    let root = fx.put_catalog(&CatalogDocument {
        root_prefix: String::new(),
        revision: 3,
        entries: vec![
            DirectoryEntry::directory("/a"),
            DirectoryEntry::directory("/a/b").as_mountpoint(),
            DirectoryEntry::file("/readme", ContentHash::of(b"readme"), 6),
            DirectoryEntry::directory("/z"),
        ],
        nested: vec![NestedCatalogRef::new("/a/b", child)],
    });
    Tree { root, child }
}

/// Root catalog with one nested catalog mounted at `/a` owning `/a/b/c`.
pub(crate) fn mounted_at_a(fx: &Fixture) -> Tree {
    let child = fx.put_catalog(&CatalogDocument {
        root_prefix: "/a".into(),
        revision: 1,
        entries: vec![
            DirectoryEntry::directory("/a").as_nested_root(),
            DirectoryEntry::directory("/a/b"),
            DirectoryEntry::file("/a/b/c", ContentHash::of(b"c"), 1),
        ],
        nested: vec![],
    });
    let root = fx.put_catalog(&CatalogDocument {
        root_prefix: String::new(),
        revision: 1,
        entries: vec![
            DirectoryEntry::directory("/a").as_mountpoint(),
            DirectoryEntry::directory("/ab"),
        ],
        nested: vec![NestedCatalogRef::new("/a", child)],
    });
    Tree { root, child }
}

/// A root catalog with a single file.
pub(crate) fn single_catalog(fx: &Fixture) -> ContentHash {
    fx.put_catalog(&CatalogDocument {
        root_prefix: String::new(),
        revision: 1,
        entries: vec![DirectoryEntry::file("/readme", ContentHash::of(b"readme"), 6)],
        nested: vec![],
    })
}

/// Local origin that records every object name requested.
struct RecordingOrigin {
    inner: LocalOrigin,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Origin for RecordingOrigin {
    fn open(&self, name: &str) -> FetchResult<Box<dyn Read + Send>> {
        self.requests.lock().unwrap().push(name.to_string());
        self.inner.open(name)
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}

/// Open `fx` without a durable cache, recording origin requests.
pub(crate) fn recording_repository(fx: &Fixture) -> (Repository, Arc<Mutex<Vec<String>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let origin = RecordingOrigin {
        inner: LocalOrigin::new(fx.root()),
        requests: Arc::clone(&requests),
    };
    let fetcher = Fetcher::new(Box::new(origin), Box::new(EphemeralCache::new()));
    (Repository::from_fetcher(fetcher).unwrap(), requests)
}
