use serde::{Deserialize, Serialize};
use stratum_types::ContentHash;

use crate::error::{FormatError, FormatResult};

const KIND: &str = "catalog";

// ---------------------------------------------------------------------------
// EntryKind
// ---------------------------------------------------------------------------

/// File type of a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Directory (0o040000).
    Directory,
}

impl EntryKind {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

// ---------------------------------------------------------------------------
// DirectoryEntry
// ---------------------------------------------------------------------------

/// One namespace entry, addressed by its full path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Absolute path inside the repository, e.g. `/sw/bin/tool`.
    pub path: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    /// Modification time, unix seconds.
    #[serde(default)]
    pub mtime: i64,
    /// Content address for regular files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<String>,
    /// Set in the parent catalog where a child catalog takes over.
    #[serde(default)]
    pub nested_mountpoint: bool,
    /// Set on the same directory as seen from inside the child catalog.
    #[serde(default)]
    pub nested_root: bool,
}

impl DirectoryEntry {
    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Directory)
    }

    pub fn file(path: impl Into<String>, content_hash: ContentHash, size: u64) -> Self {
        Self {
            content_hash: Some(content_hash),
            size,
            ..Self::new(path, EntryKind::Regular)
        }
    }

    pub fn symlink(path: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            size: target.len() as u64,
            symlink_target: Some(target),
            ..Self::new(path, EntryKind::Symlink)
        }
    }

    fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            size: 0,
            mtime: 0,
            content_hash: None,
            symlink_target: None,
            nested_mountpoint: false,
            nested_root: false,
        }
    }

    /// Flag this entry as a nested catalog mountpoint.
    pub fn as_mountpoint(mut self) -> Self {
        self.nested_mountpoint = true;
        self
    }

    /// Flag this entry as the root directory of a nested catalog.
    pub fn as_nested_root(mut self) -> Self {
        self.nested_root = true;
        self
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn mode(&self) -> u32 {
        self.kind.mode_bits()
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_nested_mountpoint(&self) -> bool {
        self.nested_mountpoint
    }
}

// ---------------------------------------------------------------------------
// NestedCatalogRef
// ---------------------------------------------------------------------------

/// A mountpoint where a child catalog owns the namespace below `mount_path`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NestedCatalogRef {
    pub mount_path: String,
    pub hash: ContentHash,
}

impl NestedCatalogRef {
    pub fn new(mount_path: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            mount_path: mount_path.into(),
            hash,
        }
    }

    /// Whether `path` is the mountpoint itself or lies below it.
    pub fn covers(&self, path: &str) -> bool {
        path_covers(&self.mount_path, path)
    }
}

fn path_covers(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Wire form of a catalog, before it is compressed and published under its
/// content hash with the `C` suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Mount path of this catalog; empty for the root catalog.
    #[serde(default)]
    pub root_prefix: String,
    #[serde(default)]
    pub revision: u64,
    pub entries: Vec<DirectoryEntry>,
    #[serde(default)]
    pub nested: Vec<NestedCatalogRef>,
}

impl CatalogDocument {
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// One namespace partition: directory entries sorted by path, plus the
/// child catalogs mounted directly below it.
///
/// Catalogs are immutable; a parsed catalog is valid for as long as its
/// hash is referenced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    hash: ContentHash,
    root_prefix: String,
    revision: u64,
    entries: Vec<DirectoryEntry>,
    nested: Vec<NestedCatalogRef>,
}

impl Catalog {
    /// Decode the catalog published under `hash`.
    pub fn parse(hash: ContentHash, data: &[u8]) -> FormatResult<Self> {
        let doc: CatalogDocument = serde_json::from_slice(data)?;
        Self::from_document(hash, doc)
    }

    pub fn from_document(hash: ContentHash, doc: CatalogDocument) -> FormatResult<Self> {
        let CatalogDocument {
            root_prefix,
            revision,
            mut entries,
            nested,
        } = doc;

        for entry in &entries {
            if !entry.path.starts_with('/') || !path_covers(&root_prefix, &entry.path) {
                return Err(FormatError::malformed(
                    KIND,
                    format!("entry {:?} outside {:?}", entry.path, root_prefix),
                ));
            }
        }
        for reference in &nested {
            if reference.mount_path == root_prefix
                || !reference.mount_path.starts_with('/')
                || !path_covers(&root_prefix, &reference.mount_path)
            {
                return Err(FormatError::malformed(
                    KIND,
                    format!("nested mountpoint {:?} outside {:?}", reference.mount_path, root_prefix),
                ));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self {
            hash,
            root_prefix,
            revision,
            entries,
            nested,
        })
    }

    /// Content address this catalog was published under.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether this is the root of the namespace.
    pub fn is_root(&self) -> bool {
        self.root_prefix.is_empty()
    }

    /// Cursor over the entries, sorted by path.
    pub fn entries(&self) -> std::slice::Iter<'_, DirectoryEntry> {
        self.entries.iter()
    }

    /// The entry at `index` in path order.
    pub fn entry_at(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    /// The child catalogs mounted directly below this one.
    pub fn list_nested(&self) -> &[NestedCatalogRef] {
        &self.nested
    }

    /// The nested reference with the longest mount path covering `path`.
    ///
    /// A mountpoint equal to `path` covers it.
    pub fn find_nested_for_path(&self, path: &str) -> Option<&NestedCatalogRef> {
        self.nested
            .iter()
            .filter(|r| r.covers(path))
            .max_by_key(|r| r.mount_path.len())
    }

    /// The nested reference mounted exactly at `path`.
    pub fn find_nested_at(&self, path: &str) -> Option<&NestedCatalogRef> {
        self.nested.iter().find(|r| r.mount_path == path)
    }

    /// Look up an entry by full path.
    pub fn find_entry(&self, path: &str) -> Option<&DirectoryEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
