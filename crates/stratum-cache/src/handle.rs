use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Read handle to committed object content.
///
/// Always positioned at the start of the content when handed out by a cache.
#[derive(Debug)]
pub struct ObjectReader {
    file: File,
    path: Option<PathBuf>,
}

impl ObjectReader {
    /// Wrap an open file, rewinding it to the start.
    pub fn new(mut file: File, path: Option<PathBuf>) -> io::Result<Self> {
        file.seek(SeekFrom::Start(0))?;
        Ok(Self { file, path })
    }

    /// Location of the committed content, if it has one.
    ///
    /// Ephemeral content is unlinked and has no path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Returns `true` if the content is empty.
    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read the remaining content into memory.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for ObjectReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// Private, not-yet-visible destination for new content under a key.
///
/// The only ways out are [`ObjectCache::commit`](crate::ObjectCache::commit),
/// which reveals the content, or [`StagedObject::abandon`] / drop, which
/// deletes the staging file.
#[derive(Debug)]
pub struct StagedObject {
    key: String,
    file: NamedTempFile,
    written: u64,
}

impl StagedObject {
    pub(crate) fn new(key: &str, file: NamedTempFile) -> Self {
        Self {
            key: key.to_string(),
            file,
            written: 0,
        }
    }

    /// The key this content will be committed under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Path of the staging file.
    pub fn staging_path(&self) -> &Path {
        self.file.path()
    }

    /// Discard the staged content, reporting any error removing it.
    pub fn abandon(self) -> io::Result<()> {
        self.file.close()
    }

    pub(crate) fn into_parts(self) -> (String, NamedTempFile) {
        (self.key, self.file)
    }
}

impl Write for StagedObject {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
