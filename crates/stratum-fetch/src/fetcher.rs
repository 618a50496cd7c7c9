use std::io::{self, Read, Write};
use std::path::Path;

use stratum_cache::{CacheError, ObjectCache, ObjectReader};
use tracing::debug;

use crate::codec::Codec;
use crate::error::{FetchError, FetchResult};
use crate::origin::Origin;

/// How origin bytes are transformed on their way into the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// Run the bytes through the fetcher's codec.
    Decompress,
    /// Store the bytes as-is.
    Verbatim,
}

/// Retrieves named objects through a cache, filling it from an origin on miss.
pub struct Fetcher {
    origin: Box<dyn Origin>,
    cache: Box<dyn ObjectCache>,
    codec: Codec,
}

impl Fetcher {
    /// Pair an origin with a cache; content objects use the default codec.
    pub fn new(origin: Box<dyn Origin>, cache: Box<dyn ObjectCache>) -> Self {
        Self {
            origin,
            cache,
            codec: Codec::default(),
        }
    }

    /// Use a different codec for content objects.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Retrieve decompressed content for `name`.
    pub fn retrieve(&self, name: &str) -> FetchResult<ObjectReader> {
        self.retrieve_with(name, Transfer::Decompress)
    }

    /// Retrieve `name` stored verbatim (manifest, whitelist, markers).
    pub fn retrieve_raw(&self, name: &str) -> FetchResult<ObjectReader> {
        self.retrieve_with(name, Transfer::Verbatim)
    }

    /// Retrieve `name`, serving from the cache when present.
    ///
    /// On a miss the origin stream is written into a staged cache entry and
    /// committed only after the whole transfer succeeded; any failure drops
    /// the stage, leaving the cache untouched.
    pub fn retrieve_with(&self, name: &str, transfer: Transfer) -> FetchResult<ObjectReader> {
        if let Some(hit) = self.cache.get(name)? {
            return Ok(hit);
        }
        self.fill(name, transfer)
    }

    /// Fetch `name` verbatim from the origin even when cached, replacing
    /// the cached copy.
    pub fn refresh_raw(&self, name: &str) -> FetchResult<ObjectReader> {
        self.fill(name, Transfer::Verbatim)
    }

    fn fill(&self, name: &str, transfer: Transfer) -> FetchResult<ObjectReader> {
        let mut staged = self.cache.begin(name)?;
        let source = self.origin.open(name)?;
        let copied = self.transfer(name, source, &mut staged, transfer)?;

        let reader = self.cache.commit(staged)?;
        debug!(name, bytes = copied, ?transfer, origin = %self.origin.location(), "fetched object");
        Ok(reader)
    }

    /// Copy `source` into `sink`. Failures reading or decoding the origin
    /// stream are `NotFound`; failures writing the sink are cache errors.
    fn transfer<W: Write>(
        &self,
        name: &str,
        mut source: Box<dyn Read + Send>,
        sink: &mut W,
        transfer: Transfer,
    ) -> FetchResult<u64> {
        let mut sink = Sink::new(sink);
        let copied = match transfer {
            Transfer::Decompress => self.codec.decode(source, &mut sink),
            Transfer::Verbatim => io::copy(&mut source, &mut sink),
        };
        copied.map_err(|e| match sink.error.take() {
            Some(write_error) => FetchError::Cache(CacheError::Io(write_error)),
            None => FetchError::not_found(name, e),
        })
    }

    /// The origin this fetcher reads from.
    pub fn origin(&self) -> &dyn Origin {
        self.origin.as_ref()
    }

    /// Root of the durable cache, if one is in use.
    pub fn cache_root(&self) -> Option<&Path> {
        self.cache.root()
    }

    /// The codec applied to content objects.
    pub fn codec(&self) -> Codec {
        self.codec
    }
}

/// Remembers the first error raised by the wrapped writer.
struct Sink<'a, W> {
    inner: &'a mut W,
    error: Option<io::Error>,
}

impl<'a, W: Write> Sink<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self { inner, error: None }
    }

    fn record(&mut self, e: io::Error) -> io::Error {
        if e.kind() == io::ErrorKind::Interrupted {
            return e;
        }
        let forwarded = io::Error::new(e.kind(), e.to_string());
        self.error.get_or_insert(e);
        forwarded
    }
}

impl<W: Write> Write for Sink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.record(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.record(e))
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("origin", &self.origin.location())
            .field("cache_root", &self.cache.root())
            .field("codec", &self.codec)
            .finish()
    }
}
