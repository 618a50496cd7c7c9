//! Object fetcher for Stratum.
//!
//! A [`Fetcher`] pairs one [`Origin`] (a local repository directory or an HTTP
//! endpoint) with one [`ObjectCache`](stratum_cache::ObjectCache). Requests are
//! served from the cache when possible; misses are streamed from the origin,
//! decompressed when asked, staged, committed, and handed back.

pub mod codec;
pub mod error;
pub mod fetcher;
pub mod origin;

pub use codec::Codec;
pub use error::{FetchError, FetchResult};
pub use fetcher::{Fetcher, Transfer};
pub use origin::{LocalOrigin, Origin, RemoteOrigin, USER_AGENT};
