//! Local object cache for Stratum.
//!
//! Fetched repository objects are kept under their relative object path
//! (`data/ab/cdef…C`, `.published`, …). Writers never expose partial content:
//! new content is written to a private staging file and revealed with a
//! single atomic rename.
//!
//! # Backends
//!
//! All backends implement the [`ObjectCache`] trait:
//!
//! - [`EphemeralCache`] — never hits; every object lives in an unlinked temp file
//! - [`DiskCache`] — durable, sharded directory shared safely between processes
//!
//! # Design Rules
//!
//! 1. Committed content is immutable; concurrent writers of one key write identical bytes.
//! 2. Write-then-reveal: stage privately, then rename into place.
//! 3. A staged object dropped without commit leaves nothing behind.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod disk;
pub mod ephemeral;
pub mod error;
pub mod handle;
pub mod traits;

pub use disk::DiskCache;
pub use ephemeral::EphemeralCache;
pub use error::{CacheError, CacheResult};
pub use handle::{ObjectReader, StagedObject};
pub use traits::{validate_key, ObjectCache};
