//! Foundation types for Stratum, a read-only client for content-addressed,
//! catalog-partitioned repositories.
//!
//! Every other Stratum crate depends on `stratum-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] — Content address of a repository object (BLAKE3, hex rendered)
//! - [`ObjectSuffix`] — Kind marker appended to an object path
//! - [`object_path`] — The sharded `data/xx/yyyy…` path rule
//! - [`names`] — Well-known object names at the origin root
//! - [`timestamp`] — Parsing of marker and whitelist timestamps

pub mod error;
pub mod names;
pub mod object;
pub mod timestamp;

pub use error::TypeError;
pub use object::{object_path, shard_directories, ContentHash, ObjectSuffix, DATA_DIR, HASH_HEX_LEN};
