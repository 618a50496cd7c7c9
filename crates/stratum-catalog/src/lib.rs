//! Metadata formats for Stratum repositories.
//!
//! Everything a client parses after fetching it lives here:
//!
//! - [`Manifest`] — the signed root descriptor (`.published`)
//! - [`Whitelist`] — the signed, expiring set of trusted certificate fingerprints
//! - [`Certificate`] — the publisher's public key
//! - [`Catalog`] — one namespace partition with its nested catalog references
//! - [`History`] — named tags pointing at past root catalogs
//!
//! Each format also has an encoder so mirrors and tests can produce objects
//! a client will accept.

pub mod catalog;
pub mod certificate;
pub mod error;
pub mod history;
pub mod manifest;
mod signed;
pub mod whitelist;

pub use catalog::{Catalog, CatalogDocument, DirectoryEntry, EntryKind, NestedCatalogRef};
pub use certificate::Certificate;
pub use error::{FormatError, FormatResult};
pub use history::{History, Tag};
pub use manifest::{Manifest, ManifestFields};
pub use whitelist::{Whitelist, WhitelistFields};
