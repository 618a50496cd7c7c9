//! Well-known object names fetched raw from the root of an origin.
//!
//! These are never content-addressed and never compressed at the origin.
//! A durable cache purges them at startup because they describe one
//! endpoint at one moment.

/// The signed repository manifest.
pub const MANIFEST: &str = ".published";

/// Marker written by a replica after its last completed replication.
pub const LAST_REPLICATION: &str = ".last_snapshot";

/// Marker present while a replica is replicating.
pub const REPLICATING: &str = ".is_snapshotting";

/// The signed certificate whitelist.
pub const WHITELIST: &str = ".whitelist";

/// All endpoint-specific metadata names.
pub const METADATA: [&str; 4] = [MANIFEST, LAST_REPLICATION, REPLICATING, WHITELIST];
