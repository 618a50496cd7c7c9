use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Top-level directory holding every content-addressed object.
pub const DATA_DIR: &str = "data";

/// Length of a rendered [`ContentHash`].
pub const HASH_HEX_LEN: usize = 64;

/// Content address of a repository object.
///
/// A `ContentHash` is the BLAKE3 digest of an object's bytes as published.
/// Identical content always produces the same hash, so any object fetched by
/// its hash is immutable for the lifetime of the repository.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash raw bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Parse from the 64-character hex rendering.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Relative path of this object with the given kind suffix.
    pub fn object_path(&self, suffix: ObjectSuffix) -> String {
        object_path(&self.to_hex(), suffix.as_str())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Kind marker appended to an object's path.
///
/// Objects of different kinds share one hash space; the suffix keeps, for
/// example, a catalog and a plain file with colliding digests apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectSuffix {
    /// Regular file content.
    Plain,
    /// A namespace catalog.
    Catalog,
    /// The publisher certificate.
    Certificate,
    /// The tag history database.
    History,
    /// One chunk of a chunked file.
    Partial,
    /// Repository meta information.
    MetaInfo,
}

impl ObjectSuffix {
    /// The literal suffix string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Catalog => "C",
            Self::Certificate => "X",
            Self::History => "H",
            Self::Partial => "P",
            Self::MetaInfo => "M",
        }
    }

    /// Parse a literal suffix string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "" => Ok(Self::Plain),
            "C" => Ok(Self::Catalog),
            "X" => Ok(Self::Certificate),
            "H" => Ok(Self::History),
            "P" => Ok(Self::Partial),
            "M" => Ok(Self::MetaInfo),
            other => Err(TypeError::UnknownSuffix(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative path of a content object: `data/` + `hash[0:2]` + `/` +
/// `hash[2:]` + `suffix`.
///
/// The rule is applied to the rendered hash verbatim, so callers holding a
/// hash string from an external source get exactly the path the origin uses.
/// Hashes shorter than two characters have no shard and yield `data/<hash><suffix>`.
pub fn object_path(hash: &str, suffix: &str) -> String {
    match (hash.get(..2), hash.get(2..)) {
        (Some(shard), Some(rest)) => format!("{DATA_DIR}/{shard}/{rest}{suffix}"),
        _ => format!("{DATA_DIR}/{hash}{suffix}"),
    }
}

/// The 256 two-hex-digit shard directory names, `00` through `ff`.
pub fn shard_directories() -> impl Iterator<Item = String> {
    (0u16..=0xff).map(|i| format!("{i:02x}"))
}
