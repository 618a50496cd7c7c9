use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::signer::VerifyingKey;

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag (e.g., `"stratum-certificate-v1"`) that is
/// prepended to every hash computation, so a certificate fingerprint can never
/// collide with the content address of an object holding the same bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for publisher certificate fingerprints.
    pub const CERTIFICATE: Self = Self {
        domain: "stratum-certificate-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Fingerprint identifying a publisher certificate by its public key.
///
/// Rendered as lowercase hex. Parsing also accepts the colon-separated,
/// upper-case form (`AB:CD:...`) commonly pasted into whitelists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of a verifying key.
    pub fn of_key(key: &VerifyingKey) -> Self {
        Self(ContentHasher::CERTIFICATE.digest(&key.as_bytes()))
    }

    /// Parse hex with optional `:` separators, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let compact: String = s.trim().chars().filter(|c| *c != ':').collect();
        let bytes = hex::decode(compact.to_ascii_lowercase()).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// The raw 32-byte fingerprint.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Upper-case colon-separated rendering.
    pub fn to_colon_hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom("invalid fingerprint"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SigningKey;
    use stratum_types::ContentHash;

    #[test]
    fn digest_is_deterministic() {
        let a = ContentHasher::CERTIFICATE.digest(b"key");
        let b = ContentHasher::CERTIFICATE.digest(b"key");
        assert_eq!(a, b);
    }

    #[test]
    fn domain_separates_from_content_hash() {
        let domain = ContentHasher::CERTIFICATE.digest(b"same bytes");
        let content = ContentHash::of(b"same bytes");
        assert_ne!(&domain, content.as_bytes());
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("my-custom-domain-v1");
        assert_eq!(hasher.domain(), "my-custom-domain-v1");
        assert_ne!(
            hasher.digest(b"data"),
            ContentHasher::CERTIFICATE.digest(b"data")
        );
    }

    #[test]
    fn fingerprint_differs_per_key() {
        let a = Fingerprint::of_key(&SigningKey::generate().verifying_key());
        let b = Fingerprint::of_key(&SigningKey::generate().verifying_key());
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_parses_both_renderings() {
        let fp = Fingerprint::of_key(&SigningKey::generate().verifying_key());
        assert_eq!(Fingerprint::parse(&fp.to_hex()), Some(fp));
        assert_eq!(Fingerprint::parse(&fp.to_colon_hex()), Some(fp));
    }

    #[test]
    fn fingerprint_rejects_garbage() {
        assert_eq!(Fingerprint::parse("not a fingerprint"), None);
        assert_eq!(Fingerprint::parse("AB:CD"), None);
    }
}
