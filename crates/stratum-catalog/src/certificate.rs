use serde::{Deserialize, Serialize};
use stratum_crypto::{Fingerprint, Signature, VerifyingKey};

use crate::error::FormatResult;

/// Publisher certificate: the key that signs manifests.
///
/// Stored as a content object with the `X` suffix. A whitelist names
/// certificates by [`Fingerprint`], never by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    subject: String,
    public_key: VerifyingKey,
    fingerprint: Fingerprint,
}

#[derive(Serialize, Deserialize)]
struct CertificateDocument {
    subject: String,
    public_key: String,
}

impl Certificate {
    pub fn new(subject: impl Into<String>, public_key: VerifyingKey) -> Self {
        let fingerprint = Fingerprint::of_key(&public_key);
        Self {
            subject: subject.into(),
            public_key,
            fingerprint,
        }
    }

    /// Decode a certificate from its decompressed content bytes.
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        let doc: CertificateDocument = serde_json::from_slice(data)?;
        let public_key = VerifyingKey::from_hex(&doc.public_key)?;
        Ok(Self::new(doc.subject, public_key))
    }

    /// Encode for publication (before compression).
    pub fn encode(&self) -> FormatResult<Vec<u8>> {
        let doc = CertificateDocument {
            subject: self.subject.clone(),
            public_key: self.public_key.to_hex(),
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Whether this certificate's key produced `signature` over `message`.
    pub fn validates(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key.verify(message, signature).is_ok()
    }
}
