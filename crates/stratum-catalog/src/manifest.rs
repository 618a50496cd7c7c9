use chrono::{DateTime, Utc};
use stratum_crypto::{Signature, SigningKey};
use stratum_types::ContentHash;

use crate::certificate::Certificate;
use crate::error::{FormatError, FormatResult};
use crate::signed;

const KIND: &str = "manifest";

/// The fields a publisher writes into a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestFields {
    pub repository_name: String,
    pub root_catalog: ContentHash,
    pub certificate: ContentHash,
    pub history: Option<ContentHash>,
    pub revision: Option<u64>,
    pub published: Option<DateTime<Utc>>,
}

/// Signed root descriptor of a repository.
///
/// One field per line, keyed by its first character:
///
/// | Key | Field |
/// |-----|-------|
/// | `C` | root catalog hash |
/// | `X` | certificate hash |
/// | `H` | history database hash (optional) |
/// | `N` | repository name |
/// | `S` | revision (optional) |
/// | `T` | publish time, unix seconds (optional) |
///
/// Unknown keys are ignored so newer publishers stay readable.
#[derive(Clone, Debug)]
pub struct Manifest {
    fields: ManifestFields,
    body: String,
    signature: Signature,
}

impl Manifest {
    /// Decode a manifest from its raw bytes.
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        let (body, signature) = signed::split(data, KIND)?;

        let mut name = None;
        let mut root = None;
        let mut certificate = None;
        let mut history = None;
        let mut revision = None;
        let mut published = None;

        for line in body.lines() {
            let mut chars = line.chars();
            let Some(key) = chars.next() else { continue };
            let value = chars.as_str().trim();
            match key {
                'C' => root = Some(ContentHash::parse(value)?),
                'X' => certificate = Some(ContentHash::parse(value)?),
                'H' => history = Some(ContentHash::parse(value)?),
                'N' => name = Some(value.to_string()),
                'S' => {
                    revision = Some(value.parse::<u64>().map_err(|e| {
                        FormatError::malformed(KIND, format!("revision {value:?}: {e}"))
                    })?)
                }
                'T' => {
                    let secs = value.parse::<i64>().map_err(|e| {
                        FormatError::malformed(KIND, format!("timestamp {value:?}: {e}"))
                    })?;
                    published = Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                        FormatError::malformed(KIND, format!("timestamp {secs} out of range"))
                    })?);
                }
                _ => {}
            }
        }

        let missing = |field| FormatError::MissingField { kind: KIND, field };
        Ok(Self {
            fields: ManifestFields {
                repository_name: name.ok_or_else(|| missing("N"))?,
                root_catalog: root.ok_or_else(|| missing("C"))?,
                certificate: certificate.ok_or_else(|| missing("X"))?,
                history,
                revision,
                published,
            },
            body: body.to_string(),
            signature,
        })
    }

    /// Render and sign a manifest with the certificate's private key.
    pub fn encode_signed(fields: &ManifestFields, key: &SigningKey) -> Vec<u8> {
        let mut body = format!("C{}\nX{}\n", fields.root_catalog, fields.certificate);
        if let Some(history) = &fields.history {
            body.push_str(&format!("H{history}\n"));
        }
        body.push_str(&format!("N{}\n", fields.repository_name));
        if let Some(revision) = fields.revision {
            body.push_str(&format!("S{revision}\n"));
        }
        if let Some(published) = &fields.published {
            body.push_str(&format!("T{}\n", published.timestamp()));
        }
        signed::seal(body, key)
    }

    pub fn repository_name(&self) -> &str {
        &self.fields.repository_name
    }

    pub fn root_catalog(&self) -> ContentHash {
        self.fields.root_catalog
    }

    pub fn certificate(&self) -> ContentHash {
        self.fields.certificate
    }

    /// Hash of the history database, if the repository keeps one.
    pub fn history_database(&self) -> Option<ContentHash> {
        self.fields.history
    }

    pub fn revision(&self) -> Option<u64> {
        self.fields.revision
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.fields.published
    }

    pub fn fields(&self) -> &ManifestFields {
        &self.fields
    }

    /// Whether `certificate` signed this manifest.
    pub fn verify_signature(&self, certificate: &Certificate) -> bool {
        certificate.validates(self.body.as_bytes(), &self.signature)
    }
}
