use chrono::{DateTime, Utc};
use stratum_crypto::{Fingerprint, Signature, SigningKey, VerifyingKey};
use stratum_types::timestamp;

use crate::certificate::Certificate;
use crate::error::{FormatError, FormatResult};
use crate::signed;

const KIND: &str = "whitelist";

/// The fields a repository owner writes into a whitelist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistFields {
    pub repository_name: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub fingerprints: Vec<Fingerprint>,
}

/// Signed, expiring list of certificate fingerprints trusted to sign
/// manifests.
///
/// ```text
/// 20240501080000
/// E20240531080000
/// Nsw.example.org
/// 3A:F0:…:9C   # release manager
/// --
/// <signature by the repository master key>
/// ```
#[derive(Clone, Debug)]
pub struct Whitelist {
    fields: WhitelistFields,
    body: String,
    signature: Signature,
}

impl Whitelist {
    /// Decode a whitelist from its raw bytes.
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        let (body, signature) = signed::split(data, KIND)?;
        let mut lines = body.lines();
        let mut header = |field| {
            lines
                .next()
                .map(str::trim)
                .ok_or(FormatError::MissingField { kind: KIND, field })
        };

        let created = timestamp::parse_compact(header("creation stamp")?)?;
        let expires = header("E")?
            .strip_prefix('E')
            .ok_or(FormatError::MissingField { kind: KIND, field: "E" })?;
        let expires = timestamp::parse_compact(expires)?;
        let repository_name = header("N")?
            .strip_prefix('N')
            .ok_or(FormatError::MissingField { kind: KIND, field: "N" })?
            .to_string();

        let mut fingerprints = Vec::new();
        for line in lines {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let fp = Fingerprint::parse(line)
                .ok_or_else(|| FormatError::malformed(KIND, format!("fingerprint {line:?}")))?;
            fingerprints.push(fp);
        }

        Ok(Self {
            fields: WhitelistFields {
                repository_name,
                created,
                expires,
                fingerprints,
            },
            body: body.to_string(),
            signature,
        })
    }

    /// Render and sign a whitelist with the repository master key.
    pub fn encode_signed(fields: &WhitelistFields, key: &SigningKey) -> Vec<u8> {
        let mut body = format!(
            "{}\nE{}\nN{}\n",
            timestamp::format_compact(&fields.created),
            timestamp::format_compact(&fields.expires),
            fields.repository_name
        );
        for fp in &fields.fingerprints {
            body.push_str(&fp.to_colon_hex());
            body.push('\n');
        }
        signed::seal(body, key)
    }

    pub fn repository_name(&self) -> &str {
        &self.fields.repository_name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.fields.created
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.fields.expires
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fields.fingerprints
    }

    /// Whether the master key signed this whitelist.
    pub fn verify_signature(&self, key: &VerifyingKey) -> bool {
        key.verify(self.body.as_bytes(), &self.signature).is_ok()
    }

    /// Whether the whitelist has expired as of `now`.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.fields.expires
    }

    /// Whether the whitelist has expired as of the system clock.
    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// Whether `certificate`'s fingerprint is trusted.
    pub fn contains(&self, certificate: &Certificate) -> bool {
        let fingerprint = certificate.fingerprint();
        self.fields.fingerprints.contains(&fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fields(trusted: &[&Certificate]) -> WhitelistFields {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        WhitelistFields {
            repository_name: "sw.example.org".into(),
            created,
            expires: created + Duration::days(30),
            fingerprints: trusted.iter().map(|c| c.fingerprint()).collect(),
        }
    }

    fn cert() -> Certificate {
        Certificate::new("publisher", SigningKey::generate().verifying_key())
    }

    #[test]
    fn parse_signed_whitelist() {
        let master = SigningKey::generate();
        let cert = cert();
        let data = Whitelist::encode_signed(&fields(&[&cert]), &master);
        let wl = Whitelist::parse(&data).unwrap();
        assert_eq!(wl.repository_name(), "sw.example.org");
        assert_eq!(wl.fingerprints(), &[cert.fingerprint()]);
        assert!(wl.verify_signature(&master.verifying_key()));
        assert!(wl.contains(&cert));
    }

    #[test]
    fn other_key_fails_signature() {
        let data = Whitelist::encode_signed(&fields(&[]), &SigningKey::generate());
        let wl = Whitelist::parse(&data).unwrap();
        assert!(!wl.verify_signature(&SigningKey::generate().verifying_key()));
    }

    #[test]
    fn expiry_boundary() {
        let data = Whitelist::encode_signed(&fields(&[]), &SigningKey::generate());
        let wl = Whitelist::parse(&data).unwrap();
        assert!(!wl.expired_at(wl.expires() - Duration::seconds(1)));
        assert!(wl.expired_at(wl.expires()));
        assert!(wl.expired_at(wl.expires() + Duration::days(1)));
    }

    #[test]
    fn untrusted_certificate() {
        let trusted = cert();
        let data = Whitelist::encode_signed(&fields(&[&trusted]), &SigningKey::generate());
        let wl = Whitelist::parse(&data).unwrap();
        assert!(!wl.contains(&cert()));
    }

    #[test]
    fn fingerprint_lines_accept_comments_and_plain_hex() {
        let master = SigningKey::generate();
        let a = cert();
        let b = cert();
        let body = format!(
            "20240501080000\nE20240531080000\nNrepo\n{}   # release manager\n\n{}\n",
            a.fingerprint().to_colon_hex(),
            b.fingerprint().to_hex().to_uppercase()
        );
        let wl = Whitelist::parse(&signed::seal(body, &master)).unwrap();
        assert!(wl.contains(&a));
        assert!(wl.contains(&b));
    }

    #[test]
    fn missing_expiry() {
        let body = "20240501080000\nNrepo\n".to_string();
        let err = Whitelist::parse(&signed::seal(body, &SigningKey::generate())).unwrap_err();
        assert!(matches!(err, FormatError::MissingField { field: "E", .. }));
    }

    #[test]
    fn junk_fingerprint_line() {
        let body = "20240501080000\nE20240531080000\nNrepo\nnot a fingerprint\n".to_string();
        let err = Whitelist::parse(&signed::seal(body, &SigningKey::generate())).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));
    }
}
