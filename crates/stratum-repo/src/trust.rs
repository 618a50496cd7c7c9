//! The repository trust chain.
//!
//! A repository is authentic when, in this order:
//!
//! 1. the whitelist is signed by the owner's public key,
//! 2. the whitelist has not expired,
//! 3. the whitelist lists the certificate's fingerprint,
//! 4. the certificate signed the manifest.
//!
//! The first failing step is reported.

use chrono::{DateTime, Utc};
use stratum_catalog::{Certificate, Manifest, Whitelist};
use stratum_crypto::VerifyingKey;

use crate::error::VerificationFailure;

/// Check the trust chain as of `now`.
pub fn verify_chain(
    whitelist: &Whitelist,
    certificate: &Certificate,
    manifest: &Manifest,
    public_key: &VerifyingKey,
    now: DateTime<Utc>,
) -> Result<(), VerificationFailure> {
    if !whitelist.verify_signature(public_key) {
        return Err(VerificationFailure::PublicKeyMismatch);
    }
    if whitelist.expired_at(now) {
        return Err(VerificationFailure::WhitelistExpired {
            expires: whitelist.expires(),
        });
    }
    if !whitelist.contains(certificate) {
        return Err(VerificationFailure::CertificateNotWhitelisted {
            fingerprint: certificate.fingerprint(),
        });
    }
    if !manifest.verify_signature(certificate) {
        return Err(VerificationFailure::ManifestSignatureMismatch);
    }
    Ok(())
}
