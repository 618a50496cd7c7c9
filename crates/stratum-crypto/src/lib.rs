//! Cryptographic primitives for Stratum.
//!
//! Provides Ed25519 signing/verification, public key loading, and
//! domain-separated BLAKE3 fingerprints for publisher certificates.
//!
//! All crypto operations wrap `ed25519-dalek` and `blake3`.

pub mod hasher;
pub mod signer;

pub use hasher::{ContentHasher, Fingerprint};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
