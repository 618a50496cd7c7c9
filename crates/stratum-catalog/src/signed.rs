//! Line-oriented documents followed by a detached signature.
//!
//! ```text
//! <body lines>
//! --
//! <hex ed25519 signature over the body bytes>
//! ```

use stratum_crypto::{Signature, SigningKey};

use crate::error::{FormatError, FormatResult};

const SEPARATOR: &str = "--";

/// Split a signed document into its body (every byte before the separator
/// line) and the signature that follows.
pub(crate) fn split<'a>(data: &'a [u8], kind: &'static str) -> FormatResult<(&'a str, Signature)> {
    let text = std::str::from_utf8(data).map_err(|e| FormatError::malformed(kind, e))?;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == SEPARATOR {
            let body = &text[..offset];
            let encoded = text[offset + line.len()..]
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .ok_or_else(|| FormatError::malformed(kind, "empty signature"))?;
            let signature = Signature::from_hex(encoded)
                .map_err(|e| FormatError::malformed(kind, format!("signature: {e}")))?;
            return Ok((body, signature));
        }
        offset += line.len();
    }
    Err(FormatError::malformed(kind, "missing signature separator"))
}

/// Append the separator and a signature over `body`.
pub(crate) fn seal(body: String, key: &SigningKey) -> Vec<u8> {
    let signature = key.sign(body.as_bytes());
    let mut out = body.into_bytes();
    out.extend_from_slice(SEPARATOR.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(signature.to_hex().as_bytes());
    out.push(b'\n');
    out
}
