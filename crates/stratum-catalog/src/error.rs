use stratum_crypto::SignatureError;
use stratum_types::TypeError;

/// Errors decoding repository metadata.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The bytes do not follow the expected layout.
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },

    /// A mandatory field is absent.
    #[error("{kind} is missing field {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// An embedded hash or timestamp is invalid.
    #[error("invalid value: {0}")]
    Value(#[from] TypeError),

    /// Embedded key or signature material is invalid.
    #[error("invalid key material: {0}")]
    Key(#[from] SignatureError),

    /// JSON document could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormatError {
    pub(crate) fn malformed(kind: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Result alias for metadata decoding.
pub type FormatResult<T> = Result<T, FormatError>;
