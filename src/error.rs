//! Error taxonomy shared by every medid component
//!
//! Cryptographic and I/O failures propagate through [`MedidError`]. Structural
//! document problems are reported as a list of [`ValidationError`]s rather than
//! as a single failure.

use std::io;

use thiserror::Error;

use crate::package::ValidationError;

/// Result type for medid operations
pub type MedidResult<T> = Result<T, MedidError>;

/// Errors from signing, key handling, hashing and packaging
#[derive(Debug, Error)]
pub enum MedidError {
    /// A required string was empty or a required value was missing
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Asymmetric key material could not be parsed or used
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Malformed Base64, hash string or binary blob
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Private-key blob failed to decrypt (padding check failed)
    #[error("wrong password or corrupt data")]
    WrongPasswordOrCorruptData,

    /// Archive is unreadable, lacks medid.json, or medid.json does not parse
    #[error("malformed package: {0}")]
    MalformedPackage(String),

    /// Document failed structural validation
    #[error("validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// RSA modulus size outside the supported range
    #[error("unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl From<base64::DecodeError> for MedidError {
    fn from(err: base64::DecodeError) -> Self {
        MedidError::InvalidEncoding(format!("base64: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_display_counts_errors() {
        let err = MedidError::ValidationFailed(vec![
            ValidationError::EmptyCollectionName,
            ValidationError::NoEntries,
        ]);
        assert_eq!(err.to_string(), "validation failed with 2 error(s)");
    }

    #[test]
    fn test_base64_error_maps_to_invalid_encoding() {
        let decode_err = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            "not base64!!",
        )
        .unwrap_err();
        let err: MedidError = decode_err.into();
        assert!(matches!(err, MedidError::InvalidEncoding(_)));
    }
}
