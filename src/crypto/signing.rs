//! RSA PKCS#1 v1.5 / SHA-256 signatures over the canonical document form
//!
//! - `sign` canonicalizes the document with its signature cleared, signs the
//!   bytes and returns a new document carrying the Base64 signature record.
//! - `verify` recomputes the same canonical bytes and checks them against the
//!   record. An unsigned document verifies as `false`, not as an error.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use super::keys::{parse_private_key, parse_public_key};
use crate::document::{canonicalize, MedidDocument, MedidSignature};
use crate::error::{MedidError, MedidResult};

/// Signature algorithm identifier
pub const SIGNATURE_ALGORITHM: &str = "RSA-PKCS1v15-SHA256";

/// Sign `document` with a DER-encoded RSA private key.
///
/// The input is not modified; any previous signature on it is discarded
/// before canonicalization.
pub fn sign(
    document: &MedidDocument,
    private_key: &[u8],
    signer_name: &str,
    public_key_hint: Option<&str>,
) -> MedidResult<MedidDocument> {
    if signer_name.trim().is_empty() {
        return Err(MedidError::InvalidArgument("signer name is empty".to_string()));
    }

    let key = parse_private_key(private_key)?;
    let unsigned = document.without_signature();
    let canonical = canonicalize(&unsigned)?;

    let signing_key = SigningKey::<Sha256>::new(key);
    let signature = signing_key
        .try_sign(&canonical)
        .map_err(|e| MedidError::InvalidKey(format!("RSA signing failed: {}", e)))?;

    tracing::debug!(
        signer = signer_name,
        canonical_len = canonical.len(),
        "signed document"
    );

    Ok(unsigned.with_signature(MedidSignature {
        value: BASE64.encode(signature.to_bytes()),
        signer: Some(signer_name.to_string()),
        public_key_hint: public_key_hint.map(str::to_string),
    }))
}

/// Verify the signature on `document` against a DER-encoded public key.
///
/// Returns `Ok(false)` when the document is unsigned, the public key cannot
/// be used, or the signature does not match. Fails with
/// [`MedidError::InvalidEncoding`] only when the signature value is not
/// Base64 at all.
pub fn verify(document: &MedidDocument, public_key: &[u8]) -> MedidResult<bool> {
    let Some(record) = document.signature.as_ref().filter(|s| !s.value.is_empty()) else {
        return Ok(false);
    };

    let raw = BASE64.decode(record.value.trim())?;

    let key = match parse_public_key(public_key) {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!(error = %e, "public key unusable for verification");
            return Ok(false);
        }
    };

    let signature = match Signature::try_from(raw.as_slice()) {
        Ok(signature) => signature,
        Err(_) => return Ok(false),
    };

    let canonical = canonicalize(document)?;
    let verifying_key = VerifyingKey::<Sha256>::new(key);
    Ok(verifying_key.verify(&canonical, &signature).is_ok())
}
