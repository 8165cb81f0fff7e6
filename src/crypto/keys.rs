//! RSA key pair generation and key parsing
//!
//! Private keys are exported as PKCS#1 `RSAPrivateKey` DER and public keys as
//! SubjectPublicKeyInfo DER. Parsing accepts PKCS#1 or PKCS#8 for private
//! keys and SPKI or PKCS#1 for public keys.

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{MedidError, MedidResult};

/// Key size used when the caller does not choose one
pub const DEFAULT_KEY_SIZE_BITS: usize = 2048;

/// Smallest accepted modulus
pub const MIN_KEY_SIZE_BITS: usize = 1024;

/// Largest accepted modulus (the public key parser rejects anything larger)
pub const MAX_KEY_SIZE_BITS: usize = 4096;

/// A freshly generated RSA key pair in its binary encodings
#[derive(Clone)]
pub struct KeyPair {
    /// PKCS#1 DER private key
    pub private_key: Zeroizing<Vec<u8>>,

    /// SubjectPublicKeyInfo DER public key
    pub public_key: Vec<u8>,
}

impl KeyPair {
    /// Fingerprint of the public half
    pub fn fingerprint(&self) -> String {
        key_fingerprint(&self.public_key)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key_fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Check a modulus size against the supported range
pub fn check_key_size(bits: usize) -> MedidResult<()> {
    if !(MIN_KEY_SIZE_BITS..=MAX_KEY_SIZE_BITS).contains(&bits) || bits % 8 != 0 {
        return Err(MedidError::UnsupportedKeySize(bits));
    }
    Ok(())
}

/// Generate an independent RSA key pair
pub fn generate_keypair(bits: usize) -> MedidResult<KeyPair> {
    check_key_size(bits)?;

    let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|_| MedidError::UnsupportedKeySize(bits))?;
    let public = RsaPublicKey::from(&private);

    let private_der = private
        .to_pkcs1_der()
        .map_err(|e| MedidError::InvalidKey(e.to_string()))?;
    let public_der = public
        .to_public_key_der()
        .map_err(|e| MedidError::InvalidKey(e.to_string()))?;

    tracing::debug!(bits, "generated RSA key pair");

    Ok(KeyPair {
        private_key: Zeroizing::new(private_der.as_bytes().to_vec()),
        public_key: public_der.as_bytes().to_vec(),
    })
}

/// Parse a DER private key (PKCS#1 or PKCS#8)
pub fn parse_private_key(der: &[u8]) -> MedidResult<RsaPrivateKey> {
    if der.is_empty() {
        return Err(MedidError::InvalidKey("private key is empty".to_string()));
    }
    RsaPrivateKey::from_pkcs1_der(der)
        .or_else(|_| RsaPrivateKey::from_pkcs8_der(der))
        .map_err(|e| MedidError::InvalidKey(format!("unreadable RSA private key: {}", e)))
}

/// Parse a DER public key (SubjectPublicKeyInfo or PKCS#1)
pub fn parse_public_key(der: &[u8]) -> MedidResult<RsaPublicKey> {
    if der.is_empty() {
        return Err(MedidError::InvalidKey("public key is empty".to_string()));
    }
    RsaPublicKey::from_public_key_der(der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
        .map_err(|e| MedidError::InvalidKey(format!("unreadable RSA public key: {}", e)))
}

/// SHA-256 fingerprint of public key bytes (lowercase hex)
pub fn key_fingerprint(public_key: &[u8]) -> String {
    hex::encode(Sha256::digest(public_key))
}
