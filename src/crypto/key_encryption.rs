//! Password protection for private keys at rest
//!
//! Blob layout (no magic, no version tag):
//!
//! ```text
//! salt (16 bytes) || iv (16 bytes) || AES-256-CBC/PKCS#7 ciphertext
//! ```
//!
//! The AES key is PBKDF2-HMAC-SHA256(password, salt, 100 000 iterations, 32 bytes).

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rsa::RsaPrivateKey;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::parse_private_key;
use crate::error::{MedidError, MedidResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// CBC initialization vector length in bytes
pub const IV_LEN: usize = 16;

/// Derived AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const BLOCK_LEN: usize = 16;

fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut *key);
    key
}

/// Encrypt private key bytes under `password` with a fresh random salt and IV
pub fn encrypt(private_key: &[u8], password: &str) -> MedidResult<Vec<u8>> {
    if private_key.is_empty() {
        return Err(MedidError::InvalidArgument("private key is empty".to_string()));
    }
    if password.is_empty() {
        return Err(MedidError::InvalidArgument("password is empty".to_string()));
    }

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    encrypt_with(private_key, password, &salt, &iv)
}

fn encrypt_with(
    plaintext: &[u8],
    password: &str,
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
) -> MedidResult<Vec<u8>> {
    let key = derive_key(password, salt);
    let cipher = Aes256CbcEnc::new_from_slices(key.as_slice(), iv)
        .map_err(|e| MedidError::InvalidKey(format!("AES init: {}", e)))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(SALT_LEN + IV_LEN + ciphertext.len());
    blob.extend_from_slice(salt);
    blob.extend_from_slice(iv);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// A wrong password or a tampered blob surfaces as
/// [`MedidError::WrongPasswordOrCorruptData`] when the padding check fails.
pub fn decrypt(blob: &[u8], password: &str) -> MedidResult<Zeroizing<Vec<u8>>> {
    if blob.is_empty() {
        return Err(MedidError::InvalidArgument("encrypted key is empty".to_string()));
    }
    if password.is_empty() {
        return Err(MedidError::InvalidArgument("password is empty".to_string()));
    }
    if blob.len() < SALT_LEN + IV_LEN + BLOCK_LEN {
        return Err(MedidError::InvalidEncoding(format!(
            "encrypted key is {} bytes, expected at least {}",
            blob.len(),
            SALT_LEN + IV_LEN + BLOCK_LEN
        )));
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(MedidError::InvalidEncoding(
            "ciphertext is not a whole number of AES blocks".to_string(),
        ));
    }

    let key = derive_key(password, salt);
    let cipher = Aes256CbcDec::new_from_slices(key.as_slice(), iv)
        .map_err(|e| MedidError::InvalidKey(format!("AES init: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| MedidError::WrongPasswordOrCorruptData)
}

/// Decrypt and parse an RSA private key.
///
/// Roughly one wrong password in 256 still yields valid padding; the key
/// parse catches those, and they are reported the same way.
pub fn decrypt_private_key(blob: &[u8], password: &str) -> MedidResult<RsaPrivateKey> {
    let der = decrypt(blob, password)?;
    parse_private_key(&der).map_err(|_| MedidError::WrongPasswordOrCorruptData)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_support::shared_keypair;

    #[test]
    fn test_round_trip() {
        let key = shared_keypair();
        let blob = encrypt(&key.private_key, "correct horse").unwrap();
        let plain = decrypt(&blob, "correct horse").unwrap();
        assert_eq!(plain.as_slice(), key.private_key.as_slice());
    }

    #[test]
    fn test_blob_layout() {
        let plaintext = [7u8; 40];
        let salt = [1u8; SALT_LEN];
        let iv = [2u8; IV_LEN];
        let blob = encrypt_with(&plaintext, "pw", &salt, &iv).unwrap();

        assert_eq!(&blob[..SALT_LEN], &salt);
        assert_eq!(&blob[SALT_LEN..SALT_LEN + IV_LEN], &iv);
        // 40 bytes pad to 48
        assert_eq!(blob.len(), SALT_LEN + IV_LEN + 48);
        assert_eq!(decrypt(&blob, "pw").unwrap().as_slice(), &plaintext);
    }

    #[test]
    fn test_block_aligned_input_gets_full_padding_block() {
        let plaintext = [9u8; 32];
        let blob = encrypt_with(&plaintext, "pw", &[0u8; SALT_LEN], &[0u8; IV_LEN]).unwrap();
        assert_eq!(blob.len(), SALT_LEN + IV_LEN + 48);
    }

    #[test]
    fn test_fresh_salt_and_iv_per_call() {
        let a = encrypt(b"secret key bytes", "pw").unwrap();
        let b = encrypt(b"secret key bytes", "pw").unwrap();
        assert_ne!(a[..SALT_LEN + IV_LEN], b[..SALT_LEN + IV_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password() {
        let blob = encrypt(&shared_keypair().private_key, "right").unwrap();
        assert!(matches!(
            decrypt_private_key(&blob, "wrong"),
            Err(MedidError::WrongPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_tampered_blob() {
        let mut blob = encrypt(&shared_keypair().private_key, "pw").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(matches!(
            decrypt_private_key(&blob, "pw"),
            Err(MedidError::WrongPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_decrypt_private_key_parses() {
        let key = shared_keypair();
        let blob = encrypt(&key.private_key, "pw").unwrap();
        let parsed = decrypt_private_key(&blob, "pw").unwrap();
        assert_eq!(parsed, parse_private_key(&key.private_key).unwrap());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(encrypt(&[], "pw"), Err(MedidError::InvalidArgument(_))));
        assert!(matches!(encrypt(b"k", ""), Err(MedidError::InvalidArgument(_))));
        assert!(matches!(decrypt(&[], "pw"), Err(MedidError::InvalidArgument(_))));
        assert!(matches!(decrypt(&[0u8; 64], ""), Err(MedidError::InvalidArgument(_))));
    }

    #[test]
    fn test_truncated_blob() {
        assert!(matches!(decrypt(&[0u8; 40], "pw"), Err(MedidError::InvalidEncoding(_))));
        assert!(matches!(decrypt(&[0u8; 50], "pw"), Err(MedidError::InvalidEncoding(_))));
    }
}
