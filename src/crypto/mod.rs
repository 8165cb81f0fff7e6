//! Cryptographic protocol: RSA key pairs, document signatures, and
//! password-protected private keys at rest

pub mod key_encryption;
pub mod keys;
pub mod signing;

pub use key_encryption::{decrypt, decrypt_private_key, encrypt, PBKDF2_ITERATIONS};
pub use keys::{
    generate_keypair, key_fingerprint, parse_private_key, parse_public_key, KeyPair,
    DEFAULT_KEY_SIZE_BITS, MAX_KEY_SIZE_BITS, MIN_KEY_SIZE_BITS,
};
pub use signing::{sign, verify, SIGNATURE_ALGORITHM};
