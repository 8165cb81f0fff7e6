//! Password-protected private keys

mod fixtures;

use medid::crypto::{decrypt, decrypt_private_key, encrypt, parse_private_key};
use medid::{sign, verify, MedidError};

use fixtures::{keypair, photo_document};

#[test]
fn test_encrypted_key_signs_after_decryption() {
    let keys = keypair();
    let blob = encrypt(&keys.private_key, "correct horse").unwrap();
    assert_ne!(blob.as_slice(), keys.private_key.as_slice());

    let private_key = decrypt(&blob, "correct horse").unwrap();
    assert_eq!(private_key.as_slice(), keys.private_key.as_slice());

    let signed = sign(&photo_document(), &private_key, "Alice", None).unwrap();
    assert!(verify(&signed, &keys.public_key).unwrap());
}

#[test]
fn test_blob_is_salt_iv_ciphertext() {
    let keys = keypair();
    let blob = encrypt(&keys.private_key, "pw").unwrap();

    // 16-byte salt, 16-byte IV, then whole AES blocks with at least one byte of padding
    let ciphertext = blob.len() - 32;
    assert_eq!(ciphertext % 16, 0);
    assert!(ciphertext > keys.private_key.len());
    assert!(ciphertext <= keys.private_key.len() + 16);
}

#[test]
fn test_wrong_password_is_reported() {
    let keys = keypair();
    let blob = encrypt(&keys.private_key, "right").unwrap();

    // Checked through the parsing path: a wrong key can still leave valid
    // padding, but never a parseable RSA key
    for password in ["wrong", "Right", "right "] {
        assert!(matches!(
            decrypt_private_key(&blob, password),
            Err(MedidError::WrongPasswordOrCorruptData)
        ));
    }
}

#[test]
fn test_decrypt_private_key_matches_original() {
    let keys = keypair();
    let blob = encrypt(&keys.private_key, "pw").unwrap();
    assert_eq!(
        decrypt_private_key(&blob, "pw").unwrap(),
        parse_private_key(&keys.private_key).unwrap()
    );
}

#[test]
fn test_corrupted_blob() {
    let keys = keypair();
    let mut blob = encrypt(&keys.private_key, "pw").unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x55;

    assert!(matches!(
        decrypt_private_key(&blob, "pw"),
        Err(MedidError::WrongPasswordOrCorruptData)
    ));
}

#[test]
fn test_malformed_blob_lengths() {
    assert!(matches!(decrypt(&[7u8; 31], "pw"), Err(MedidError::InvalidEncoding(_))));
    assert!(matches!(decrypt(&[7u8; 32 + 17], "pw"), Err(MedidError::InvalidEncoding(_))));
}

#[test]
fn test_empty_inputs_rejected() {
    assert!(matches!(encrypt(&[], "pw"), Err(MedidError::InvalidArgument(_))));
    assert!(matches!(encrypt(b"key", ""), Err(MedidError::InvalidArgument(_))));
    assert!(matches!(decrypt(&[], "pw"), Err(MedidError::InvalidArgument(_))));
}
