//! Shared fixtures for package, signing and key tests
//!
//! RSA key generation dominates test time, so each test binary generates its
//! key pairs once and shares them.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use medid::crypto::{generate_keypair, KeyPair};
use medid::{MediaCollection, MediaEntry, MediaMetadata, MedidDocument};

/// Signing key pair shared by every test in the binary
pub fn keypair() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(2048).unwrap())
}

/// A second, unrelated key pair
pub fn other_keypair() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(1024).unwrap())
}

/// `blake3:` followed by 64 hex characters
pub fn sample_hash() -> String {
    format!("blake3:{}", "0123456789abcdef".repeat(4))
}

/// One JPEG entry, 800x600, with a fixed hash and no source file
pub fn photo_document() -> MedidDocument {
    MedidDocument::new(
        MediaCollection::new("Vacation").with_entry(
            MediaEntry::new("photo.jpg")
                .with_hash(sample_hash())
                .with_length(204_800)
                .with_mime_type("image/jpeg")
                .with_metadata(MediaMetadata::dimensions(800, 600)),
        ),
    )
}

/// Write `files` (name, contents) into `dir` and return their paths
pub fn write_media(dir: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, contents)| {
            let path = dir.join(name);
            fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}

/// Collection with one entry per path, to be hashed on save
pub fn document_from_files(name: &str, paths: &[PathBuf]) -> MedidDocument {
    let collection = paths
        .iter()
        .fold(MediaCollection::new(name), |collection, path| {
            collection.with_entry(MediaEntry::from_path(path.clone()))
        });
    MedidDocument::new(collection)
}

/// Number of entries left in a staging root
pub fn staging_leftovers(root: &Path) -> usize {
    fs::read_dir(root).map(|entries| entries.count()).unwrap_or(0)
}
