//! Content hashing for media entries
//!
//! Every entry carries a mandatory BLAKE3 digest and, on request, a legacy
//! SHA-256 digest of the raw file bytes. The combined string is stored in
//! `MediaEntry::hash` and is therefore covered by the document signature.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::document::MedidDocument;
use crate::error::{MedidError, MedidResult};

/// Label of the mandatory fast hash
pub const BLAKE3_LABEL: &str = "blake3";

/// Label of the optional legacy hash
pub const SHA256_LABEL: &str = "sha256";

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digests of one file's raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    /// Lowercase hex BLAKE3 digest
    pub blake3: String,

    /// Lowercase hex SHA-256 digest, when requested
    pub sha256: Option<String>,
}

impl ContentHash {
    /// Hash an in-memory buffer
    pub fn compute(bytes: &[u8], include_sha256: bool) -> Self {
        let blake3 = blake3::hash(bytes).to_hex().to_string();
        let sha256 = include_sha256.then(|| hex::encode(Sha256::digest(bytes)));
        Self { blake3, sha256 }
    }

    /// Hash a stream, returning the digests and the number of bytes read
    pub fn from_reader<R: Read>(mut reader: R, include_sha256: bool) -> io::Result<(Self, u64)> {
        let mut blake3 = blake3::Hasher::new();
        let mut sha256 = include_sha256.then(Sha256::new);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut length = 0u64;

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            blake3.update(&buffer[..read]);
            if let Some(hasher) = sha256.as_mut() {
                hasher.update(&buffer[..read]);
            }
            length += read as u64;
        }

        let hash = Self {
            blake3: blake3.finalize().to_hex().to_string(),
            sha256: sha256.map(|hasher| hex::encode(hasher.finalize())),
        };
        Ok((hash, length))
    }

    /// Hash a file on disk
    pub fn from_file(path: &Path, include_sha256: bool) -> io::Result<(Self, u64)> {
        Self::from_reader(File::open(path)?, include_sha256)
    }

    /// Parse `blake3:<hex>` or `sha256:<hex>|blake3:<hex>`
    pub fn parse(value: &str) -> MedidResult<Self> {
        let mut blake3 = None;
        let mut sha256 = None;

        for part in value.split('|') {
            let (label, digest) = part
                .split_once(':')
                .ok_or_else(|| MedidError::InvalidEncoding(format!("hash part without label: {}", part)))?;
            if !is_hex_digest(digest) {
                return Err(MedidError::InvalidEncoding(format!(
                    "{} digest is not 64 lowercase hex characters",
                    label
                )));
            }
            let slot = match label {
                BLAKE3_LABEL => &mut blake3,
                SHA256_LABEL => &mut sha256,
                other => {
                    return Err(MedidError::InvalidEncoding(format!(
                        "unknown hash algorithm: {}",
                        other
                    )))
                }
            };
            if slot.replace(digest.to_string()).is_some() {
                return Err(MedidError::InvalidEncoding(format!("duplicate {} digest", label)));
            }
        }

        let blake3 = blake3
            .ok_or_else(|| MedidError::InvalidEncoding("missing blake3 digest".to_string()))?;
        Ok(Self { blake3, sha256 })
    }

    /// Whether `other` describes the same bytes. The legacy digest is only
    /// compared when both sides carry one.
    pub fn matches(&self, other: &ContentHash) -> bool {
        if self.blake3 != other.blake3 {
            return false;
        }
        match (&self.sha256, &other.sha256) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Re-hash the file at `path` and compare it against this hash
    pub fn matches_file(&self, path: &Path) -> io::Result<bool> {
        let (actual, _) = ContentHash::from_file(path, self.sha256.is_some())?;
        Ok(self.matches(&actual))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sha256 {
            Some(sha256) => write!(f, "{}:{}|{}:{}", SHA256_LABEL, sha256, BLAKE3_LABEL, self.blake3),
            None => write!(f, "{}:{}", BLAKE3_LABEL, self.blake3),
        }
    }
}

fn is_hex_digest(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Mismatch between a document entry and a file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrityError {
    MissingFile { filename: String },
    UnparseableHash { filename: String, hash: String },
    LengthMismatch {
        filename: String,
        expected: u64,
        actual: u64,
    },
    HashMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::MissingFile { filename } => write!(f, "{}: missing", filename),
            IntegrityError::UnparseableHash { filename, hash } => {
                write!(f, "{}: unparseable hash {:?}", filename, hash)
            }
            IntegrityError::LengthMismatch {
                filename,
                expected,
                actual,
            } => write!(f, "{}: length mismatch ({} vs {})", filename, expected, actual),
            IntegrityError::HashMismatch {
                filename,
                expected,
                actual,
            } => write!(f, "{}: hash mismatch ({} vs {})", filename, expected, actual),
        }
    }
}

/// Check every entry of `document` against `media_dir/<filename>`.
///
/// Returns one error per mismatching entry; an empty list means every file
/// is present with the recorded length and digests.
pub fn verify_entries(document: &MedidDocument, media_dir: &Path) -> io::Result<Vec<IntegrityError>> {
    let mut errors = Vec::new();

    for entry in &document.collection.entries {
        let path = media_dir.join(&entry.filename);
        if !path.is_file() {
            errors.push(IntegrityError::MissingFile {
                filename: entry.filename.clone(),
            });
            continue;
        }

        let expected = match ContentHash::parse(&entry.hash) {
            Ok(hash) => hash,
            Err(_) => {
                errors.push(IntegrityError::UnparseableHash {
                    filename: entry.filename.clone(),
                    hash: entry.hash.clone(),
                });
                continue;
            }
        };

        let (actual, length) = ContentHash::from_file(&path, expected.sha256.is_some())?;
        if length != entry.length_in_bytes {
            errors.push(IntegrityError::LengthMismatch {
                filename: entry.filename.clone(),
                expected: entry.length_in_bytes,
                actual: length,
            });
        }
        if !expected.matches(&actual) {
            errors.push(IntegrityError::HashMismatch {
                filename: entry.filename.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MediaCollection, MediaEntry};
    use std::fs;
    use tempfile::TempDir;

    // BLAKE3 and SHA-256 of "abc"
    const ABC_BLAKE3: &str = "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_blake3_only_format() {
        let hash = ContentHash::compute(b"abc", false);
        assert_eq!(hash.to_string(), format!("blake3:{}", ABC_BLAKE3));
    }

    #[test]
    fn test_combined_format_puts_sha256_first() {
        let hash = ContentHash::compute(b"abc", true);
        assert_eq!(
            hash.to_string(),
            format!("sha256:{}|blake3:{}", ABC_SHA256, ABC_BLAKE3)
        );
    }

    #[test]
    fn test_streaming_matches_in_memory() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let (streamed, length) = ContentHash::from_reader(data.as_slice(), true).unwrap();
        assert_eq!(length, data.len() as u64);
        assert_eq!(streamed, ContentHash::compute(&data, true));
    }

    #[test]
    fn test_parse_round_trips_display() {
        let hash = ContentHash::compute(b"abc", true);
        assert_eq!(ContentHash::parse(&hash.to_string()).unwrap(), hash);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let bad_values = vec![
            String::new(),
            "blake3".to_string(),
            "blake3:xyz".to_string(),
            format!("md5:{}", ABC_BLAKE3),
            format!("sha256:{}", ABC_SHA256),
            format!("blake3:{}", ABC_BLAKE3.to_uppercase()),
            format!("blake3:{0}|blake3:{0}", ABC_BLAKE3),
        ];
        for bad in &bad_values {
            assert!(
                matches!(ContentHash::parse(bad), Err(MedidError::InvalidEncoding(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_matches_ignores_missing_legacy_digest() {
        let full = ContentHash::compute(b"abc", true);
        let fast = ContentHash::compute(b"abc", false);
        assert!(full.matches(&fast));
        assert!(!full.matches(&ContentHash::compute(b"abd", false)));
    }

    #[test]
    fn test_matches_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();

        let stored = ContentHash::parse(&format!("sha256:{}|blake3:{}", ABC_SHA256, ABC_BLAKE3)).unwrap();
        assert!(stored.matches_file(&path).unwrap());

        fs::write(&path, "abd").unwrap();
        assert!(!stored.matches_file(&path).unwrap());
    }

    #[test]
    fn test_verify_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        fs::write(dir.path().join("b.txt"), b"changed").unwrap();

        let (hash_a, len_a) = ContentHash::from_file(&dir.path().join("a.txt"), false).unwrap();
        let doc = MedidDocument::new(
            MediaCollection::new("c")
                .with_entry(MediaEntry::new("a.txt").with_hash(hash_a.to_string()).with_length(len_a))
                .with_entry(
                    MediaEntry::new("b.txt")
                        .with_hash(format!("blake3:{}", ABC_BLAKE3))
                        .with_length(3),
                )
                .with_entry(MediaEntry::new("gone.txt").with_hash(format!("blake3:{}", ABC_BLAKE3))),
        );

        let errors = verify_entries(&doc, dir.path()).unwrap();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], IntegrityError::LengthMismatch { filename, .. } if filename == "b.txt"));
        assert!(matches!(&errors[1], IntegrityError::HashMismatch { filename, .. } if filename == "b.txt"));
        assert!(matches!(&errors[2], IntegrityError::MissingFile { filename } if filename == "gone.txt"));
    }
}
