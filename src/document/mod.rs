//! The medid metadata document (medid.json)
//!
//! A document owns exactly one [`MediaCollection`] and an optional
//! [`MedidSignature`]. Optional fields are omitted from JSON when absent so
//! the canonical form never carries `null` tokens.

pub mod canonical;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use canonical::{canonicalize, canonicalize_to_string};

/// Format version written to the `medid` field
pub const FORMAT_VERSION: &str = "1.0";

/// Default content hash algorithm label
pub const DEFAULT_HASH_ALGORITHM: &str = "blake3";

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

fn default_hash_algorithm() -> String {
    DEFAULT_HASH_ALGORITHM.to_string()
}

/// Top-level medid document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedidDocument {
    /// Format version
    #[serde(rename = "medid", default = "default_format_version")]
    pub format_version: String,

    /// The described media collection
    pub collection: MediaCollection,

    /// Signature over the canonical form of everything else
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<MedidSignature>,
}

/// A named, ordered collection of media entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCollection {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    pub created: DateTime<Utc>,

    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    #[serde(default)]
    pub entries: Vec<MediaEntry>,
}

/// A single media file described by the document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    /// File name as it should appear to consumers
    pub filename: String,

    /// Combined content hash, e.g. `blake3:<hex>`
    #[serde(default)]
    pub hash: String,

    /// File length in bytes
    #[serde(rename = "length", default)]
    pub length_in_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MediaMetadata>,

    #[serde(default)]
    pub mime_type: String,

    /// Package-relative thumbnail path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,

    /// Package-relative preview media path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_media_path: Option<String>,

    /// Absolute path of the file to package. Only used during assembly.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

// source_path is transient and never part of the document's identity
impl PartialEq for MediaEntry {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
            && self.hash == other.hash
            && self.length_in_bytes == other.length_in_bytes
            && self.metadata == other.metadata
            && self.mime_type == other.mime_type
            && self.thumbnail_path == other.thumbnail_path
            && self.preview_media_path == other.preview_media_path
    }
}

/// Media-specific properties. Absent means "not applicable", not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Opaque duration string, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<DateTime<Utc>>,
}

/// Signature record attached to a signed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedidSignature {
    /// Base64 of the raw RSA signature bytes
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,

    /// Opaque key identifier, not verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hint: Option<String>,
}

impl MedidDocument {
    /// Create an unsigned document for a collection
    pub fn new(collection: MediaCollection) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            collection,
            signature: None,
        }
    }

    /// Return a copy carrying `signature`. The receiver is left untouched.
    pub fn with_signature(&self, signature: MedidSignature) -> Self {
        Self {
            signature: Some(signature),
            ..self.clone()
        }
    }

    /// Return a copy with the signature field absent
    pub fn without_signature(&self) -> Self {
        Self {
            signature: None,
            ..self.clone()
        }
    }

    /// Whether a non-empty signature value is present
    pub fn is_signed(&self) -> bool {
        self.signature
            .as_ref()
            .is_some_and(|signature| !signature.value.is_empty())
    }

    /// Serialize to the pretty-printed storage form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the storage form to a file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }
}

impl MediaCollection {
    /// Create an empty collection stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            publisher: None,
            created: Utc::now(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_entry(mut self, entry: MediaEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sum of all entry lengths
    pub fn total_length(&self) -> u64 {
        self.entries.iter().map(|e| e.length_in_bytes).sum()
    }
}

impl MediaEntry {
    /// Create an entry with only a file name
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Create an entry for a file on disk. Content fields are filled in when
    /// the package is saved.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            filename,
            source_path: Some(path),
            ..Self::default()
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_length(mut self, length_in_bytes: u64) -> Self {
        self.length_in_bytes = length_in_bytes;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl MediaMetadata {
    /// Metadata for a still image
    pub fn dimensions(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}
