//! Structural validation of a document before it is packaged

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::MedidDocument;

/// One violated structural rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    /// Collection name is empty
    EmptyCollectionName,

    /// Collection has no entries
    NoEntries,

    /// Entry at `index` has an empty file name
    MissingFilename { index: usize },

    MissingMimeType { index: usize, filename: String },

    MissingHash { index: usize, filename: String },

    MissingMetadata { index: usize, filename: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyCollectionName => write!(f, "collection name is required"),
            ValidationError::NoEntries => write!(f, "collection must contain at least one entry"),
            ValidationError::MissingFilename { index } => {
                write!(f, "entry {}: filename is required", index)
            }
            ValidationError::MissingMimeType { index, filename } => {
                write!(f, "entry {} ({}): mimeType is required", index, filename)
            }
            ValidationError::MissingHash { index, filename } => {
                write!(f, "entry {} ({}): hash is required", index, filename)
            }
            ValidationError::MissingMetadata { index, filename } => {
                write!(f, "entry {} ({}): metadata is required", index, filename)
            }
        }
    }
}

/// Check `document` against the structural rules.
///
/// Returns one error per violated rule; an empty list means the document is
/// structurally valid. Pure, no I/O.
pub fn validate(document: &MedidDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let collection = &document.collection;

    if collection.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCollectionName);
    }
    if collection.entries.is_empty() {
        errors.push(ValidationError::NoEntries);
    }

    for (index, entry) in collection.entries.iter().enumerate() {
        if entry.filename.trim().is_empty() {
            errors.push(ValidationError::MissingFilename { index });
        }
        if entry.mime_type.trim().is_empty() {
            errors.push(ValidationError::MissingMimeType {
                index,
                filename: entry.filename.clone(),
            });
        }
        if entry.hash.trim().is_empty() {
            errors.push(ValidationError::MissingHash {
                index,
                filename: entry.filename.clone(),
            });
        }
        if entry.metadata.is_none() {
            errors.push(ValidationError::MissingMetadata {
                index,
                filename: entry.filename.clone(),
            });
        }
    }

    errors
}
