//! Canonical form of a medid document
//!
//! The canonical form is the compact JSON rendering of the document with the
//! `signature` field absent: fields in declaration order, absent optionals
//! omitted, no whitespace, UTF-8. Signing and verification both go through
//! [`canonicalize`]; nothing else may produce signature input bytes.

use std::borrow::Cow;

use super::MedidDocument;
use crate::error::{MedidError, MedidResult};

/// Produce the canonical bytes of `document`.
///
/// Any signature present on the input is ignored, so a document never
/// covers its own signature.
pub fn canonicalize(document: &MedidDocument) -> MedidResult<Vec<u8>> {
    let unsigned = if document.signature.is_some() {
        Cow::Owned(document.without_signature())
    } else {
        Cow::Borrowed(document)
    };
    Ok(serde_json::to_vec(unsigned.as_ref())?)
}

/// Canonical form as a string
pub fn canonicalize_to_string(document: &MedidDocument) -> MedidResult<String> {
    let bytes = canonicalize(document)?;
    String::from_utf8(bytes)
        .map_err(|e| MedidError::InvalidEncoding(format!("canonical form is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MediaCollection, MediaEntry, MediaMetadata, MedidSignature};
    use chrono::{TimeZone, Utc};

    fn sample_document() -> MedidDocument {
        let mut collection = MediaCollection::new("Trip")
            .with_publisher("Studio Nord")
            .with_entry(
                MediaEntry::new("clip.mp4")
                    .with_hash(format!("sha256:{}|blake3:{}", "1".repeat(64), "2".repeat(64)))
                    .with_length(4096)
                    .with_mime_type("video/mp4")
                    .with_metadata(MediaMetadata {
                        width: Some(1920),
                        height: Some(1080),
                        duration: Some("00:01:30".to_string()),
                        date_taken: Some(Utc.with_ymd_and_hms(2023, 8, 2, 9, 30, 0).unwrap()),
                    }),
            );
        collection.created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        MedidDocument::new(collection)
    }

    #[test]
    fn test_canonical_form_is_compact_and_ordered() {
        let canonical = canonicalize_to_string(&sample_document()).unwrap();
        let expected = concat!(
            r#"{"medid":"1.0","collection":{"name":"Trip","publisher":"Studio Nord","#,
            r#""created":"2024-01-02T03:04:05Z","hashAlgorithm":"blake3","entries":[{"#,
            r#""filename":"clip.mp4","hash":"sha256:"#
        );
        assert!(canonical.starts_with(expected), "got {}", canonical);
        assert!(canonical.contains(
            r#""metadata":{"width":1920,"height":1080,"duration":"00:01:30","dateTaken":"2023-08-02T09:30:00Z"},"mimeType":"video/mp4"}]}}"#
        ));
        assert!(!canonical.contains(": "));
        assert!(!canonical.contains(", "));
        assert!(!canonical.contains('\n'));
    }

    #[test]
    fn test_canonicalize_is_deterministic() {
        let doc = sample_document();
        assert_eq!(canonicalize(&doc).unwrap(), canonicalize(&doc).unwrap());
    }

    #[test]
    fn test_string_form_matches_bytes() {
        let mut doc = sample_document();
        doc.collection.name = "Ferien am Wörthersee 🏔".to_string();

        let text = canonicalize_to_string(&doc).unwrap();
        assert_eq!(text.as_bytes(), canonicalize(&doc).unwrap().as_slice());
        assert!(text.contains("Wörthersee 🏔"));
    }

    #[test]
    fn test_canonicalize_is_idempotent_under_round_trip() {
        let doc = sample_document();
        let first = canonicalize(&doc).unwrap();
        let reparsed: MedidDocument = serde_json::from_slice(&first).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), first);
    }

    #[test]
    fn test_storage_form_reparses_to_same_canonical_bytes() {
        let doc = sample_document();
        let pretty = doc.to_json().unwrap();
        let reparsed = MedidDocument::from_json(&pretty).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), canonicalize(&doc).unwrap());
    }

    #[test]
    fn test_signature_is_excluded() {
        let doc = sample_document();
        let signed = doc.with_signature(MedidSignature {
            value: "AAAA".to_string(),
            signer: Some("Alice".to_string()),
            public_key_hint: Some("hint".to_string()),
        });

        let canonical = canonicalize(&signed).unwrap();
        assert_eq!(canonical, canonicalize(&doc).unwrap());
        assert!(!String::from_utf8(canonical).unwrap().contains("signature"));
    }

    #[test]
    fn test_empty_publisher_differs_from_absent() {
        let absent = sample_document();
        let mut empty = absent.clone();
        empty.collection.publisher = Some(String::new());
        empty.collection.entries.clear();

        let mut absent = absent;
        absent.collection.publisher = None;
        absent.collection.entries.clear();

        let empty_form = canonicalize_to_string(&empty).unwrap();
        let absent_form = canonicalize_to_string(&absent).unwrap();
        assert!(empty_form.contains(r#""publisher":"""#));
        assert!(!absent_form.contains("publisher"));
    }
}
