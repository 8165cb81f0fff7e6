//! Built-in defaults (layer 1)

use serde_json::{json, Value};

use crate::crypto::DEFAULT_KEY_SIZE_BITS;

/// Hardcoded defaults for every setting that has one.
///
/// Unset optionals (staging root, signer, key hint) are left out of the layer
/// entirely rather than written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct MedidDefaults {
    /// RSA modulus size for `keygen` (default: 2048)
    pub key_size_bits: usize,

    /// Add the legacy SHA-256 digest to entry hashes (default: false)
    pub include_sha256: bool,

    /// Ship preview media (default: false)
    pub preview_media: bool,
}

impl Default for MedidDefaults {
    fn default() -> Self {
        Self {
            key_size_bits: DEFAULT_KEY_SIZE_BITS,
            include_sha256: false,
            preview_media: false,
        }
    }
}

impl MedidDefaults {
    /// Layer value for merging
    pub fn to_value(&self) -> Value {
        json!({
            "key_size_bits": self.key_size_bits,
            "hash": {
                "include_sha256": self.include_sha256
            },
            "artifacts": {
                "preview_media": self.preview_media
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = MedidDefaults::default();
        assert_eq!(defaults.key_size_bits, 2048);
        assert!(!defaults.include_sha256);
        assert!(!defaults.preview_media);
    }

    #[test]
    fn test_to_value_omits_unset_optionals() {
        let value = MedidDefaults::default().to_value();
        assert_eq!(value["key_size_bits"], 2048);
        assert_eq!(value["artifacts"]["preview_media"], false);
        assert!(value.get("staging").is_none());
        assert!(value.get("signing").is_none());
    }
}
