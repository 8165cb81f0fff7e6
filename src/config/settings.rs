//! Typed view of the merged configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::crypto::{DEFAULT_KEY_SIZE_BITS, MAX_KEY_SIZE_BITS, MIN_KEY_SIZE_BITS};
use crate::package::{CopyPreview, PackageAssembler, SaveOptions};

use super::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MedidSettings {
    pub key_size_bits: usize,
    pub hash: HashSettings,
    pub artifacts: ArtifactSettings,
    pub staging: StagingSettings,
    pub signing: SigningSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashSettings {
    pub include_sha256: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactSettings {
    /// Ship a copy of each image, audio or video file as preview media
    pub preview_media: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingSettings {
    /// Parent for staging directories; system temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_hint: Option<String>,
}

impl Default for MedidSettings {
    fn default() -> Self {
        Self {
            key_size_bits: DEFAULT_KEY_SIZE_BITS,
            hash: HashSettings::default(),
            artifacts: ArtifactSettings::default(),
            staging: StagingSettings::default(),
            signing: SigningSettings::default(),
        }
    }
}

impl MedidSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bits = self.key_size_bits;
        if !(MIN_KEY_SIZE_BITS..=MAX_KEY_SIZE_BITS).contains(&bits) || bits % 8 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "key_size_bits must be a multiple of 8 in [{}, {}], got {}",
                MIN_KEY_SIZE_BITS, MAX_KEY_SIZE_BITS, bits
            )));
        }
        if let Some(signer) = &self.signing.signer {
            if signer.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "signing.signer must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Save options carrying the configured flags and signing identity.
    ///
    /// Keys are not configuration; callers attach them separately.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            signer_name: self.signing.signer.clone(),
            public_key_hint: self.signing.public_key_hint.clone(),
            include_sha256: self.hash.include_sha256,
            include_preview_media: self.artifacts.preview_media,
            ..SaveOptions::default()
        }
    }

    /// Assembler honoring the staging root and preview settings
    pub fn assembler(&self) -> PackageAssembler {
        let mut assembler = PackageAssembler::new();
        if let Some(root) = &self.staging.root {
            assembler = assembler.with_staging_root(root.clone());
        }
        if self.artifacts.preview_media {
            assembler = assembler.with_artifacts(CopyPreview);
        }
        assembler
    }
}
