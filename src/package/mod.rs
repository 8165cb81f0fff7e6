//! Package assembly and extraction
//!
//! A package is a zip archive laid out as:
//!
//! ```text
//! <name>.medid
//!  ├── medid.json         the (possibly signed) document
//!  ├── public.key         optional SubjectPublicKeyInfo DER
//!  ├── thumbnails/*.jpg   optional, from the artifact generator
//!  └── media/*            optional preview media
//! ```
//!
//! Saving hashes every entry that has a source file, optionally signs the
//! document, writes the tree into a staging directory and archives it. Loading
//! extracts into a staging directory and parses `medid.json`. Staging
//! directories never outlive the call.

pub mod archive;
pub mod artifacts;
pub mod staging;
mod validate;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::signing;
use crate::document::MedidDocument;
use crate::error::{MedidError, MedidResult};
use crate::hash::ContentHash;

pub use artifacts::{
    infer_mime_type, ArtifactGenerator, CopyPreview, MediaInspector, NoArtifacts, NoInspection,
};
pub use staging::StagingDir;
pub use validate::{validate, ValidationError};

/// Document member name
pub const DOCUMENT_MEMBER: &str = "medid.json";

/// Public key member name
pub const PUBLIC_KEY_MEMBER: &str = "public.key";

/// Conventional package file extension
pub const PACKAGE_EXTENSION: &str = "medid";

/// What `save` should do besides writing the document
#[derive(Clone, Default)]
pub struct SaveOptions {
    /// Public key written verbatim as `public.key`
    pub public_key: Option<Vec<u8>>,

    /// DER private key; the package is signed when this and a signer are set
    pub private_key: Option<Zeroizing<Vec<u8>>>,

    pub signer_name: Option<String>,

    pub public_key_hint: Option<String>,

    /// Add the legacy SHA-256 digest to each entry hash
    pub include_sha256: bool,

    /// Ask the artifact generator for thumbnails. No built-in generator
    /// renders them; this only has an effect with a caller-supplied one.
    pub include_thumbnails: bool,

    pub include_preview_media: bool,
}

impl SaveOptions {
    /// Options for an unsigned package without derived artifacts
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign with `private_key` as `signer_name`
    pub fn with_signing(mut self, private_key: &[u8], signer_name: impl Into<String>) -> Self {
        self.private_key = Some(Zeroizing::new(private_key.to_vec()));
        self.signer_name = Some(signer_name.into());
        self
    }

    pub fn with_public_key(mut self, public_key: &[u8]) -> Self {
        self.public_key = Some(public_key.to_vec());
        self
    }

    pub fn with_public_key_hint(mut self, hint: impl Into<String>) -> Self {
        self.public_key_hint = Some(hint.into());
        self
    }

    pub fn with_sha256(mut self, include: bool) -> Self {
        self.include_sha256 = include;
        self
    }

    pub fn with_thumbnails(mut self, include: bool) -> Self {
        self.include_thumbnails = include;
        self
    }

    pub fn with_preview_media(mut self, include: bool) -> Self {
        self.include_preview_media = include;
        self
    }

    /// Private key and signer name, when both are usable
    fn signing_identity(&self) -> Option<(&[u8], &str)> {
        let key = self.private_key.as_ref().map(|key| key.as_slice())?;
        let signer = self.signer_name.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((key, signer))
    }
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("public_key", &self.public_key.as_ref().map(|k| k.len()))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("signer_name", &self.signer_name)
            .field("public_key_hint", &self.public_key_hint)
            .field("include_sha256", &self.include_sha256)
            .field("include_thumbnails", &self.include_thumbnails)
            .field("include_preview_media", &self.include_preview_media)
            .finish()
    }
}

/// Result of loading a package
#[derive(Debug, Clone)]
pub struct LoadedPackage {
    pub document: MedidDocument,

    /// Contents of `public.key`, if the package carries one
    pub public_key: Option<Vec<u8>>,
}

/// Builds and reads medid packages
pub struct PackageAssembler {
    inspector: Box<dyn MediaInspector>,
    artifacts: Box<dyn ArtifactGenerator>,
    staging_root: Option<PathBuf>,
}

impl Default for PackageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageAssembler {
    /// Assembler with no metadata inspection and no artifact generation
    pub fn new() -> Self {
        Self {
            inspector: Box::new(NoInspection),
            artifacts: Box::new(NoArtifacts),
            staging_root: None,
        }
    }

    pub fn with_inspector(mut self, inspector: impl MediaInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn with_artifacts(mut self, artifacts: impl ArtifactGenerator + 'static) -> Self {
        self.artifacts = Box::new(artifacts);
        self
    }

    /// Create staging directories under `root` instead of the system temp dir
    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = Some(root.into());
        self
    }

    fn new_staging_dir(&self) -> io::Result<StagingDir> {
        StagingDir::create(self.staging_root.as_deref())
    }

    /// Fill in MIME type, length, hash and metadata for every entry whose
    /// source file exists. Entries without a source file are left as given.
    pub fn populate_content(
        &self,
        document: &MedidDocument,
        include_sha256: bool,
    ) -> MedidResult<MedidDocument> {
        let mut document = document.clone();

        for entry in &mut document.collection.entries {
            let Some(source) = entry.source_path.clone().filter(|p| p.is_file()) else {
                continue;
            };

            if entry.mime_type.trim().is_empty() {
                entry.mime_type = infer_mime_type(&source);
            }

            let (hash, length) = ContentHash::from_file(&source, include_sha256)?;
            entry.hash = hash.to_string();
            entry.length_in_bytes = length;

            if entry.metadata.is_none() {
                entry.metadata = Some(self.inspector.inspect(&source, &entry.mime_type)?);
            }

            tracing::debug!(filename = %entry.filename, hash = %entry.hash, length, "hashed entry");
        }

        Ok(document)
    }

    fn generate_artifacts(
        &self,
        document: &mut MedidDocument,
        staging: &Path,
        options: &SaveOptions,
    ) {
        if !options.include_thumbnails && !options.include_preview_media {
            return;
        }

        for (index, entry) in document.collection.entries.iter_mut().enumerate() {
            let Some(source) = entry.source_path.clone().filter(|p| p.is_file()) else {
                continue;
            };
            let mime_type = entry.mime_type.clone();

            if options.include_thumbnails {
                let member = artifacts::thumbnail_member(index, &entry.filename);
                entry.thumbnail_path =
                    artifacts::generate_best_effort("thumbnail", staging, &member, |dest| {
                        self.artifacts.thumbnail(&source, &mime_type, dest)
                    });
            }

            if options.include_preview_media {
                let member = artifacts::preview_member(index, &entry.filename);
                entry.preview_media_path =
                    artifacts::generate_best_effort("preview", staging, &member, |dest| {
                        self.artifacts.preview_media(&source, &mime_type, dest)
                    });
            }
        }
    }

    /// Write a content-populated document and its members into `staging`
    fn stage(
        &self,
        document: MedidDocument,
        staging: &Path,
        options: &SaveOptions,
    ) -> MedidResult<MedidDocument> {
        let mut document = document;
        self.generate_artifacts(&mut document, staging, options);

        let document = match options.signing_identity() {
            Some((key, signer)) => {
                signing::sign(&document, key, signer, options.public_key_hint.as_deref())?
            }
            // A stale signature from an earlier save would no longer match
            None => document.without_signature(),
        };

        document.write_to_file(&staging.join(DOCUMENT_MEMBER))?;
        if let Some(public_key) = &options.public_key {
            fs::write(staging.join(PUBLIC_KEY_MEMBER), public_key)?;
        }

        Ok(document)
    }

    fn write_package(
        &self,
        document: MedidDocument,
        destination: &Path,
        options: &SaveOptions,
    ) -> MedidResult<MedidDocument> {
        let staging = self.new_staging_dir()?;

        let staged = self.stage(document, staging.path(), options);
        // Archive whatever was staged even when staging failed; the staging
        // error takes precedence
        let archived = archive::create_archive(staging.path(), destination);
        drop(staging);

        let document = staged?;
        archived?;

        tracing::info!(
            destination = %destination.display(),
            entries = document.collection.entries.len(),
            signed = document.is_signed(),
            "saved package"
        );
        Ok(document)
    }

    /// Assemble and write a package to `destination`.
    ///
    /// Returns the document exactly as stored in `medid.json`.
    #[tracing::instrument(skip_all, fields(destination = %destination.display()))]
    pub fn save(
        &self,
        document: &MedidDocument,
        destination: &Path,
        options: &SaveOptions,
    ) -> MedidResult<MedidDocument> {
        let document = self.populate_content(document, options.include_sha256)?;
        self.write_package(document, destination, options)
    }

    /// Non-propagating save.
    ///
    /// Populates content, validates, and saves only when valid. Every failure,
    /// validation or otherwise, comes back as a message in the error list.
    pub fn try_save(
        &self,
        document: &MedidDocument,
        destination: &Path,
        options: &SaveOptions,
    ) -> Result<MedidDocument, Vec<String>> {
        let document = self
            .populate_content(document, options.include_sha256)
            .map_err(|e| vec![e.to_string()])?;

        let errors = validate(&document);
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "document failed validation, not saving");
            return Err(errors.iter().map(ToString::to_string).collect());
        }

        self.write_package(document, destination, options)
            .map_err(|e| vec![e.to_string()])
    }

    /// Save, failing with [`MedidError::ValidationFailed`] for invalid documents
    pub fn save_validated(
        &self,
        document: &MedidDocument,
        destination: &Path,
        options: &SaveOptions,
    ) -> MedidResult<MedidDocument> {
        let document = self.populate_content(document, options.include_sha256)?;
        let errors = validate(&document);
        if !errors.is_empty() {
            return Err(MedidError::ValidationFailed(errors));
        }
        self.write_package(document, destination, options)
    }

    /// Extract a package and parse its document
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> MedidResult<LoadedPackage> {
        let staging = self.new_staging_dir()?;
        archive::extract_archive(path, staging.path())?;

        let public_key = read_member(path, staging.path(), PUBLIC_KEY_MEMBER)?;

        let bytes = read_member(path, staging.path(), DOCUMENT_MEMBER)?.ok_or_else(|| {
            MedidError::MalformedPackage(format!("{}: missing {}", path.display(), DOCUMENT_MEMBER))
        })?;
        let document: MedidDocument = serde_json::from_slice(&bytes).map_err(|e| {
            MedidError::MalformedPackage(format!(
                "{}: unreadable {}: {}",
                path.display(),
                DOCUMENT_MEMBER,
                e
            ))
        })?;

        tracing::info!(
            entries = document.collection.entries.len(),
            signed = document.is_signed(),
            has_public_key = public_key.is_some(),
            "loaded package"
        );
        Ok(LoadedPackage {
            document,
            public_key,
        })
    }

    /// Load a package and verify its signature, never failing.
    ///
    /// Uses `public_key` when given, otherwise the package's own `public.key`.
    /// Any error (unreadable archive, missing key, bad encoding) is `false`.
    pub fn verify_package(&self, path: &Path, public_key: Option<&[u8]>) -> bool {
        let loaded = match self.load(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::debug!(error = %e, "package verification failed to load");
                return false;
            }
        };

        let Some(key) = public_key.or(loaded.public_key.as_deref()) else {
            tracing::debug!("no public key available for verification");
            return false;
        };

        match signing::verify(&loaded.document, key) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!(error = %e, "signature verification errored");
                false
            }
        }
    }
}

/// Read an extracted member. Absent is `None`; a member that exists but
/// cannot be read as a file (a directory, say) is a malformed package.
fn read_member(package: &Path, staging: &Path, member: &str) -> MedidResult<Option<Vec<u8>>> {
    match fs::read(staging.join(member)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MedidError::MalformedPackage(format!(
            "{}: unreadable {}: {}",
            package.display(),
            member,
            e
        ))),
    }
}
