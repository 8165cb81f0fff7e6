//! Collaborators that derive data from media files
//!
//! Metadata inspection, thumbnail rendering and preview transcoding live
//! outside the core. The assembler talks to them through [`MediaInspector`]
//! and [`ArtifactGenerator`]. Artifact generation is best effort: a failing
//! generator leaves the entry's path field unset and never aborts a save.

use std::fs;
use std::io;
use std::path::Path;

use crate::document::MediaMetadata;

/// Package directory for thumbnails
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Package directory for preview media
pub const PREVIEW_DIR: &str = "media";

/// MIME type used when the extension is unknown
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Extracts media metadata (dimensions, duration, capture time)
pub trait MediaInspector: Send + Sync {
    /// Inspect `source`. Fields that do not apply stay `None`.
    fn inspect(&self, source: &Path, mime_type: &str) -> io::Result<MediaMetadata>;
}

/// Produces derived artifacts for an entry
pub trait ArtifactGenerator: Send + Sync {
    /// Write a JPEG thumbnail of `source` to `destination`.
    ///
    /// Returns `Ok(false)` when no thumbnail applies to this media.
    fn thumbnail(&self, _source: &Path, _mime_type: &str, _destination: &Path) -> io::Result<bool> {
        Ok(false)
    }

    /// Write preview media for `source` to `destination`.
    fn preview_media(
        &self,
        _source: &Path,
        _mime_type: &str,
        _destination: &Path,
    ) -> io::Result<bool> {
        Ok(false)
    }
}

/// Inspector that reports nothing applicable
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInspection;

impl MediaInspector for NoInspection {
    fn inspect(&self, _source: &Path, _mime_type: &str) -> io::Result<MediaMetadata> {
        Ok(MediaMetadata::default())
    }
}

/// Generator that produces no artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

impl ArtifactGenerator for NoArtifacts {}

/// Generator that ships a verbatim copy of each image, audio or video file as
/// its preview media
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyPreview;

impl ArtifactGenerator for CopyPreview {
    fn preview_media(&self, source: &Path, mime_type: &str, destination: &Path) -> io::Result<bool> {
        let previewable = ["image/", "audio/", "video/"]
            .iter()
            .any(|prefix| mime_type.starts_with(prefix));
        if !previewable {
            return Ok(false);
        }
        fs::copy(source, destination)?;
        Ok(true)
    }
}

/// Infer a MIME type from the file extension
pub fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Package member for the thumbnail of entry `index`, e.g.
/// `thumbnails/0-photo.jpg`. The index keeps entries that share a file stem
/// apart.
pub fn thumbnail_member(index: usize, filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "thumbnail".to_string());
    format!("{}/{}-{}.jpg", THUMBNAIL_DIR, index, stem)
}

/// Package member for the preview media of entry `index`, e.g.
/// `media/2-clip.mp4`
pub fn preview_member(index: usize, filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "preview".to_string());
    format!("{}/{}-{}", PREVIEW_DIR, index, name)
}

/// Run one generator step without letting its failure escape.
///
/// Returns the member name when the generator produced the file.
pub(crate) fn generate_best_effort<F>(
    kind: &str,
    staging: &Path,
    member: &str,
    generate: F,
) -> Option<String>
where
    F: FnOnce(&Path) -> io::Result<bool>,
{
    let destination = staging.join(member);
    let result = match destination.parent() {
        Some(parent) => fs::create_dir_all(parent).and_then(|_| generate(&destination)),
        None => generate(&destination),
    };

    match result {
        Ok(true) if destination.is_file() => Some(member.to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(kind, member, error = %e, "artifact generation failed, skipping");
            let _ = fs::remove_file(&destination);
            None
        }
    }
}
