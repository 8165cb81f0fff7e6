//! Zip container I/O for staged package trees

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{MedidError, MedidResult};

/// Archive every file and directory under `source_dir` into `destination`.
///
/// Member names are relative to `source_dir`, `/`-separated, and written in
/// sorted order so the same tree always yields the same member list.
pub fn create_archive(source_dir: &Path, destination: &Path) -> MedidResult<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ZipWriter::new(BufWriter::new(File::create(destination)?));

    let mut members = 0usize;
    for entry in WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry.map_err(io::Error::from)?;
        let rel_path = entry.path().strip_prefix(source_dir).map_err(|_| {
            MedidError::InvalidArgument(format!("{} escapes staging root", entry.path().display()))
        })?;

        // Skip root itself
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{}/", name), member_options(0o755))?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, member_options(0o644))?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
            members += 1;
        }
    }

    writer.finish()?;
    tracing::debug!(destination = %destination.display(), members, "wrote archive");
    Ok(())
}

fn member_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(mode)
}

fn open_archive(archive_path: &Path) -> MedidResult<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path)?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| {
        MedidError::MalformedPackage(format!("{}: not a zip archive: {}", archive_path.display(), e))
    })
}

/// Extract `archive_path` into `destination`.
///
/// Members whose names would escape `destination` are refused. Any archive
/// level failure is reported as a malformed package.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> MedidResult<()> {
    let mut archive = open_archive(archive_path)?;
    archive.extract(destination).map_err(|e| {
        MedidError::MalformedPackage(format!("{}: extraction failed: {}", archive_path.display(), e))
    })?;
    tracing::debug!(archive = %archive_path.display(), members = archive.len(), "extracted archive");
    Ok(())
}

/// List member names without extracting
pub fn member_names(archive_path: &Path) -> MedidResult<Vec<String>> {
    let archive = open_archive(archive_path)?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}
