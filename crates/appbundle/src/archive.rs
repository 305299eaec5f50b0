// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Archive creation for finished build directories
//!
//! ```text
//! build dir → walk (sorted) → tar → zstd → <output_root>/<basename>.tar.zst
//! ```
//!
//! Entry paths are `<basename>/<relative path>` with `/` separators. Headers
//! carry a fixed mode and a zero mtime, so the same directory contents always
//! produce the same archive bytes.

use crate::context::ARCHIVE_EXTENSION;
use crate::error::{BuildError, Result};
use async_compression::tokio::bufread::ZstdDecoder;
use async_compression::tokio::write::ZstdEncoder;
use diagnostics::*;
use futures::stream::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio_tar as tar;

/// Where an archive was written and what went into it
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveDescriptor {
    /// Build directory name, also the top-level directory inside the archive
    pub basename: String,
    pub path: PathBuf,
    pub file_count: usize,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// A file found in the build directory
struct ArchiveEntry {
    /// Path inside the archive
    name: String,
    source: PathBuf,
}

/// Compresses a build directory into a single `.tar.zst`
#[derive(Debug, Clone)]
pub struct Archiver {
    compression_level: i32,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            compression_level: 3,
        }
    }

    /// Set the zstd compression level (0-21, default 3)
    #[must_use]
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Archive path for a build directory: a sibling named `<basename>.tar.zst`
    pub fn archive_path_for(build_dir: &Path) -> Result<(String, PathBuf)> {
        let basename = build_dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                BuildError::archive(
                    build_dir,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "build directory has no usable name",
                    ),
                )
            })?;
        let path = build_dir.with_file_name(format!("{basename}.{ARCHIVE_EXTENSION}"));
        Ok((basename, path))
    }

    /// Archive everything currently under `build_dir`.
    pub async fn archive(&self, build_dir: &Path) -> Result<ArchiveDescriptor> {
        let (basename, archive_path) = Self::archive_path_for(build_dir)?;
        let entries = collect_entries(build_dir, &basename).await?;

        let file_count = entries.len();
        debug!(
            "Archiving {file_count} files from {dir}",
            file_count: file_count,
            dir: build_dir.display().to_string()
        );

        let mut tar_builder = tar::Builder::new(Vec::new());
        let mut uncompressed_size = 0u64;

        for entry in &entries {
            let data = tokio::fs::read(&entry.source)
                .await
                .map_err(|e| BuildError::archive(&entry.source, e))?;

            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_cksum();

            tar_builder
                .append_data(&mut header, &entry.name, data.as_slice())
                .await
                .map_err(|e| BuildError::archive(&archive_path, e))?;

            uncompressed_size += data.len() as u64;
        }

        let tar_buffer = tar_builder
            .into_inner()
            .await
            .map_err(|e| BuildError::archive(&archive_path, e))?;

        let mut zstd_encoder =
            ZstdEncoder::with_quality(Vec::new(), self.get_compression_level());
        zstd_encoder
            .write_all(&tar_buffer)
            .await
            .map_err(|e| BuildError::archive(&archive_path, e))?;
        zstd_encoder
            .shutdown()
            .await
            .map_err(|e| BuildError::archive(&archive_path, e))?;
        let compressed = zstd_encoder.into_inner();

        tokio::fs::write(&archive_path, &compressed)
            .await
            .map_err(|e| BuildError::archive(&archive_path, e))?;

        let descriptor = ArchiveDescriptor {
            basename,
            path: archive_path,
            file_count,
            uncompressed_size,
            compressed_size: compressed.len() as u64,
        };

        info!(
            "Wrote archive {path} ({file_count} files, {compressed_size} bytes)",
            path: descriptor.path.display().to_string(),
            file_count: file_count,
            compressed_size: descriptor.compressed_size
        );
        Ok(descriptor)
    }

    fn get_compression_level(&self) -> async_compression::Level {
        match self.compression_level {
            0 => async_compression::Level::Fastest,
            3 => async_compression::Level::Default,
            level => async_compression::Level::Precise(level),
        }
    }
}

/// Regular files under `build_dir`, sorted by archive name
async fn collect_entries(build_dir: &Path, basename: &str) -> Result<Vec<ArchiveEntry>> {
    let root = build_dir.to_path_buf();
    let prefix = basename.to_string();

    let walked = tokio::task::spawn_blocking(move || -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        for item in walkdir::WalkDir::new(&root).sort_by_file_name() {
            let item = item.map_err(|e| {
                let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                BuildError::archive(&path, std::io::Error::other(e.to_string()))
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let relative = item
                .path()
                .strip_prefix(&root)
                .map_err(|e| BuildError::archive(item.path(), std::io::Error::other(e)))?;

            let mut name = prefix.clone();
            for component in relative.components() {
                name.push('/');
                name.push_str(&component.as_os_str().to_string_lossy());
            }

            entries.push(ArchiveEntry {
                name,
                source: item.path().to_path_buf(),
            });
        }
        Ok(entries)
    })
    .await
    .map_err(|e| BuildError::archive(build_dir, std::io::Error::other(e)))??;

    Ok(walked)
}

/// Entry paths of a `.tar.zst` archive, in archive order
pub async fn list_archive(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BuildError::archive(path, e))?;

    let mut zstd_decoder = ZstdDecoder::new(BufReader::new(bytes.as_slice()));
    let mut archive = tar::Archive::new(&mut zstd_decoder);
    let mut entries = archive
        .entries()
        .map_err(|e| BuildError::archive(path, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next().await {
        let entry = entry.map_err(|e| BuildError::archive(path, e))?;
        let name = entry
            .path()
            .map_err(|e| BuildError::archive(path, e))?
            .to_string_lossy()
            .into_owned();
        names.push(name);
    }
    Ok(names)
}
