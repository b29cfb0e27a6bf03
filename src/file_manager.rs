//! # File Management Module
//!
//! Questo modulo raccoglie le operazioni sui file usate dalla routine di compressione.
//!
//! ## Responsabilità:
//! - Determinazione del formato immagine dall'estensione (case-insensitive)
//! - Calcolo del path del fratello `.webp`
//! - Sostituzione atomica di un file con i byte ricompressi
//! - Scrittura atomica del fratello `.webp` (stessi permessi dell'originale)
//! - Formattazione human-readable delle dimensioni e calcolo della riduzione
//!
//! ## Formati riconosciuti:
//! - **JPEG**: `.jpg`, `.jpeg`
//! - **PNG**: `.png`
//!
//! Qualsiasi altra estensione che passi il pattern `include` viene ignorata
//! senza errori.
//!
//! ## Esempio:
//! ```rust,ignore
//! if let Some(format) = FileManager::detect_format(&path) {
//!     let webp = FileManager::webp_sibling_path(&path);
//! }
//! assert_eq!(FileManager::format_size(2048), "2.0 KB");
//! ```

use crate::error::CompressError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Raster formats the compression routine knows how to re-encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        }
    }
}

/// Manages file operations for the compression routine
pub struct FileManager;

impl FileManager {
    /// Detect the source format from the file extension
    pub fn detect_format(path: &Path) -> Option<SourceFormat> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            _ => None,
        }
    }

    /// Path of the WebP copy written next to an image (`a/b.jpg` -> `a/b.webp`)
    pub fn webp_sibling_path(path: &Path) -> PathBuf {
        path.with_extension("webp")
    }

    /// Atomically replace `path` with `contents`.
    ///
    /// The bytes go to a temporary file in the same directory, which is then
    /// renamed over the original. A failure at any point leaves the original
    /// untouched. Blocking; call from `spawn_blocking`.
    pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), CompressError> {
        Self::persist_atomically(path, contents, path)
    }

    /// Atomically write a derived file next to `source`.
    ///
    /// Same temp-file-and-rename as [`FileManager::replace_file`]. An existing
    /// file at `path` keeps its permissions; a new one takes those of `source`.
    pub fn write_sibling(path: &Path, contents: &[u8], source: &Path) -> Result<(), CompressError> {
        let permissions_from = if path.exists() { path } else { source };
        Self::persist_atomically(path, contents, permissions_from)
    }

    fn persist_atomically(path: &Path, contents: &[u8], permissions_from: &Path) -> Result<(), CompressError> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;

        // The temp file is created 0600
        if let Ok(metadata) = std::fs::metadata(permissions_from) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }

        temp.persist(path)?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * 1024;

        if size < KB {
            format!("{} B", size)
        } else if size < MB {
            format!("{:.1} KB", size as f64 / KB as f64)
        } else {
            format!("{:.1} MB", size as f64 / MB as f64)
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
