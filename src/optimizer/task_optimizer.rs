//! # Task Optimizer Module
//!
//! Worker per la compressione di un singolo file.
//! Separato dal walker per maggiore modularità: il walker decide *quali*
//! file, questo modulo decide *cosa* fare di ciascuno.

use crate::{
    config::Config,
    error::CompressError,
    file_manager::{FileManager, SourceFormat},
    image_processor::{EncodeTarget, ImageCodec},
};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info};

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Recompressed bytes were strictly smaller and replaced the original
    Compressed { original_size: u64, new_size: u64 },
    /// No size benefit, the original was left untouched
    Skipped { original_size: u64 },
    /// Extension matched `include` but is neither JPEG nor PNG
    Unsupported,
    /// Read, encode or write failed; already logged
    Failed,
}

/// What happened to the WebP sibling of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebpOutcome {
    /// `enable_webp` is off, or the file never got that far
    Disabled,
    /// Sibling written, with its size in bytes
    Written(u64),
    /// Encode or write failed; already logged
    Failed,
}

/// Result of processing one file, folded into the run statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReport {
    pub outcome: FileOutcome,
    pub webp: WebpOutcome,
}

impl FileReport {
    fn without_webp(outcome: FileOutcome) -> Self {
        Self {
            outcome,
            webp: WebpOutcome::Disabled,
        }
    }
}

/// Worker per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    pub config: Arc<Config>,
    codec: Arc<dyn ImageCodec>,
}

impl TaskOptimizer {
    /// Crea nuovo task optimizer
    pub fn new(config: Arc<Config>, codec: Arc<dyn ImageCodec>) -> Self {
        Self { config, codec }
    }

    /// Processa un singolo file. Gli errori vengono loggati e non propagati.
    pub async fn process_single_file(&self, file_path: &Path) -> FileReport {
        match self.compress_file(file_path).await {
            Ok(report) => report,
            Err(e) => {
                error!("image compression error ({}): {}", file_path.display(), e);
                FileReport::without_webp(FileOutcome::Failed)
            }
        }
    }

    /// Recompress one file in place and optionally write its WebP sibling.
    ///
    /// Errors before the overwrite decision are returned. A WebP failure comes
    /// after the original is already settled, so it is logged and reported in
    /// [`FileReport::webp`] without touching the recompression outcome.
    pub async fn compress_file(&self, file_path: &Path) -> Result<FileReport, CompressError> {
        let Some(source) = FileManager::detect_format(file_path) else {
            debug!("Ignoring unsupported format: {}", file_path.display());
            return Ok(FileReport::without_webp(FileOutcome::Unsupported));
        };

        let original: Arc<[u8]> = fs::read(file_path).await?.into();
        let original_size = original.len() as u64;
        debug!(
            "{} {} ({})",
            source.name(),
            file_path.display(),
            FileManager::format_size(original_size)
        );

        let target = EncodeTarget::recompress(source, self.config.quality);
        let compressed = self.encode(Arc::clone(&original), source, target).await?;

        let outcome = self
            .handle_compression_result(file_path, original_size, compressed)
            .await?;

        if !self.config.enable_webp {
            return Ok(FileReport::without_webp(outcome));
        }

        // Independent of the overwrite decision, always from the original bytes
        let webp = match self.write_webp(file_path, original, source).await {
            Ok(size) => WebpOutcome::Written(size),
            Err(e) => {
                error!("image compression error ({}): {}", file_path.display(), e);
                WebpOutcome::Failed
            }
        };

        Ok(FileReport { outcome, webp })
    }

    /// Sostituisce il file solo se la versione ricompressa è strettamente più piccola
    async fn handle_compression_result(
        &self,
        file_path: &Path,
        original_size: u64,
        compressed: Vec<u8>,
    ) -> Result<FileOutcome, CompressError> {
        let new_size = compressed.len() as u64;

        if new_size >= original_size {
            info!("⊘ skipped: {} (no benefit)", file_path.display());
            return Ok(FileOutcome::Skipped { original_size });
        }

        let target = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || FileManager::replace_file(&target, &compressed)).await??;

        info!(
            "✓ compressed: {} ({} → {}, {:.1}% reduction)",
            file_path.display(),
            FileManager::format_size(original_size),
            FileManager::format_size(new_size),
            FileManager::calculate_reduction(original_size, new_size)
        );

        Ok(FileOutcome::Compressed {
            original_size,
            new_size,
        })
    }

    async fn write_webp(
        &self,
        file_path: &Path,
        original: Arc<[u8]>,
        source: SourceFormat,
    ) -> Result<u64, CompressError> {
        let target = EncodeTarget::WebP {
            quality: self.config.webp_quality,
        };
        let webp = self.encode(original, source, target).await?;

        let size = webp.len() as u64;
        let webp_path = FileManager::webp_sibling_path(file_path);
        let (sibling, source_path) = (webp_path.clone(), file_path.to_path_buf());
        tokio::task::spawn_blocking(move || FileManager::write_sibling(&sibling, &webp, &source_path)).await??;

        info!(
            "✓ WebP generated: {} ({})",
            webp_path.display(),
            FileManager::format_size(size)
        );
        Ok(size)
    }

    /// Encoding is CPU-bound, keep it off the async workers
    async fn encode(
        &self,
        input: Arc<[u8]>,
        source: SourceFormat,
        target: EncodeTarget,
    ) -> Result<Vec<u8>, CompressError> {
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || codec.encode(&input, source, target)).await?
    }
}
