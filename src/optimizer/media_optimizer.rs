//! # Image Compressor Main Orchestrator
//!
//! Walker della directory di output: enumera l'albero con una pila esplicita
//! di directory, filtra i file con il pattern `include` e delega ogni file
//! al `TaskOptimizer`.
//!
//! I file di una directory vengono elaborati in parallelo, tranne quelli che
//! condividono lo stesso fratello `.webp` (`a.jpg` e `a.png`): questi formano
//! un gruppo elaborato in sequenza, in ordine di nome.

use crate::{
    config::Config,
    file_manager::FileManager,
    image_processor::{ImageCodec, ImageProcessor},
    optimizer::task_optimizer::{FileOutcome, FileReport, TaskOptimizer, WebpOutcome},
    stats::CompressionStats,
};
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info};

/// Entries collected from one directory listing
#[derive(Debug, Default)]
struct DirectoryListing {
    subdirectories: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

/// Orchestratore principale
pub struct ImageCompressor {
    config: Arc<Config>,
    task_optimizer: TaskOptimizer,
}

impl ImageCompressor {
    /// Crea nuova istanza con il codec di produzione
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, Arc::new(ImageProcessor::new()))
    }

    /// Crea nuova istanza con un codec arbitrario
    pub fn with_codec(config: Config, codec: Arc<dyn ImageCodec>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let task_optimizer = TaskOptimizer::new(Arc::clone(&config), codec);

        Ok(Self {
            config,
            task_optimizer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Esegue la compressione su tutto l'albero sotto `root`
    pub async fn run(&self, root: &Path) -> CompressionStats {
        info!("Starting image compression in: {}", root.display());
        self.log_configuration();

        let mut stats = CompressionStats::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut listing = DirectoryListing::default();

            if let Err(e) = self.list_directory(&dir, &mut listing).await {
                error!("image compression error ({}): {}", dir.display(), e);
                stats.add_directory_error();
            }

            // Whatever was listed before a failure is still processed
            pending.extend(listing.subdirectories);

            if listing.files.is_empty() {
                continue;
            }

            debug!("{} matching files in {}", listing.files.len(), dir.display());
            let groups = Self::group_by_webp_sibling(listing.files);
            let reports = join_all(groups.values().map(|files| self.process_group(files))).await;

            for report in reports.iter().flatten() {
                Self::record(&mut stats, report);
            }
        }

        stats
    }

    /// Files mapping to the same `.webp` path end up in one group, sorted by name
    fn group_by_webp_sibling(files: Vec<PathBuf>) -> BTreeMap<PathBuf, Vec<PathBuf>> {
        let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for file in files {
            groups
                .entry(FileManager::webp_sibling_path(&file))
                .or_default()
                .push(file);
        }
        for group in groups.values_mut() {
            group.sort();
        }
        groups
    }

    /// One file at a time, so no two tasks ever write the same sibling
    async fn process_group(&self, files: &[PathBuf]) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.task_optimizer.process_single_file(file).await);
        }
        reports
    }

    /// Logga configurazione
    fn log_configuration(&self) {
        info!(
            "Mode: Recompress in place (quality: {}, include: {})",
            self.config.quality,
            self.config.include.as_str()
        );

        if self.config.enable_webp {
            info!("WebP: Write .webp copies (quality: {})", self.config.webp_quality);
        }
    }

    /// Read one directory, splitting entries into subdirectories and matching files.
    ///
    /// Symlinks and special files are ignored; `file_type` does not follow links.
    async fn list_directory(&self, dir: &Path, listing: &mut DirectoryListing) -> std::io::Result<()> {
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                listing.subdirectories.push(entry.path());
            } else if file_type.is_file() && self.config.include.matches(&entry.file_name().to_string_lossy()) {
                listing.files.push(entry.path());
            }
        }

        Ok(())
    }

    fn record(stats: &mut CompressionStats, report: &FileReport) {
        match report.outcome {
            FileOutcome::Compressed {
                original_size,
                new_size,
            } => stats.add_compressed(original_size, new_size),
            FileOutcome::Skipped { original_size } => stats.add_skipped(original_size),
            FileOutcome::Unsupported => stats.add_unsupported(),
            FileOutcome::Failed => stats.add_file_error(),
        }

        match report.webp {
            WebpOutcome::Written(_) => stats.add_webp(),
            WebpOutcome::Failed => stats.add_webp_error(),
            WebpOutcome::Disabled => {}
        }
    }
}
