//! # Run Statistics
//!
//! Counters accumulated over one pass of the walker and logged once at the
//! end. Each file contributes exactly one of compressed / skipped /
//! unsupported / error; WebP copies and WebP failures are counted on top of
//! that.

use crate::file_manager::FileManager;
use tracing::info;

/// Statistics tracker for compression results
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompressionStats {
    pub files_compressed: usize,
    pub files_skipped: usize,
    pub files_unsupported: usize,
    pub webp_generated: usize,
    pub webp_errors: usize,
    pub file_errors: usize,
    pub directory_errors: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
}

impl CompressionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_compressed(&mut self, original_size: u64, new_size: u64) {
        self.files_compressed += 1;
        self.total_original_size += original_size;
        self.total_bytes_saved += original_size.saturating_sub(new_size);
    }

    pub fn add_skipped(&mut self, original_size: u64) {
        self.files_skipped += 1;
        self.total_original_size += original_size;
    }

    pub fn add_unsupported(&mut self) {
        self.files_unsupported += 1;
    }

    pub fn add_webp(&mut self) {
        self.webp_generated += 1;
    }

    /// WebP sibling failed after the file itself was settled
    pub fn add_webp_error(&mut self) {
        self.webp_errors += 1;
    }

    pub fn add_file_error(&mut self) {
        self.file_errors += 1;
    }

    pub fn add_directory_error(&mut self) {
        self.directory_errors += 1;
    }

    /// Files that reached the compression routine
    pub fn files_processed(&self) -> usize {
        self.files_compressed + self.files_skipped + self.files_unsupported + self.file_errors
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(
            self.total_original_size,
            self.total_original_size - self.total_bytes_saved,
        )
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Compressed: {} | Skipped: {} | WebP: {} | Errors: {} | Total saved: {} ({:.1}%)",
            self.files_processed(),
            self.files_compressed,
            self.files_skipped,
            self.webp_generated,
            self.file_errors + self.webp_errors + self.directory_errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }

    /// Print the end-of-run summary
    pub fn log_summary(&self) {
        info!("=== Image Compression Complete ===");
        info!("{}", self.format_summary());
        if self.webp_errors > 0 {
            info!("WebP copies that could not be written: {}", self.webp_errors);
        }
        if self.directory_errors > 0 {
            info!("Directories that could not be read: {}", self.directory_errors);
        }
    }
}
