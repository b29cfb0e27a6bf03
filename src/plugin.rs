//! # Build Hook
//!
//! Punto di aggancio per il sistema di build: viene invocato una sola volta,
//! dopo che il bundle di produzione è stato scritto su disco.
//!
//! ## Flusso:
//! 1. La configurazione viene validata e catturata alla registrazione (`new`)
//! 2. `close_bundle()` risolve `public_dir` rispetto alla working directory
//! 3. Il walker elabora tutto l'albero e logga il riepilogo
//!
//! Nessun errore su file o directory arriva al chiamante: la build non
//! fallisce mai per un'immagine corrotta.

use crate::{config::Config, optimizer::ImageCompressor, stats::CompressionStats};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Post-build image compression hook
pub struct ImageCompressPlugin {
    compressor: ImageCompressor,
}

impl ImageCompressPlugin {
    pub const NAME: &'static str = "vite-plugin-image-compress";

    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            compressor: ImageCompressor::new(config)?,
        })
    }

    /// Wrap an already configured compressor (custom codec)
    pub fn from_compressor(compressor: ImageCompressor) -> Self {
        Self { compressor }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Run after the bundle is written, against the current working directory
    pub async fn close_bundle(&self) -> CompressionStats {
        // An unknown cwd leaves the path relative, which the OS resolves the same way
        let cwd = std::env::current_dir().unwrap_or_default();
        self.close_bundle_in(&cwd).await
    }

    /// Run against `public_dir` resolved from an explicit working directory
    pub async fn close_bundle_in(&self, cwd: &Path) -> CompressionStats {
        let public_path = self.compressor.config().resolve_public_dir(cwd);
        info!("[{}] Compressing images after build", self.name());

        let stats = self.compressor.run(&public_path).await;
        stats.log_summary();
        stats
    }
}
