//! # Image Compress - Main Entry Point
//!
//! Questo è il punto di ingresso usato come passo post-build.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione della configurazione (file JSON + override da CLI)
//! - Invocazione dell'hook `close_bundle` una sola volta
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` ha la precedenza)
//! 3. Carica il file di configurazione, se indicato, e applica gli override
//! 4. Valida la configurazione
//! 5. Esegue l'hook sulla directory di output
//!
//! Errori su singoli file o directory non cambiano l'exit code: solo una
//! configurazione non valida termina con errore.
//!
//! ## Esempio di utilizzo:
//! ```bash
//! npm run build && image-compress --public-dir dist --webp --quality 75
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use image_compress::{Config, ImageCompressPlugin, IncludePattern};

#[derive(Parser)]
#[command(name = "image-compress")]
#[command(about = "Recompress JPEG/PNG images in a build output directory")]
struct Args {
    /// JSON configuration file (camelCase keys, missing keys use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JPEG quality (0-100), also passed to the PNG encoder
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// WebP quality (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    webp_quality: Option<u8>,

    /// Also write a .webp copy next to every image
    #[arg(long)]
    webp: bool,

    /// Regex selecting file names to compress
    #[arg(short, long)]
    include: Option<String>,

    /// Build output directory, relative to the working directory
    #[arg(short, long)]
    public_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Layer command line values over the file configuration
    async fn into_config(self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => {
                if !path.exists() {
                    return Err(anyhow::anyhow!("Config file does not exist: {}", path.display()));
                }
                Config::from_file(path).await?
            }
            None => Config::default(),
        };

        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(webp_quality) = self.webp_quality {
            config.webp_quality = webp_quality;
        }
        if self.webp {
            config.enable_webp = true;
        }
        if let Some(ref include) = self.include {
            config.include = IncludePattern::new(include)
                .map_err(|e| anyhow::anyhow!("Invalid include pattern {:?}: {}", include, e))?;
        }
        if let Some(public_dir) = self.public_dir {
            config.public_dir = public_dir;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.into_config().await?;
    let plugin = ImageCompressPlugin::new(config)?;
    plugin.close_bundle().await;

    Ok(())
}
