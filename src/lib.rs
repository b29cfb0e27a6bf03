//! # Image Compress Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per il sistema di build
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per le operazioni sui file
//! - `file_manager`: Formato da estensione, path WebP, sostituzione atomica, formattazione dimensioni
//! - `image_processor`: Codec adapter (JPEG/PNG/WebP) dietro il trait `ImageCodec`
//! - `optimizer`: Walker dell'albero e routine per singolo file
//! - `stats`: Statistiche della singola esecuzione
//! - `plugin`: Hook invocato dopo la scrittura del bundle
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use image_compress::{Config, ImageCompressPlugin};
//!
//! let plugin = ImageCompressPlugin::new(Config::default())?;
//! plugin.close_bundle().await;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod optimizer;
pub mod plugin;
pub mod stats;

pub use config::{Config, IncludePattern};
pub use error::CompressError;
pub use image_processor::{EncodeTarget, ImageCodec, ImageProcessor};
pub use optimizer::ImageCompressor;
pub use plugin::ImageCompressPlugin;
pub use stats::CompressionStats;
