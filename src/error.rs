//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore della libreria.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` per categorizzare gli errori di un singolo file
//! - Integra con `thiserror` per la conversione automatica dagli errori standard
//! - Gli errori di configurazione restano in `anyhow` (vedi `config`)
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (lettura, scrittura, directory non leggibili)
//! - `Image`: Decodifica o codifica JPEG/PNG fallita (file corrotti, etc.)
//! - `Jpeg`: La compressione mozjpeg è fallita
//! - `WebP`: Codifica WebP fallita
//! - `Task`: Il task di codifica in background è andato in panic
//! - `Persist`: La sostituzione atomica del file non è riuscita
//!
//! Nessuno di questi errori arriva all'hook di build: vengono loggati
//! dal walker o dalla routine per file e poi scartati.

/// Custom error types for image recompression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(String),

    #[error("WebP encoding error: {0}")]
    WebP(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to replace file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
