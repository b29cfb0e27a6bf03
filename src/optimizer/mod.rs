//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `media_optimizer`: Walker dell'albero di output (orchestratore)
//! - `task_optimizer`: Routine di compressione per singolo file

pub mod media_optimizer;
pub mod task_optimizer;

pub use media_optimizer::ImageCompressor;
pub use task_optimizer::{FileOutcome, FileReport, TaskOptimizer, WebpOutcome};
