/*!
 * Batch translation of subtitle entries.
 *
 * This module is split into several submodules:
 *
 * - `batch`: Order-preserving partitioning of entries into batches
 * - `port`: The translation boundary and its provider-backed adapter
 * - `pipeline`: The pausable, resumable run controller
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, chunk, split_into_batches};
pub use self::pipeline::{Phase, PipelineControl, PipelineSnapshot, PipelineState, TranslationPipeline};
pub use self::port::{ProviderTranslator, TranslationItem, TranslationPort};

// Submodules
pub mod batch;
pub mod pipeline;
pub mod port;
