//! Embedding collaborator interface.
//!
//! The engine does not define an embedding model; it consumes one through
//! the [`Embedder`] trait and treats failures as ingestion/query failures it
//! does not retry.

use crate::error::{FalaricaError, Result};
use crate::vector::Vector;

/// An external embedding provider: `text -> vector`.
pub trait Embedder: Send + Sync {
    /// The dimensionality this embedder produces, when it is fixed.
    fn dimension(&self) -> Option<usize>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vector>;

    /// Embed a batch of texts, in order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// An embedder for pre-computed vectors: rejects every input.
///
/// Use it where an `Embedder` is required but documents already carry their
/// vectors, so any attempt to embed indicates a wiring mistake.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedEmbedder;

impl PrecomputedEmbedder {
    /// Create a new precomputed embedder.
    pub fn new() -> Self {
        Self
    }
}

impl Embedder for PrecomputedEmbedder {
    fn dimension(&self) -> Option<usize> {
        None
    }

    fn embed(&self, _text: &str) -> Result<Vector> {
        Err(FalaricaError::embedding(
            "PrecomputedEmbedder cannot embed; supply vectors directly",
        ))
    }
}
