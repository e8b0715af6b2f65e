//! The embedding provider contract.
//!
//! A provider maps text to fixed-length vectors. Ingestion and query must go
//! through providers with the same [`ProviderIdentity`]; vectors from
//! different identities live in unrelated geometries and cannot be compared.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, EmbeddingResult};

/// Model name plus dimensionality of an embedding provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub model: String,
    pub dimension: usize,
}

impl ProviderIdentity {
    #[must_use]
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}d)", self.model, self.dimension)
    }
}

/// Maps text to vectors.
///
/// Implementations must be deterministic for a fixed identity: the same text
/// always yields the same vector, and `embed_batch(texts)[i] == embed(texts[i])`.
pub trait EmbeddingProvider: Send + Sync + fmt::Debug {
    /// The provider's model name and advertised dimension.
    ///
    /// Must be cheap and must not force a lazy model to load.
    fn identity(&self) -> ProviderIdentity;

    /// Embed a single text.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed many texts, one vector per text, in input order.
    ///
    /// Either every vector is returned or an error is; never a partial batch.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Whether the underlying model is already resident.
    fn is_loaded(&self) -> bool {
        true
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn identity(&self) -> ProviderIdentity {
        (**self).identity()
    }

    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }
}

/// Check a provider's output against its advertised identity.
///
/// Rejects a batch with the wrong number of vectors, or any vector whose
/// length differs from `identity.dimension`.
pub fn validate_embeddings(
    identity: &ProviderIdentity,
    expected_count: usize,
    vectors: &[Vec<f32>],
) -> EmbeddingResult<()> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            expected: expected_count,
            actual: vectors.len(),
        });
    }

    if let Some(bad) = vectors.iter().find(|v| v.len() != identity.dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            model: identity.model.clone(),
            expected: identity.dimension,
            actual: bad.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = ProviderIdentity::new("all-MiniLM-L6-v2", 384);
        assert_eq!(identity.to_string(), "all-MiniLM-L6-v2 (384d)");
    }

    #[test]
    fn test_validate_accepts_matching_batch() {
        let identity = ProviderIdentity::new("stub", 3);
        let vectors = vec![vec![0.0; 3], vec![1.0; 3]];
        assert!(validate_embeddings(&identity, 2, &vectors).is_ok());
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let identity = ProviderIdentity::new("stub", 3);
        let vectors = vec![vec![0.0; 3]];
        let err = validate_embeddings(&identity, 2, &vectors).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_validate_rejects_divergent_dimension() {
        let identity = ProviderIdentity::new("stub", 3);
        let vectors = vec![vec![0.0; 3], vec![0.0; 4]];
        let err = validate_embeddings(&identity, 2, &vectors).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 4,
                ..
            }
        ));
    }
}
