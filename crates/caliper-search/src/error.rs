//! Index and query error types.

use caliper_core::{EmbeddingError, Metric, ProviderIdentity};
use thiserror::Error;

/// Errors raised by a vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing store could not be opened, read, or written.
    #[error("index store error: {0}")]
    Store(#[from] caliper_core::Error),

    /// The backing store holds data that cannot be interpreted.
    #[error("index is corrupt: {0}")]
    Corrupt(String),

    /// A vector's length does not match the index dimension.
    #[error("dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Entries were embedded by a different provider than the index is bound to.
    #[error("provider mismatch: index is bound to {bound}, entries come from {given}")]
    IdentityMismatch {
        bound: ProviderIdentity,
        given: ProviderIdentity,
    },

    /// An on-disk index was reopened with a different distance metric.
    #[error("metric mismatch: index was built with {stored}, requested {requested}")]
    MetricMismatch { stored: Metric, requested: Metric },

    /// The same id appears more than once in one upsert batch.
    #[error("duplicate id in upsert batch: {0}")]
    DuplicateId(String),

    /// A vector is empty or contains non-finite components.
    #[error("invalid vector for {id}: {reason}")]
    InvalidVector { id: String, reason: String },
}

impl IndexError {
    /// Returns `true` when the error comes from mixing incompatible
    /// embedding geometries rather than from the store itself.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::IdentityMismatch { .. } | Self::MetricMismatch { .. }
        )
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// A query could not be answered. No partial results are ever returned.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query failed: query text is empty")]
    EmptyQuery,

    /// The query provider is not the one the index was built with.
    #[error("query failed: index was built with {index}, query provider is {provider}")]
    ProviderMismatch {
        index: ProviderIdentity,
        provider: ProviderIdentity,
    },

    #[error("query failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("query failed: {0}")]
    Index(#[from] IndexError),
}

impl QueryError {
    /// Returns `true` when the failure is a provider/index incompatibility.
    pub fn is_mismatch(&self) -> bool {
        match self {
            Self::ProviderMismatch { .. } => true,
            Self::Index(e) => e.is_mismatch(),
            Self::Embedding(EmbeddingError::DimensionMismatch { .. }) => true,
            _ => false,
        }
    }
}
