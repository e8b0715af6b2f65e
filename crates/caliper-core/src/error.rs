use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of an embedding provider.
///
/// Every variant means the provider could not produce a usable vector, so
/// callers treat them uniformly as "embedding unavailable".
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The underlying model could not be initialized.
    #[error("embedding unavailable: failed to load model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    /// Model initialization did not finish within the configured bound.
    #[error("embedding unavailable: loading model {model} exceeded {timeout_secs}s")]
    LoadTimeout { model: String, timeout_secs: u64 },

    /// The model was loaded but failed to encode the input.
    #[error("embedding unavailable: model {model} failed to encode: {reason}")]
    Encode { model: String, reason: String },

    /// The provider returned a different number of vectors than texts.
    #[error("embedding unavailable: expected {expected} vectors, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A vector's length diverged from the provider's advertised dimension.
    #[error("embedding unavailable: model {model} advertises {expected} dimensions, produced {actual}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// The provider was misconfigured (unknown model, zero dimension, ...).
    #[error("embedding unavailable: {0}")]
    Config(String),
}

impl EmbeddingError {
    pub fn model_load(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` when the failure happened while bringing the model up,
    /// which is the only step worth retrying.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::ModelLoad { .. } | Self::LoadTimeout { .. })
    }
}

pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;
