//! Embedding provider implementations and the factory that picks one.
//!
//! Two providers exist:
//!
//! - [`HashingEmbedder`]: deterministic feature hashing, no model files.
//!   The default, and the fixed stub used in tests.
//! - `FastEmbedProvider` (feature `fastembed`): a local ONNX
//!   sentence-transformer, loaded lazily on first use.
//!
//! The application builds one provider with [`build_provider`] and passes it
//! by reference to ingestion and query, so both always share an identity.

#[cfg_attr(not(feature = "fastembed"), allow(dead_code))]
mod background;
mod hashing;

#[cfg(feature = "fastembed")]
mod onnx;

use std::fmt;
use std::path::PathBuf;

use caliper_core::{EmbeddingProvider, EmbeddingResult};
use serde::{Deserialize, Serialize};

pub use hashing::{HashingEmbedder, HASHING_MODEL};

#[cfg(feature = "fastembed")]
pub use onnx::FastEmbedProvider;

/// Which provider implementation to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Hashing,
    FastEmbed,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::FastEmbed => "fastembed",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "fastembed" => Ok(Self::FastEmbed),
            other => Err(format!(
                "unknown embedding provider '{other}' (expected hashing or fastembed)"
            )),
        }
    }
}

/// The `[embedding]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model name. Only consulted by the fastembed provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Vector length. Only consulted by the hashing provider; fastembed
    /// models have a fixed dimension.
    #[serde(default = "default_dimension", deserialize_with = "crate::config::number_or_string")]
    pub dimension: usize,

    /// Where downloaded model files are cached. Defaults to the platform
    /// cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Upper bound on a single model load attempt.
    #[serde(default = "default_load_timeout_secs", deserialize_with = "crate::config::number_or_string")]
    pub load_timeout_secs: u64,

    /// Additional load attempts after the first failure.
    #[serde(default = "default_load_retries", deserialize_with = "crate::config::number_or_string")]
    pub load_retries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            dimension: default_dimension(),
            cache_dir: None,
            load_timeout_secs: default_load_timeout_secs(),
            load_retries: default_load_retries(),
        }
    }
}

impl EmbeddingConfig {
    /// Resolved model cache directory.
    #[must_use]
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("caliper")
                .join("models")
        })
    }
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_load_timeout_secs() -> u64 {
    120
}

fn default_load_retries() -> usize {
    2
}

/// A sentence-transformer model the fastembed provider can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub dimension: usize,
}

pub const SUPPORTED_MODELS: [ModelSpec; 3] = [
    ModelSpec {
        name: "all-MiniLM-L6-v2",
        dimension: 384,
    },
    ModelSpec {
        name: "bge-small-en-v1.5",
        dimension: 384,
    },
    ModelSpec {
        name: "bge-base-en-v1.5",
        dimension: 768,
    },
];

/// Look up a supported model by name, ignoring case and an optional
/// organisation prefix (`sentence-transformers/all-MiniLM-L6-v2`).
#[must_use]
pub fn lookup_model(name: &str) -> Option<ModelSpec> {
    let bare = name.rsplit('/').next().unwrap_or(name);
    SUPPORTED_MODELS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(bare))
        .copied()
}

/// Construct the provider selected by `config`.
///
/// Construction is cheap: the fastembed model is not loaded until the first
/// embedding is requested.
pub fn build_provider(config: &EmbeddingConfig) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
    match config.provider {
        ProviderKind::Hashing => {
            let provider = HashingEmbedder::new(config.dimension)?;
            log::info!("Using embedding provider {}", provider.identity());
            Ok(Box::new(provider))
        }
        ProviderKind::FastEmbed => build_fastembed(config),
    }
}

#[cfg(feature = "fastembed")]
fn build_fastembed(config: &EmbeddingConfig) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
    let provider = FastEmbedProvider::new(config)?;
    log::info!("Using embedding provider {}", provider.identity());
    Ok(Box::new(provider))
}

#[cfg(not(feature = "fastembed"))]
fn build_fastembed(config: &EmbeddingConfig) -> EmbeddingResult<Box<dyn EmbeddingProvider>> {
    Err(caliper_core::EmbeddingError::model_load(
        config.model.clone(),
        "caliper was built without the `fastembed` feature",
    ))
}

/// Whether a provider's model is resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Loaded,
    NotLoaded,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loaded => "loaded",
            Self::NotLoaded => "not_loaded",
        })
    }
}

/// Summary of the active provider for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub dimension: usize,
    pub status: ModelStatus,
}

/// Report on `provider` without forcing a model load.
pub fn model_info(provider: &dyn EmbeddingProvider) -> ModelInfo {
    let identity = provider.identity();
    ModelInfo {
        model: identity.model,
        dimension: identity.dimension,
        status: if provider.is_loaded() {
            ModelStatus::Loaded
        } else {
            ModelStatus::NotLoaded
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_core::EmbeddingError;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, ProviderKind::Hashing);
        assert_eq!(config.model, "all-MiniLM-L6-v2");
        assert_eq!(config.dimension, 384);
        assert_eq!(config.load_retries, 2);
    }

    #[test]
    fn test_build_default_provider() {
        let provider = build_provider(&EmbeddingConfig::default()).unwrap();
        let identity = provider.identity();
        assert_eq!(identity.model, HASHING_MODEL);
        assert_eq!(identity.dimension, 384);
    }

    #[test]
    fn test_build_rejects_zero_dimension() {
        let config = EmbeddingConfig {
            dimension: 0,
            ..EmbeddingConfig::default()
        };
        assert!(matches!(
            build_provider(&config),
            Err(EmbeddingError::Config(_))
        ));
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_fastembed_unavailable_without_feature() {
        let config = EmbeddingConfig {
            provider: ProviderKind::FastEmbed,
            ..EmbeddingConfig::default()
        };
        let err = build_provider(&config).unwrap_err();
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_lookup_model() {
        assert_eq!(lookup_model("bge-base-en-v1.5").unwrap().dimension, 768);
        assert_eq!(
            lookup_model("sentence-transformers/all-MiniLM-L6-v2")
                .unwrap()
                .dimension,
            384
        );
        assert!(lookup_model("gpt-9").is_none());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("FastEmbed".parse::<ProviderKind>(), Ok(ProviderKind::FastEmbed));
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_model_info() {
        let provider = HashingEmbedder::new(16).unwrap();
        let info = model_info(&provider);
        assert_eq!(info.model, HASHING_MODEL);
        assert_eq!(info.dimension, 16);
        assert_eq!(info.status, ModelStatus::Loaded);
        assert_eq!(info.status.to_string(), "loaded");
    }
}
