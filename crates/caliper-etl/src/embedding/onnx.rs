//! Local sentence-transformer embeddings via fastembed.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use caliper_core::{EmbeddingError, EmbeddingProvider, EmbeddingResult, ProviderIdentity};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::background::BackgroundLoad;
use super::{lookup_model, EmbeddingConfig, ModelSpec};

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Embeds text with an ONNX sentence-transformer.
///
/// The model is loaded on first use and kept for the lifetime of the
/// provider. Loading runs on a helper thread and each wait on it is bounded
/// by `load_timeout`. Failed attempts are retried `load_retries` times; a
/// retry after a timeout keeps waiting on the load already in flight.
pub struct FastEmbedProvider {
    spec: ModelSpec,
    cache_dir: PathBuf,
    load_timeout: Duration,
    load_retries: usize,
    model: OnceLock<TextEmbedding>,
    load_lock: Mutex<()>,
    loader: BackgroundLoad<TextEmbedding>,
}

impl fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.spec.name)
            .field("dimension", &self.spec.dimension)
            .field("cache_dir", &self.cache_dir)
            .field("loaded", &self.model.get().is_some())
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    /// Create a provider for the configured model. Nothing is loaded yet.
    pub fn new(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        let spec = lookup_model(&config.model).ok_or_else(|| {
            EmbeddingError::Config(format!(
                "unsupported model '{}' (supported: {})",
                config.model,
                super::SUPPORTED_MODELS
                    .iter()
                    .map(|m| m.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        Ok(Self {
            spec,
            cache_dir: config.resolved_cache_dir(),
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            load_retries: config.load_retries,
            model: OnceLock::new(),
            load_lock: Mutex::new(()),
            loader: BackgroundLoad::new(spec.name),
        })
    }

    fn model(&self) -> EmbeddingResult<&TextEmbedding> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let _guard = self
            .load_lock
            .lock()
            .map_err(|e| EmbeddingError::model_load(self.spec.name, e))?;

        // Another caller may have finished loading while we waited.
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let model = self.load_with_retry()?;
        Ok(self.model.get_or_init(|| model))
    }

    fn load_with_retry(&self) -> EmbeddingResult<TextEmbedding> {
        (|| self.load_once())
            .retry(
                ConstantBuilder::default()
                    .with_delay(RETRY_DELAY)
                    .with_max_times(self.load_retries),
            )
            .sleep(thread::sleep)
            .when(EmbeddingError::is_load_failure)
            .notify(|err, dur| {
                log::warn!("{}; retrying in {:?}", err, dur);
            })
            .call()
    }

    fn load_once(&self) -> EmbeddingResult<TextEmbedding> {
        log::info!(
            "Loading embedding model {} (cache: {})",
            self.spec.name,
            self.cache_dir.display()
        );

        let options = InitOptions::new(fastembed_model(self.spec))
            .with_cache_dir(self.cache_dir.clone())
            .with_show_download_progress(false);
        let model = self.loader.wait(self.load_timeout, move || {
            TextEmbedding::try_new(options).map_err(|e| e.to_string())
        })?;
        log::info!("Embedding model {} loaded", self.spec.name);
        Ok(model)
    }

    fn encode(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>> {
        let model = self.model()?;
        model
            .embed(texts, None)
            .map_err(|e| EmbeddingError::encode(self.spec.name, e))
    }
}

fn fastembed_model(spec: ModelSpec) -> EmbeddingModel {
    match spec.name {
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        _ => EmbeddingModel::AllMiniLML6V2,
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new(self.spec.name, self.spec.dimension)
    }

    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut vectors = self.encode(vec![text])?;
        let count = vectors.len();
        match vectors.pop() {
            Some(vector) if count == 1 => Ok(vector),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: count,
            }),
        }
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.encode(texts.to_vec())
    }

    fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}
