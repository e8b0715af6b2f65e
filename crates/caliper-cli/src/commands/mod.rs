pub mod config;
pub mod demo;
pub mod ingest;
pub mod model;
pub mod query;
pub mod repl;
pub mod status;

use anyhow::{Context, Result};
use caliper_core::EmbeddingProvider;
use caliper_etl::{build_provider, Config};
use caliper_search::{open_index_for_query, StorageMode, VectorIndex};

pub use demo::run_demo;
pub use ingest::run_ingest;
pub use model::show_model;
pub use query::run_query;
pub use repl::run_repl;
pub use status::show_status;

/// Build the single embedding provider used for this run.
pub fn load_provider(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    build_provider(&config.embedding).context("Failed to set up embedding provider")
}

/// Open the index for searching.
///
/// An in-memory index starts empty, so the CSV is ingested into it first.
pub fn prepare_index(
    config: &Config,
    provider: &dyn EmbeddingProvider,
) -> Result<Box<dyn VectorIndex>> {
    let mut index = open_index_for_query(&config.index).context("Failed to open index")?;

    if config.index.mode == StorageMode::InMemory {
        let report = caliper_etl::run_ingest(
            &config.data_path,
            &config.loader,
            provider,
            index.as_mut(),
        )
        .with_context(|| format!("Failed to ingest {}", config.data_path.display()))?;
        log::info!("Ingested {} snippets into memory", report.indexed);
    }

    Ok(index)
}
