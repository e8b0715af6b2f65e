//! Ingest pipeline: load snippets, embed them, and upsert into an index.

use std::path::Path;

use caliper_core::{
    validate_embeddings, EmbeddedSnippet, EmbeddingProvider, EmbeddingResult, IndexEntry,
    ProviderIdentity, Snippet,
};
use caliper_search::{IndexError, VectorIndex};
use serde::Serialize;

use crate::error::IngestError;
use crate::loader::{load_snippets, LoaderConfig};

/// What an ingest run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Rows read from the input.
    pub loaded: usize,
    /// Entries written to the index.
    pub indexed: usize,
    /// Distinct categories in the index after the run, sorted.
    pub categories: Vec<String>,
    /// Provider the vectors were produced with.
    pub identity: ProviderIdentity,
}

/// Embed every snippet's text in one batch.
///
/// The provider output is checked against its advertised identity before
/// anything is returned.
pub fn embed_snippets(
    provider: &dyn EmbeddingProvider,
    snippets: Vec<Snippet>,
) -> EmbeddingResult<Vec<EmbeddedSnippet>> {
    let identity = provider.identity();
    log::info!(
        "Embedding {} snippets with {}",
        snippets.len(),
        identity
    );

    let texts: Vec<&str> = snippets.iter().map(|s| s.text.as_str()).collect();
    let vectors = provider.embed_batch(&texts)?;
    validate_embeddings(&identity, snippets.len(), &vectors)?;

    Ok(snippets
        .into_iter()
        .zip(vectors)
        .map(|(snippet, vector)| snippet.with_embedding(vector))
        .collect())
}

/// Embed `snippets` and upsert them into `index`.
///
/// An index already bound to another provider is rejected before any text
/// is embedded. Returns the number of entries written.
pub fn index_snippets(
    provider: &dyn EmbeddingProvider,
    index: &mut dyn VectorIndex,
    snippets: Vec<Snippet>,
) -> Result<usize, IngestError> {
    let identity = provider.identity();
    if let Some(bound) = index.identity() {
        if *bound != identity {
            return Err(IndexError::IdentityMismatch {
                bound: bound.clone(),
                given: identity,
            }
            .into());
        }
    }

    let embedded = embed_snippets(provider, snippets)?;
    let entries: Vec<IndexEntry> = embedded.into_iter().map(IndexEntry::from).collect();
    let count = index.upsert(&identity, entries)?;

    log::info!("Indexed {} snippets ({} total)", count, index.len());
    Ok(count)
}

/// Run a full ingest: load `csv_path`, embed, and upsert into `index`.
pub fn run_ingest(
    csv_path: &Path,
    loader: &LoaderConfig,
    provider: &dyn EmbeddingProvider,
    index: &mut dyn VectorIndex,
) -> Result<IngestReport, IngestError> {
    let snippets = load_snippets(csv_path, loader)?;
    let loaded = snippets.len();

    let indexed = index_snippets(provider, index, snippets)?;

    Ok(IngestReport {
        loaded,
        indexed,
        categories: index.categories(),
        identity: provider.identity(),
    })
}
