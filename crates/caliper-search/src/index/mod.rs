//! Vector index trait and storage backends.

mod memory;
mod sqlite;

use std::fmt;

use caliper_core::{IndexEntry, Metric, ProviderIdentity, QueryResult};

use crate::config::{IndexConfig, StorageMode};
use crate::error::IndexResult;

pub use memory::MemoryIndex;
pub use sqlite::SqliteIndex;

/// Stores `(id, vector, text, metadata)` tuples and answers nearest-neighbor
/// queries.
///
/// An index binds to the [`ProviderIdentity`] of its first upsert and from
/// then on only accepts vectors of that identity. Writes take `&mut self`
/// (single writer); searches take `&self`.
pub trait VectorIndex: fmt::Debug {
    /// The distance metric fixed for this index.
    fn metric(&self) -> Metric;

    /// The provider identity the index is bound to, if anything was ever
    /// inserted.
    fn identity(&self) -> Option<&ProviderIdentity>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert entries embedded by `identity`, replacing entries whose id is
    /// already present.
    ///
    /// The whole batch is validated before anything is written: ids must be
    /// unique within the batch, vectors finite and of the bound dimension.
    fn upsert(
        &mut self,
        identity: &ProviderIdentity,
        entries: Vec<IndexEntry>,
    ) -> IndexResult<usize>;

    /// The `top_k` nearest entries, nearest first.
    ///
    /// `top_k` is clamped to the index size. Equal distances keep insertion
    /// order. An empty index returns an empty vector.
    fn search(&self, query: &[f32], top_k: usize) -> IndexResult<Vec<QueryResult>>;

    /// Distinct categories of the stored entries, sorted.
    fn categories(&self) -> Vec<String>;
}

/// Open an index for writing according to `config`.
///
/// On-disk indices are created if missing.
pub fn open_index(config: &IndexConfig) -> IndexResult<Box<dyn VectorIndex>> {
    match config.mode {
        StorageMode::InMemory => Ok(Box::new(MemoryIndex::new(config.metric))),
        StorageMode::OnDisk => Ok(Box::new(SqliteIndex::open(&config.path, config.metric)?)),
    }
}

/// Open an index for searching according to `config`.
///
/// Unlike [`open_index`], a missing on-disk index is not created: an empty
/// in-memory index stands in for it so that searches return nothing.
pub fn open_index_for_query(config: &IndexConfig) -> IndexResult<Box<dyn VectorIndex>> {
    match config.mode {
        StorageMode::InMemory => Ok(Box::new(MemoryIndex::new(config.metric))),
        StorageMode::OnDisk => match SqliteIndex::open_existing(&config.path, config.metric)? {
            Some(index) => Ok(Box::new(index)),
            None => {
                log::warn!(
                    "No index at {}, searches will return nothing",
                    config.path.display()
                );
                Ok(Box::new(MemoryIndex::new(config.metric)))
            }
        },
    }
}
