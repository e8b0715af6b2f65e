//! Core domain model for caliper.
//!
//! This crate defines the snippet records that flow through the retrieval
//! pipeline, the embedding provider contract, the distance metrics shared by
//! ingestion and query, and the SQLite schema backing on-disk indices.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod embedding;
pub mod error;
pub mod metric;
pub mod model;
pub mod schema;

pub use embedding::{validate_embeddings, EmbeddingProvider, ProviderIdentity};
pub use error::{EmbeddingError, EmbeddingResult, Error, Result};
pub use metric::Metric;
pub use model::{EmbeddedSnippet, IndexEntry, QueryResult, Snippet, SnippetMetadata};
