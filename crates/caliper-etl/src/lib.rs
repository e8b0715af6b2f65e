//! Loading, embedding, and ingestion for caliper.
//!
//! Reads DIY snippets from CSV, embeds them with the configured provider,
//! and upserts them into a vector index.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod pipeline;

pub use config::{Config, QueryConfig};
pub use embedding::{
    build_provider, model_info, EmbeddingConfig, HashingEmbedder, ModelInfo, ModelStatus,
    ProviderKind,
};
#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedProvider;
pub use error::{DataError, IngestError};
pub use loader::{load_snippets, read_snippets, LoaderConfig};
pub use pipeline::{embed_snippets, index_snippets, run_ingest, IngestReport};
