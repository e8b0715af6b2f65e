//! Vector search for caliper.
//!
//! Stores embedded snippets in an in-memory or SQLite-backed index and
//! answers nearest-neighbor queries through [`QueryService`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod index;
pub mod query;

pub use config::{IndexConfig, StorageMode};
pub use error::{IndexError, IndexResult, QueryError};
pub use index::{open_index, open_index_for_query, MemoryIndex, SqliteIndex, VectorIndex};
pub use query::QueryService;
