pub mod entry;
pub mod snippet;

pub use entry::{IndexEntry, QueryResult};
pub use snippet::{EmbeddedSnippet, Snippet, SnippetMetadata};
