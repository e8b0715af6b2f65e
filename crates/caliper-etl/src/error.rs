//! Loading and ingestion error types.

use caliper_core::EmbeddingError;
use caliper_search::IndexError;
use thiserror::Error;

/// Errors that abort a snippet load. A load either returns every row or
/// fails with one of these.
#[derive(Debug, Error)]
pub enum DataError {
    /// The input file does not exist.
    #[error("CSV file not found: {file}")]
    NotFound { file: String },

    /// The input could not be read or is not valid CSV.
    #[error("cannot read {file}{}: {reason}", line_suffix(.line.as_ref()))]
    Unreadable {
        file: String,
        line: Option<u64>,
        reason: String,
    },

    /// The input has no header or no data rows.
    #[error("no snippets in {file}")]
    Empty { file: String },

    /// One or more required columns are absent from the header.
    #[error("missing required columns in {file}: {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    /// A row has no id.
    #[error("null id in {file} at line {line}")]
    NullId { file: String, line: u64 },

    /// Two rows share an id.
    #[error("duplicate id '{id}' in {file} at line {line}")]
    DuplicateId { file: String, id: String, line: u64 },
}

fn line_suffix(line: Option<&u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl DataError {
    /// Returns `true` when the input file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("ingest failed: {0}")]
    Data(#[from] DataError),

    #[error("ingest failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("ingest failed: {0}")]
    Index(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_message_with_line() {
        let err = DataError::Unreadable {
            file: "snippets.csv".to_string(),
            line: Some(4),
            reason: "found record with 3 fields".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot read snippets.csv at line 4: found record with 3 fields"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let err = DataError::MissingColumns {
            file: "snippets.csv".to_string(),
            columns: vec!["ppe_required".to_string(), "category".to_string()],
        };
        assert!(err.to_string().ends_with("ppe_required, category"));
    }

    #[test]
    fn test_is_not_found() {
        let err = DataError::NotFound {
            file: "x.csv".to_string(),
        };
        assert!(err.is_not_found());
        assert!(IngestError::from(err).to_string().starts_with("ingest failed"));
    }
}
