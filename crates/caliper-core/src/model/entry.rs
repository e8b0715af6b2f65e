use serde::{Deserialize, Serialize};

use crate::model::snippet::{EmbeddedSnippet, SnippetMetadata};

/// The stored form of an embedded snippet inside a vector index.
///
/// Once handed to an index the entry is owned by it and never mutated in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub text: String,
    pub metadata: SnippetMetadata,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: SnippetMetadata,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
            embedding,
        }
    }

    /// Build the result row for this entry at the given distance.
    #[must_use]
    pub fn to_result(&self, distance: f32) -> QueryResult {
        QueryResult {
            id: self.id.clone(),
            text: self.text.clone(),
            metadata: self.metadata.clone(),
            distance,
        }
    }
}

impl From<EmbeddedSnippet> for IndexEntry {
    fn from(embedded: EmbeddedSnippet) -> Self {
        let EmbeddedSnippet { snippet, embedding } = embedded;
        Self {
            id: snippet.id,
            text: snippet.text,
            metadata: snippet.metadata,
            embedding,
        }
    }
}

/// One ranked hit returned by a search. Lower distance means more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub text: String,
    pub metadata: SnippetMetadata,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snippet;

    #[test]
    fn test_entry_from_embedded_snippet() {
        let embedded = Snippet::new(
            "r1",
            "fix a leak",
            SnippetMetadata::new("Plumbing", "Wrench", "Gloves"),
        )
        .with_embedding(vec![1.0, 0.0]);

        let entry = IndexEntry::from(embedded);
        assert_eq!(entry.id, "r1");
        assert_eq!(entry.text, "fix a leak");
        assert_eq!(entry.metadata.category, "Plumbing");
        assert_eq!(entry.embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_to_result_carries_id_and_metadata() {
        let entry = IndexEntry::new(
            "r2",
            "paint the trim",
            SnippetMetadata::new("Painting", "Brush", "Goggles"),
            vec![0.0, 1.0],
        );

        let result = entry.to_result(0.25);
        assert_eq!(result.id, "r2");
        assert_eq!(result.metadata, entry.metadata);
        assert!((result.distance - 0.25).abs() < f32::EPSILON);
    }
}
