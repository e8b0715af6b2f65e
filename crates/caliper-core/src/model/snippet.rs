use serde::{Deserialize, Serialize};

/// Category and safety metadata attached to a snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetMetadata {
    /// Project category (e.g. "Plumbing", "Painting").
    pub category: String,

    /// Free-text list of tools the task needs.
    pub tools_required: String,

    /// Free-text list of personal protective equipment.
    pub ppe_required: String,
}

impl SnippetMetadata {
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        tools_required: impl Into<String>,
        ppe_required: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            tools_required: tools_required.into(),
            ppe_required: ppe_required.into(),
        }
    }
}

/// One DIY instructional record, created from a single input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Identifier, unique within a load batch.
    pub id: String,

    /// The instructional text that gets embedded.
    pub text: String,

    pub metadata: SnippetMetadata,
}

impl Snippet {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: SnippetMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Attach an embedding, producing the ingestion-stage record.
    #[must_use]
    pub fn with_embedding(self, embedding: Vec<f32>) -> EmbeddedSnippet {
        EmbeddedSnippet {
            snippet: self,
            embedding,
        }
    }
}

/// A snippet paired with the vector its text was embedded to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedSnippet {
    pub snippet: Snippet,
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_new() {
        let snippet = Snippet::new(
            "1",
            "Shut off the water supply first.",
            SnippetMetadata::new("Plumbing", "Wrench", "Gloves"),
        );

        assert_eq!(snippet.id, "1");
        assert_eq!(snippet.metadata.category, "Plumbing");
        assert_eq!(snippet.metadata.tools_required, "Wrench");
        assert_eq!(snippet.metadata.ppe_required, "Gloves");
    }

    #[test]
    fn test_with_embedding_keeps_snippet() {
        let snippet = Snippet::new("7", "text", SnippetMetadata::default());
        let embedded = snippet.clone().with_embedding(vec![0.5, 0.5]);

        assert_eq!(embedded.snippet, snippet);
        assert_eq!(embedded.embedding, vec![0.5, 0.5]);
    }
}
