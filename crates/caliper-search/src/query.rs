//! Query service: embed a free-text query and rank index entries.

use caliper_core::{validate_embeddings, EmbeddingProvider, Metric, QueryResult};

use crate::error::QueryError;
use crate::index::VectorIndex;

/// Answers free-text queries against a vector index.
///
/// The provider must be the one the index was populated with. Both are
/// borrowed; the application constructs them once and hands them out.
#[derive(Debug)]
pub struct QueryService<'a> {
    provider: &'a dyn EmbeddingProvider,
    index: &'a dyn VectorIndex,
}

impl<'a> QueryService<'a> {
    #[must_use]
    pub fn new(provider: &'a dyn EmbeddingProvider, index: &'a dyn VectorIndex) -> Self {
        Self { provider, index }
    }

    /// Metric of the underlying index, for turning distances into relevance.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.index.metric()
    }

    /// The `top_k` snippets nearest to `query_text`, nearest first.
    ///
    /// An empty index yields an empty result without touching the provider.
    pub fn answer(&self, query_text: &str, top_k: usize) -> Result<Vec<QueryResult>, QueryError> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        if self.index.is_empty() {
            log::info!("Index is empty, nothing to search for '{}'", query_text);
            return Ok(Vec::new());
        }
        let Some(bound) = self.index.identity() else {
            return Ok(Vec::new());
        };

        let identity = self.provider.identity();
        if *bound != identity {
            return Err(QueryError::ProviderMismatch {
                index: bound.clone(),
                provider: identity,
            });
        }

        log::info!("Searching for: '{}'", query_text);
        let vector = self.provider.embed(query_text)?;
        validate_embeddings(&identity, 1, std::slice::from_ref(&vector))?;

        let results = self.index.search(&vector, top_k)?;
        log::info!("Found {} relevant snippets", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::index::MemoryIndex;
    use caliper_core::{
        EmbeddingError, EmbeddingResult, IndexEntry, ProviderIdentity, SnippetMetadata,
    };

    /// Maps a handful of known words onto axes.
    #[derive(Debug)]
    struct AxisProvider {
        dimension: usize,
    }

    impl AxisProvider {
        fn vector(&self, text: &str) -> Vec<f32> {
            let mut v = vec![0.0; self.dimension];
            for (axis, word) in ["leak", "paint", "wire"].iter().enumerate() {
                if text.contains(word) {
                    v[axis] += 1.0;
                }
            }
            v
        }
    }

    impl EmbeddingProvider for AxisProvider {
        fn identity(&self) -> ProviderIdentity {
            ProviderIdentity::new("axis", self.dimension)
        }

        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            Ok(self.vector(text))
        }

        fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.vector(t)).collect())
        }
    }

    #[derive(Debug)]
    struct BrokenProvider;

    impl EmbeddingProvider for BrokenProvider {
        fn identity(&self) -> ProviderIdentity {
            ProviderIdentity::new("axis", 3)
        }

        fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
            Err(EmbeddingError::model_load("axis", "weights missing"))
        }

        fn embed_batch(&self, _texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
            Err(EmbeddingError::model_load("axis", "weights missing"))
        }
    }

    fn index_with(provider: &AxisProvider) -> MemoryIndex {
        let texts = [
            ("r1", "fix a leak", "Plumbing"),
            ("r2", "paint the fence", "Painting"),
            ("r3", "replace a wire", "Electrical"),
        ];
        let entries = texts
            .iter()
            .map(|(id, text, category)| {
                IndexEntry::new(
                    *id,
                    *text,
                    SnippetMetadata::new(*category, "", ""),
                    provider.vector(text),
                )
            })
            .collect();

        let mut index = MemoryIndex::new(Metric::Cosine);
        index.upsert(&provider.identity(), entries).unwrap();
        index
    }

    #[test]
    fn test_answer_round_trip() {
        let provider = AxisProvider { dimension: 3 };
        let index = index_with(&provider);
        let service = QueryService::new(&provider, &index);

        let results = service.answer("how do I fix a leak?", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "r1");
        assert_eq!(results[0].text, "fix a leak");
    }

    #[test]
    fn test_answer_on_empty_index_skips_provider() {
        let index = MemoryIndex::new(Metric::Cosine);
        let service = QueryService::new(&BrokenProvider, &index);
        assert!(service.answer("anything", 3).unwrap().is_empty());
    }

    /// Bound to a provider but holding no entries.
    #[derive(Debug)]
    struct BoundEmptyIndex(ProviderIdentity);

    impl VectorIndex for BoundEmptyIndex {
        fn metric(&self) -> Metric {
            Metric::Cosine
        }

        fn identity(&self) -> Option<&ProviderIdentity> {
            Some(&self.0)
        }

        fn len(&self) -> usize {
            0
        }

        fn upsert(
            &mut self,
            _identity: &ProviderIdentity,
            _entries: Vec<IndexEntry>,
        ) -> Result<usize, IndexError> {
            Ok(0)
        }

        fn search(&self, _query: &[f32], _top_k: usize) -> Result<Vec<QueryResult>, IndexError> {
            Ok(Vec::new())
        }

        fn categories(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_answer_on_bound_empty_index_skips_provider() {
        let index = BoundEmptyIndex(ProviderIdentity::new("axis", 3));
        let service = QueryService::new(&BrokenProvider, &index);
        assert!(service.answer("leak", 2).unwrap().is_empty());
    }

    #[test]
    fn test_answer_after_empty_upsert() {
        let mut index = MemoryIndex::new(Metric::Cosine);
        index
            .upsert(&ProviderIdentity::new("axis", 3), Vec::new())
            .unwrap();
        let service = QueryService::new(&BrokenProvider, &index);
        assert!(service.answer("leak", 2).unwrap().is_empty());
    }

    #[test]
    fn test_answer_rejects_blank_query() {
        let provider = AxisProvider { dimension: 3 };
        let index = index_with(&provider);
        let service = QueryService::new(&provider, &index);
        assert!(matches!(
            service.answer("   ", 3),
            Err(QueryError::EmptyQuery)
        ));
    }

    #[test]
    fn test_answer_rejects_other_provider() {
        let ingest_provider = AxisProvider { dimension: 3 };
        let index = index_with(&ingest_provider);
        let query_provider = AxisProvider { dimension: 6 };
        let service = QueryService::new(&query_provider, &index);

        let err = service.answer("fix a leak", 2).unwrap_err();
        assert!(err.is_mismatch());
        assert!(matches!(err, QueryError::ProviderMismatch { .. }));
    }

    #[test]
    fn test_provider_failure_propagates() {
        let provider = AxisProvider { dimension: 3 };
        let index = index_with(&provider);
        let service = QueryService::new(&BrokenProvider, &index);

        let err = service.answer("fix a leak", 2).unwrap_err();
        assert!(matches!(err, QueryError::Embedding(_)));
        assert!(err.to_string().starts_with("query failed"));
    }

    #[test]
    fn test_index_dimension_error_is_query_error() {
        let err = QueryError::from(IndexError::DimensionMismatch {
            expected: 3,
            actual: 4,
        });
        assert!(err.is_mismatch());
    }
}
