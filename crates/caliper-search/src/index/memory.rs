use std::collections::{BTreeSet, HashMap, HashSet};

use caliper_core::{IndexEntry, Metric, ProviderIdentity, QueryResult};

use crate::error::{IndexError, IndexResult};
use crate::index::VectorIndex;

/// Exact brute-force index held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    metric: Metric,
    identity: Option<ProviderIdentity>,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl MemoryIndex {
    #[must_use]
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            identity: None,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Check a batch against the index without modifying it.
    pub(crate) fn validate(
        &self,
        identity: &ProviderIdentity,
        entries: &[IndexEntry],
    ) -> IndexResult<()> {
        if let Some(bound) = &self.identity {
            if bound != identity {
                return Err(IndexError::IdentityMismatch {
                    bound: bound.clone(),
                    given: identity.clone(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(IndexError::DuplicateId(entry.id.clone()));
            }
            if entry.embedding.is_empty() {
                return Err(IndexError::InvalidVector {
                    id: entry.id.clone(),
                    reason: "vector is empty".to_string(),
                });
            }
            if entry.embedding.len() != identity.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: identity.dimension,
                    actual: entry.embedding.len(),
                });
            }
            if entry.embedding.iter().any(|v| !v.is_finite()) {
                return Err(IndexError::InvalidVector {
                    id: entry.id.clone(),
                    reason: "vector has non-finite components".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl VectorIndex for MemoryIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn identity(&self) -> Option<&ProviderIdentity> {
        self.identity.as_ref()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn upsert(
        &mut self,
        identity: &ProviderIdentity,
        entries: Vec<IndexEntry>,
    ) -> IndexResult<usize> {
        self.validate(identity, &entries)?;
        if entries.is_empty() {
            return Ok(0);
        }

        if self.identity.is_none() {
            log::debug!("Binding index to {}", identity);
            self.identity = Some(identity.clone());
        }

        let count = entries.len();
        for entry in entries {
            match self.positions.get(&entry.id) {
                Some(&pos) => {
                    log::debug!("Replacing entry {}", entry.id);
                    self.entries[pos] = entry;
                }
                None => {
                    self.positions.insert(entry.id.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }

        Ok(count)
    }

    fn search(&self, query: &[f32], top_k: usize) -> IndexResult<Vec<QueryResult>> {
        let Some(identity) = &self.identity else {
            return Ok(Vec::new());
        };
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != identity.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: identity.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidVector {
                id: "<query>".to_string(),
                reason: "vector has non-finite components".to_string(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, self.metric.distance(query, &entry.embedding)))
            .collect();

        // Stable sort: equal distances keep insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(top_k.min(self.entries.len()));

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| self.entries[pos].to_result(distance))
            .collect())
    }

    fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.metadata.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
