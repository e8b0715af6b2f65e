//! Distance metrics shared by ingestion and query.
//!
//! An index fixes its metric when it is created. Mixing metrics between
//! ingest and search would produce meaningless rankings, so the metric is
//! persisted alongside on-disk indices and checked on reopen.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the distance between two vectors is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 - cosine_similarity`, in `[0, 2]`. A zero vector has similarity 0
    /// with everything.
    #[default]
    Cosine,
    /// Plain L2 distance, in `[0, inf)`.
    Euclidean,
}

impl Metric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
        }
    }

    /// Distance between two vectors of equal length.
    ///
    /// Callers validate lengths beforehand; extra components of the longer
    /// slice are ignored.
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => 1.0 - cosine_similarity(a, b),
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    /// Human-readable relevance for a distance under this metric, higher is
    /// better.
    ///
    /// Cosine reports `1 - distance` (the cosine similarity); Euclidean
    /// squashes the unbounded distance into `(0, 1]` with `1 / (1 + d)`.
    #[must_use]
    pub fn relevance(self, distance: f32) -> f32 {
        match self {
            Self::Cosine => 1.0 - distance,
            Self::Euclidean => 1.0 / (1.0 + distance),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            other => Err(format!(
                "unknown metric '{other}' (expected 'cosine' or 'euclidean')"
            )),
        }
    }
}

/// Cosine similarity between two embeddings.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
