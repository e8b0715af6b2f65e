use caliper_core::{EmbeddingError, EmbeddingProvider, EmbeddingResult, ProviderIdentity};

/// Model name reported by [`HashingEmbedder`].
pub const HASHING_MODEL: &str = "hashing-v1";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "if", "in", "into", "is", "it", "its", "my", "of", "on", "or", "so", "that", "the",
    "then", "this", "to", "up", "was", "what", "when", "with", "you", "your",
];

const SUFFIXES: &[&str] = &["ing", "ed", "s", "y"];

/// Deterministic bag-of-words embedder based on feature hashing.
///
/// Each token is hashed into one of `dimension` buckets with a sign taken
/// from the high bit of the hash, and the result is L2-normalized. Texts that
/// share words land close together under cosine distance. No model files are
/// involved, so the vectors are identical across runs and machines.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> EmbeddingResult<Self> {
        if dimension == 0 {
            return Err(EmbeddingError::Config(
                "hashing embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = self.bucket(hash);
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn bucket(&self, hash: u64) -> usize {
        (hash % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimension: 384 }
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new(HASHING_MODEL, self.dimension)
    }

    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

/// Lowercased alphanumeric words, minus stop words and one-letter tokens,
/// with a few common English suffixes stripped.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .map(|word| stem(&word).to_string())
}

fn stem(word: &str) -> &str {
    for suffix in SUFFIXES {
        if let Some(root) = word.strip_suffix(suffix) {
            if root.chars().count() >= 3 {
                return root;
            }
        }
    }
    word
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_core::metric::cosine_similarity;

    fn embedder() -> HashingEmbedder {
        HashingEmbedder::new(384).unwrap()
    }

    #[test]
    fn test_identity() {
        let identity = embedder().identity();
        assert_eq!(identity.model, "hashing-v1");
        assert_eq!(identity.dimension, 384);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            HashingEmbedder::new(0),
            Err(EmbeddingError::Config(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let a = embedder().embed("Replace the faucet washer").unwrap();
        let b = embedder().embed("Replace the faucet washer").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_matches_single() {
        let provider = embedder();
        let texts = ["fix a leak", "paint the fence", "", "wire a switch"];
        let batch = provider.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), texts.len());
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&provider.embed(text).unwrap(), vector);
        }
    }

    #[test]
    fn test_empty_batch() {
        assert!(embedder().embed_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unit_length_and_fixed_dimension() {
        let vector = embedder().embed("Turn off the water supply valve").unwrap();
        assert_eq!(vector.len(), 384);
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_stop_words_only_is_zero_vector() {
        let vector = embedder().embed("how do I do it?").unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shared_words_are_closer() {
        let provider = embedder();
        let query = provider.embed("leaky faucet").unwrap();
        let plumbing = provider
            .embed("Fix a leaking faucet by replacing the washer")
            .unwrap();
        let painting = provider.embed("Prime the wall before painting").unwrap();
        assert!(cosine_similarity(&query, &plumbing) > cosine_similarity(&query, &painting));
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("leaky"), "leak");
        assert_eq!(stem("leaking"), "leak");
        assert_eq!(stem("pipes"), "pipe");
        assert_eq!(stem("is"), "is");
    }
}
